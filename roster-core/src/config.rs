//! Loader configuration types

use crate::error::ConfigError;
use crate::identity::Cursor;
use serde::{Deserialize, Serialize};

/// Size of the first page of any partition. Smaller so something shows fast.
pub const FIRST_PAGE_SIZE: u32 = 20;

/// Size of every subsequent page.
pub const PAGE_SIZE: u32 = 100;

/// When a tag view stops deriving from unfiltered pages and starts paging
/// through its own cursor.
///
/// A tag selected while no matching entries are cached always gets a
/// dedicated cursor, whatever the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DedicatedFetchPolicy {
    /// Keep deriving until the unfiltered stream ends.
    EndOfStream,
    /// Switch after `limit` consecutive unfiltered pages fetched for the tag
    /// added no rows to it.
    UnproductivePages { limit: u32 },
    /// Page every selected tag through its own cursor right away.
    Immediate,
}

impl DedicatedFetchPolicy {
    /// Whether a derived tag view that has seen `misses` unproductive pages
    /// in a row should switch to a dedicated cursor.
    pub fn should_promote(&self, misses: u32) -> bool {
        match self {
            Self::EndOfStream => false,
            Self::UnproductivePages { limit } => misses >= *limit,
            Self::Immediate => true,
        }
    }
}

impl Default for DedicatedFetchPolicy {
    fn default() -> Self {
        Self::UnproductivePages { limit: 1 }
    }
}

/// Paging behaviour of one list session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    pub first_page_size: u32,
    pub page_size: u32,
    pub dedicated_fetch: DedicatedFetchPolicy,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            first_page_size: FIRST_PAGE_SIZE,
            page_size: PAGE_SIZE,
            dedicated_fetch: DedicatedFetchPolicy::default(),
        }
    }
}

impl LoaderConfig {
    /// Create a loader config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the first page size.
    pub fn with_first_page_size(mut self, size: u32) -> Self {
        self.first_page_size = size;
        self
    }

    /// Set the size of subsequent pages.
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }

    /// Set the dedicated fetch policy.
    pub fn with_dedicated_fetch(mut self, policy: DedicatedFetchPolicy) -> Self {
        self.dedicated_fetch = policy;
        self
    }

    /// Page size for a request continuing from `cursor`.
    pub fn limit_for(&self, cursor: Option<&Cursor>) -> u32 {
        if cursor.is_none() {
            self.first_page_size
        } else {
            self.page_size
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.first_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "first_page_size".to_string(),
                reason: "must be > 0".to_string(),
            });
        }
        if self.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "page_size".to_string(),
                reason: "must be > 0".to_string(),
            });
        }
        if let DedicatedFetchPolicy::UnproductivePages { limit: 0 } = self.dedicated_fetch {
            return Err(ConfigError::InvalidValue {
                field: "dedicated_fetch.limit".to_string(),
                reason: "must be > 0 (use mode = \"immediate\" instead)".to_string(),
            });
        }
        Ok(())
    }
}
