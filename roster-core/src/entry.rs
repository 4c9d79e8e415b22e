//! Entries, rows and filter keys

use crate::identity::ActorId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire name of the pseudo-tag backed by the locally known list.
pub const LOCAL_FILTER_NAME: &str = "read";

/// Tag attached to an entry, e.g. a reaction emoji. Empty means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagValue(String);

impl TagValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key selecting which partition the list shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum FilterKey {
    /// The unfiltered partition.
    #[default]
    All,
    /// Entries carrying one specific, non-empty tag.
    Tag(TagValue),
    /// Pseudo-tag backed by the locally known list; never touches the network.
    Local,
}

impl FilterKey {
    /// Build a tag filter. An empty tag means "any" and yields [`FilterKey::All`].
    pub fn tag(value: impl Into<TagValue>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Self::All
        } else {
            Self::Tag(value)
        }
    }

    /// Parse the name used by tab selectors: `""` is unfiltered,
    /// [`LOCAL_FILTER_NAME`] is the pseudo-tag, anything else is a tag.
    pub fn from_wire(raw: &str) -> Self {
        if raw == LOCAL_FILTER_NAME {
            Self::Local
        } else {
            Self::tag(raw)
        }
    }

    pub fn wire_name(&self) -> &str {
        match self {
            Self::All => "",
            Self::Tag(tag) => tag.as_str(),
            Self::Local => LOCAL_FILTER_NAME,
        }
    }

    pub fn as_tag(&self) -> Option<&TagValue> {
        match self {
            Self::Tag(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn is_network_backed(&self) -> bool {
        !matches!(self, Self::Local)
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Tag(tag) => write!(f, "tag:{}", tag),
            Self::Local => f.write_str("local"),
        }
    }
}

/// One (actor, tag) pair returned by the paging service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    pub actor: ActorId,
    pub tag: TagValue,
}

impl Entry {
    pub fn new(actor: impl Into<ActorId>, tag: impl Into<TagValue>) -> Self {
        Self {
            actor: actor.into(),
            tag: tag.into(),
        }
    }

    pub fn matches(&self, tag: &TagValue) -> bool {
        &self.tag == tag
    }
}

/// A resolved actor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub display_name: String,
}

impl Actor {
    pub fn new(id: impl Into<ActorId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Presentation-ready projection of an [`Entry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub actor: Actor,
    /// Tag shown next to the actor; empty for rows from the locally known list.
    pub tag: TagValue,
}

impl Row {
    pub fn actor_id(&self) -> ActorId {
        self.actor.id
    }
}
