//! Page requests and responses exchanged with the paging service

use crate::entry::{Actor, Entry, FilterKey, TagValue};
use crate::error::TransportError;
use crate::identity::{Cursor, RequestId};
use serde::{Deserialize, Serialize};

/// What the service is asked to filter by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryScope {
    Unfiltered,
    Tag(TagValue),
}

impl QueryScope {
    pub fn tag(&self) -> Option<&TagValue> {
        match self {
            Self::Unfiltered => None,
            Self::Tag(tag) => Some(tag),
        }
    }
}

/// One page request as sent to a [`crate::PageSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub scope: QueryScope,
    /// `None` requests the first page.
    pub cursor: Option<Cursor>,
    pub limit: u32,
}

/// A page request as tracked by a session: the query plus the view it was
/// issued on behalf of.
///
/// A tag view that is still derived from unfiltered pages sends an
/// unfiltered query, so `serves` and `query.scope` can disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub serves: FilterKey,
    pub query: PageQuery,
}

/// One page returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub entries: Vec<Entry>,
    /// Actors the service resolved alongside the entries.
    pub actors: Vec<Actor>,
    /// `None` once the stream is exhausted.
    pub next_cursor: Option<Cursor>,
}

impl Page {
    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }
}

/// Completion of a dispatched request, delivered back to the session owner.
///
/// Completions carry their request so that a late response for a cancelled
/// request can still be absorbed into the cache.
#[derive(Debug, Clone)]
pub struct PageCompletion {
    pub id: RequestId,
    pub request: PageRequest,
    pub outcome: Result<Page, TransportError>,
}
