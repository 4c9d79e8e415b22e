//! Identity types for roster entries

use crate::error::EmptyCursor;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of the subject whose entries are listed (a message, a story).
pub type SubjectId = Uuid;

/// Opaque identity of an actor as issued by the paging service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(u64);

impl ActorId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ActorId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one issued page request within a session.
///
/// Ids are handed out in increasing order, so a larger id always belongs to
/// a request issued later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Opaque continuation token returned by the paging service.
///
/// The service signals the end of a stream with an empty token, so a
/// `Cursor` is never empty; use [`Cursor::parse`] to turn a raw token into
/// `Option<Cursor>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cursor(String);

impl Cursor {
    /// Returns `None` for the empty token.
    pub fn parse(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Cursor {
    type Error = EmptyCursor;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(raw).ok_or(EmptyCursor)
    }
}

impl From<Cursor> for String {
    fn from(cursor: Cursor) -> Self {
        cursor.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_parse_empty_is_none() {
        assert!(Cursor::parse("").is_none());
        assert_eq!(Cursor::parse("abc").map(|c| c.as_str().to_string()), Some("abc".to_string()));
    }

    #[test]
    fn test_cursor_deserialize_rejects_empty() {
        let cursor: Cursor = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(cursor.as_str(), "abc");
        assert_eq!(serde_json::to_string(&cursor).unwrap(), "\"abc\"");
        assert!(serde_json::from_str::<Cursor>("\"\"").is_err());
    }

    #[test]
    fn test_request_id_ordering() {
        let first = RequestId::new(1);
        assert!(first.next() > first);
        assert_eq!(first.next().get(), 2);
        assert_eq!(format!("{}", first), "req-1");
    }

    #[test]
    fn test_actor_id_serializes_transparently() {
        let json = serde_json::to_string(&ActorId::new(42)).unwrap();
        assert_eq!(json, "42");
    }
}
