//! ROSTER Core - Entry Types
//!
//! Pure data structures for the paginated entry loader. All other crates
//! depend on this. Behaviour lives in `roster-loader`; this crate holds the
//! identity types, the page wire shapes, the error taxonomy, the loader
//! configuration values, and the collaborator traits.

pub mod config;
pub mod entry;
pub mod error;
pub mod identity;
pub mod page;
pub mod traits;

pub use config::{DedicatedFetchPolicy, LoaderConfig, FIRST_PAGE_SIZE, PAGE_SIZE};
pub use entry::{Actor, Entry, FilterKey, Row, TagValue, LOCAL_FILTER_NAME};
pub use error::{ConfigError, EmptyCursor, TransportError};
pub use identity::{ActorId, Cursor, RequestId, SubjectId};
pub use page::{Page, PageCompletion, PageQuery, PageRequest, QueryScope};
pub use traits::{ActorDirectory, PageSource, RequestDispatcher};
