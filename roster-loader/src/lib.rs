//! ROSTER Loader
//!
//! Paginated, filter-switchable loader for (actor, tag) entry lists such as
//! "who reacted with what" or "who has read this".
//!
//! - [`partition`]: cached entries and pagination state per filter key
//! - [`projection`]: deduplicated rows for the active view
//! - [`lifecycle`]: the single outstanding page request
//! - [`session`]: the filter switch coordinator tying them together
//! - [`driver`]: tokio task owning a session, fed by [`dispatch`]

pub mod api_client;
pub mod config;
pub mod directory;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod partition;
pub mod projection;
pub mod session;
pub mod telemetry;

pub use api_client::{ApiClientError, RestPageSource};
pub use config::RosterConfig;
pub use directory::InMemoryDirectory;
pub use dispatch::TokioDispatcher;
pub use driver::SessionDriver;
pub use error::LoaderError;
pub use events::{CommandParseError, SessionCommand};
pub use lifecycle::{InFlight, RequestLifecycle};
pub use partition::{AppendOutcome, Partition, PartitionStore, Position, Sourcing};
pub use projection::{project, Projection};
pub use session::{resolve_initial_filter, tab_counts, ListSession, SessionSnapshot, TabCount};
