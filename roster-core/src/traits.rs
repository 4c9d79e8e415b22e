//! Collaborator traits
//!
//! The loader talks to the outside world through three seams: the paging
//! transport, identity resolution, and the dispatcher that runs requests.

use crate::entry::Actor;
use crate::error::TransportError;
use crate::identity::{ActorId, RequestId};
use crate::page::{Page, PageQuery, PageRequest};
use async_trait::async_trait;

/// Remote paging service.
///
/// Implementations must tolerate being dropped mid-request; the dispatcher
/// cancels by aborting the task that awaits `fetch_page`.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch one page of entries.
    async fn fetch_page(&self, query: &PageQuery) -> Result<Page, TransportError>;
}

/// Identity resolution of raw actor ids.
pub trait ActorDirectory {
    /// Resolve an actor, or `None` when it is unavailable.
    fn resolve(&self, id: ActorId) -> Option<Actor>;

    /// Record actors returned alongside a page.
    fn absorb(&mut self, actors: &[Actor]);
}

/// Runs page requests on behalf of a session.
///
/// `dispatch` must not call back into the session: the completion is
/// delivered later, on the session's own sequencing context.
pub trait RequestDispatcher {
    fn dispatch(&mut self, id: RequestId, request: &PageRequest);

    /// Best-effort cancellation. A response may still arrive afterwards.
    fn cancel(&mut self, id: RequestId);
}
