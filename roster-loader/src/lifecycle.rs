//! Request lifecycle: at most one outstanding page request per session.

use roster_core::{PageRequest, RequestDispatcher, RequestId};

/// The request currently outstanding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFlight {
    pub id: RequestId,
    pub request: PageRequest,
}

impl InFlight {
    /// Same served view, same query scope, same starting cursor.
    fn duplicates(&self, request: &PageRequest) -> bool {
        self.request.serves == request.serves
            && self.request.query.scope == request.query.scope
            && self.request.query.cursor == request.query.cursor
    }
}

/// Tracks the single in-flight request and hands out request ids.
#[derive(Debug, Clone)]
pub struct RequestLifecycle {
    next_id: RequestId,
    in_flight: Option<InFlight>,
}

impl Default for RequestLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestLifecycle {
    pub fn new() -> Self {
        Self {
            next_id: RequestId::new(1),
            in_flight: None,
        }
    }

    pub fn in_flight(&self) -> Option<&InFlight> {
        self.in_flight.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether `id` is the outstanding request.
    pub fn is_current(&self, id: RequestId) -> bool {
        self.in_flight.as_ref().is_some_and(|f| f.id == id)
    }

    /// Dispatch `request`, superseding whatever is outstanding.
    ///
    /// Returns `None` without touching the dispatcher when an identical
    /// request is already outstanding.
    pub fn issue<D>(&mut self, request: PageRequest, dispatcher: &mut D) -> Option<RequestId>
    where
        D: RequestDispatcher + ?Sized,
    {
        if let Some(current) = &self.in_flight {
            if current.duplicates(&request) {
                tracing::trace!(request_id = %current.id, "Identical request outstanding");
                return None;
            }
        }
        self.cancel(dispatcher);

        let id = self.next_id;
        self.next_id = id.next();
        tracing::debug!(
            request_id = %id,
            filter = %request.serves,
            scope = ?request.query.scope,
            cursor = ?request.query.cursor.as_ref().map(|c| c.as_str()),
            limit = request.query.limit,
            "Issuing page request"
        );
        dispatcher.dispatch(id, &request);
        self.in_flight = Some(InFlight { id, request });
        Some(id)
    }

    /// Cancel the outstanding request, if any. Its response may still
    /// arrive and is then treated as stale.
    pub fn cancel<D>(&mut self, dispatcher: &mut D) -> Option<RequestId>
    where
        D: RequestDispatcher + ?Sized,
    {
        let current = self.in_flight.take()?;
        tracing::debug!(request_id = %current.id, filter = %current.request.serves, "Cancelling page request");
        dispatcher.cancel(current.id);
        Some(current.id)
    }

    /// Clear the in-flight slot if `id` is the outstanding request.
    pub fn settle(&mut self, id: RequestId) -> bool {
        if self.is_current(id) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }
}
