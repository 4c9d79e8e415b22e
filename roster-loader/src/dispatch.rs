//! Tokio-backed request dispatcher.

use roster_core::{PageCompletion, PageRequest, PageSource, RequestDispatcher, RequestId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// Runs each page request as its own tokio task and posts the completion
/// back on an unbounded channel.
///
/// Cancelling aborts the task. A completion that was already posted is still
/// delivered, so the receiving side must treat it as stale.
pub struct TokioDispatcher<S: ?Sized> {
    source: Arc<S>,
    completions: mpsc::UnboundedSender<PageCompletion>,
    tasks: HashMap<RequestId, AbortHandle>,
}

impl<S> TokioDispatcher<S>
where
    S: PageSource + ?Sized + 'static,
{
    pub fn new(source: Arc<S>) -> (Self, mpsc::UnboundedReceiver<PageCompletion>) {
        let (completions, receiver) = mpsc::unbounded_channel();
        let dispatcher = Self {
            source,
            completions,
            tasks: HashMap::new(),
        };
        (dispatcher, receiver)
    }

    /// Drop the task handle of a request whose completion was received.
    pub fn forget(&mut self, id: RequestId) {
        self.tasks.remove(&id);
    }

    /// Number of requests dispatched and neither completed nor cancelled.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }
}

impl<S> RequestDispatcher for TokioDispatcher<S>
where
    S: PageSource + ?Sized + 'static,
{
    fn dispatch(&mut self, id: RequestId, request: &PageRequest) {
        let source = Arc::clone(&self.source);
        let completions = self.completions.clone();
        let request = request.clone();
        let task = tokio::spawn(async move {
            let outcome = source.fetch_page(&request.query).await;
            // The receiver is gone once the session has shut down.
            let _ = completions.send(PageCompletion {
                id,
                request,
                outcome,
            });
        });
        self.tasks.insert(id, task.abort_handle());
    }

    fn cancel(&mut self, id: RequestId) {
        if let Some(task) = self.tasks.remove(&id) {
            task.abort();
        }
    }
}

impl<S: ?Sized> Drop for TokioDispatcher<S> {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

impl<S: ?Sized> std::fmt::Debug for TokioDispatcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioDispatcher")
            .field("pending", &self.tasks.len())
            .finish()
    }
}
