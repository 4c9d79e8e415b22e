//! Async driver owning one list session.
//!
//! The driver task is the session's single owner: commands from the caller
//! and completions from the dispatcher are serialised through one
//! `tokio::select!` loop, and every change is published as a
//! [`SessionSnapshot`] on a watch channel.

use crate::dispatch::TokioDispatcher;
use crate::events::SessionCommand;
use crate::session::{ListSession, SessionSnapshot};
use roster_core::{
    ActorDirectory, ActorId, FilterKey, LoaderConfig, PageCompletion, PageSource, TagValue,
};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

pub struct SessionDriver<S: ?Sized, A> {
    session: ListSession<TokioDispatcher<S>, A>,
    completions: mpsc::UnboundedReceiver<PageCompletion>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl<S, A> SessionDriver<S, A>
where
    S: PageSource + ?Sized + 'static,
    A: ActorDirectory,
{
    /// Open a session over `source`. Must be called inside a tokio runtime,
    /// since the first fetch is spawned right away.
    pub fn open(
        source: Arc<S>,
        config: LoaderConfig,
        requested: FilterKey,
        available: &[TagValue],
        local_list: Vec<ActorId>,
        directory: A,
    ) -> (Self, watch::Receiver<SessionSnapshot>) {
        let (dispatcher, completions) = TokioDispatcher::new(source);
        let session = ListSession::open(config, requested, available, local_list, directory, dispatcher);
        let (snapshots, receiver) = watch::channel(session.snapshot());
        let driver = Self {
            session,
            completions,
            snapshots,
        };
        (driver, receiver)
    }

    pub fn session(&self) -> &ListSession<TokioDispatcher<S>, A> {
        &self.session
    }

    /// Apply one command. Returns `false` on shutdown.
    pub fn handle(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::SwitchFilter(filter) => {
                self.session.switch_filter(filter);
            }
            SessionCommand::LoadMore => {
                self.session.load_more();
            }
            SessionCommand::Shutdown => return false,
        }
        self.publish();
        true
    }

    pub fn absorb(&mut self, completion: PageCompletion) {
        self.session.dispatcher_mut().forget(completion.id);
        self.session.complete(completion);
        self.publish();
    }

    /// Drive the session until `Shutdown` arrives or every command sender
    /// is dropped. Returns the final snapshot.
    pub async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) -> SessionSnapshot {
        tracing::info!(filter = %self.session.active_filter(), "Session driver started");
        loop {
            tokio::select! {
                command = commands.recv() => {
                    let keep_running = match command {
                        Some(command) => self.handle(command),
                        None => false,
                    };
                    if !keep_running {
                        break;
                    }
                }
                Some(completion) = self.completions.recv() => {
                    self.absorb(completion);
                }
            }
        }
        if let Some(id) = self.session.cancel_in_flight() {
            tracing::debug!(request_id = %id, "Cancelled request on shutdown");
        }
        let snapshot = self.session.snapshot();
        tracing::info!(
            filter = %snapshot.active,
            rows = snapshot.rows.len(),
            "Session driver stopped"
        );
        snapshot
    }

    fn publish(&self) {
        let next = self.session.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}
