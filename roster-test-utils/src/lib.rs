//! ROSTER Test Utilities
//!
//! Centralized test infrastructure for the ROSTER workspace:
//! - A recording dispatcher for driving sessions synchronously
//! - A scripted page source for driving sessions through tokio
//! - Test fixtures for pages, entries and completions
//! - Proptest generators for entries, pages and filter keys

pub use roster_core::{
    Actor, ActorDirectory, ActorId, Cursor, Entry, FilterKey, LoaderConfig, Page, PageCompletion,
    PageQuery, PageRequest, PageSource, QueryScope, RequestDispatcher, RequestId, Row, TagValue,
    TransportError,
};

use async_trait::async_trait;
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tokio::sync::Semaphore;

// ============================================================================
// RECORDING DISPATCHER
// ============================================================================

/// Dispatcher that only records what it was asked to do.
///
/// Tests deliver completions by hand, which makes every interleaving of
/// "switch" and "response arrives" reproducible.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    pub dispatched: Vec<(RequestId, PageRequest)>,
    pub cancelled: Vec<RequestId>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fetches issued so far.
    pub fn fetch_count(&self) -> usize {
        self.dispatched.len()
    }

    /// Number of fetches that asked the service to filter by a tag.
    pub fn tag_scoped_count(&self) -> usize {
        self.dispatched
            .iter()
            .filter(|(_, request)| request.query.scope != QueryScope::Unfiltered)
            .count()
    }

    pub fn last(&self) -> Option<&(RequestId, PageRequest)> {
        self.dispatched.last()
    }

    pub fn request(&self, id: RequestId) -> Option<&PageRequest> {
        self.dispatched
            .iter()
            .find(|(issued, _)| *issued == id)
            .map(|(_, request)| request)
    }
}

impl RequestDispatcher for RecordingDispatcher {
    fn dispatch(&mut self, id: RequestId, request: &PageRequest) {
        self.dispatched.push((id, request.clone()));
    }

    fn cancel(&mut self, id: RequestId) {
        self.cancelled.push(id);
    }
}

// ============================================================================
// SCRIPTED PAGE SOURCE
// ============================================================================

type PageKey = (QueryScope, Option<Cursor>);

/// Page source answering from a script keyed by (scope, cursor).
///
/// Queries for a held scope block until [`ScriptedSource::release`] hands
/// out a permit, so tests can order responses against filter switches.
#[derive(Debug)]
pub struct ScriptedSource {
    pages: Mutex<HashMap<PageKey, Result<Page, TransportError>>>,
    held: Mutex<HashSet<QueryScope>>,
    permits: Semaphore,
    calls: Mutex<Vec<PageQuery>>,
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
            held: Mutex::new(HashSet::new()),
            permits: Semaphore::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_page(self, scope: QueryScope, cursor: Option<&str>, page: Page) -> Self {
        self.script(scope, cursor, Ok(page));
        self
    }

    pub fn with_failure(self, scope: QueryScope, cursor: Option<&str>, err: TransportError) -> Self {
        self.script(scope, cursor, Err(err));
        self
    }

    /// Hold every query for `scope` until released.
    pub fn holding(self, scope: QueryScope) -> Self {
        self.held.lock().expect("scripted source lock").insert(scope);
        self
    }

    /// Let `count` held queries proceed.
    pub fn release(&self, count: usize) {
        self.permits.add_permits(count);
    }

    pub fn calls(&self) -> Vec<PageQuery> {
        self.calls.lock().expect("scripted source lock").clone()
    }

    fn script(&self, scope: QueryScope, cursor: Option<&str>, outcome: Result<Page, TransportError>) {
        let cursor = cursor.and_then(Cursor::parse);
        self.pages
            .lock()
            .expect("scripted source lock")
            .insert((scope, cursor), outcome);
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn fetch_page(&self, query: &PageQuery) -> Result<Page, TransportError> {
        self.calls
            .lock()
            .expect("scripted source lock")
            .push(query.clone());

        let held = self
            .held
            .lock()
            .expect("scripted source lock")
            .contains(&query.scope);
        if held {
            let permit = self
                .permits
                .acquire()
                .await
                .map_err(|_| TransportError::Cancelled)?;
            permit.forget();
        }

        self.pages
            .lock()
            .expect("scripted source lock")
            .get(&(query.scope.clone(), query.cursor.clone()))
            .cloned()
            .unwrap_or_else(|| {
                Err(TransportError::Http {
                    status: 404,
                    message: "no scripted page".to_string(),
                })
            })
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

/// Actor with a predictable display name.
pub fn actor(id: u64) -> Actor {
    Actor::new(id, format!("actor-{}", id))
}

pub fn entry(id: u64, tag: &str) -> Entry {
    Entry::new(id, tag)
}

/// Page of `(actor, tag)` pairs; every actor is resolved alongside it.
pub fn page(entries: &[(u64, &str)], next: Option<&str>) -> Page {
    Page {
        entries: entries.iter().map(|(id, tag)| entry(*id, tag)).collect(),
        actors: entries.iter().map(|(id, _)| actor(*id)).collect(),
        next_cursor: next.and_then(Cursor::parse),
    }
}

/// Page whose actors the service could not resolve.
pub fn unresolved_page(entries: &[(u64, &str)], next: Option<&str>) -> Page {
    Page {
        actors: Vec::new(),
        ..page(entries, next)
    }
}

pub fn tag_scope(tag: &str) -> QueryScope {
    QueryScope::Tag(TagValue::from(tag))
}

pub fn completion(id: RequestId, request: PageRequest, page: Page) -> PageCompletion {
    PageCompletion {
        id,
        request,
        outcome: Ok(page),
    }
}

pub fn failed_completion(id: RequestId, request: PageRequest) -> PageCompletion {
    PageCompletion {
        id,
        request,
        outcome: Err(TransportError::Network {
            reason: "connection reset".to_string(),
        }),
    }
}

/// Actor ids of `rows` in display order.
pub fn row_ids(rows: &[Row]) -> Vec<u64> {
    rows.iter().map(|row| row.actor_id().get()).collect()
}

/// Whether `rows` shows any actor twice.
pub fn has_duplicate_actor(rows: &[Row]) -> bool {
    let mut seen = HashSet::new();
    rows.iter().any(|row| !seen.insert(row.actor_id()))
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

/// Small tag alphabet so that generated pages collide often.
pub fn arb_tag() -> impl Strategy<Value = TagValue> {
    prop_oneof![Just("👍"), Just("❤"), Just("🔥")].prop_map(|tag: &str| TagValue::from(tag))
}

/// Small actor space so that duplicates across pages are common.
pub fn arb_entry() -> impl Strategy<Value = Entry> {
    (1u64..12, arb_tag()).prop_map(|(id, tag)| Entry::new(id, tag))
}

pub fn arb_page() -> impl Strategy<Value = Page> {
    (
        prop::collection::vec(arb_entry(), 0..8),
        prop::option::weighted(0.8, "[a-z]{1,4}"),
    )
        .prop_map(|(entries, next)| Page {
            actors: entries.iter().map(|e| actor(e.actor.get())).collect(),
            entries,
            next_cursor: next.and_then(Cursor::parse),
        })
}

pub fn arb_filter_key() -> impl Strategy<Value = FilterKey> {
    prop_oneof![
        Just(FilterKey::All),
        Just(FilterKey::Local),
        arb_tag().prop_map(FilterKey::Tag),
    ]
}
