//! List session: the filter switch coordinator.
//!
//! A [`ListSession`] is a single-owner state machine. Every mutation
//! (switching filters, loading more, absorbing a completion) happens through
//! `&mut self`, so a completion always observes a fully applied switch. The
//! session never awaits anything: requests go out through a
//! [`RequestDispatcher`] and come back as [`PageCompletion`]s delivered by
//! whoever owns the session.

use crate::lifecycle::{InFlight, RequestLifecycle};
use crate::partition::{PartitionStore, Sourcing};
use crate::projection::Projection;
use roster_core::{
    ActorDirectory, ActorId, Cursor, Entry, FilterKey, LoaderConfig, PageCompletion, PageQuery,
    PageRequest, QueryScope, RequestDispatcher, RequestId, Row, TagValue,
};

// ============================================================================
// SNAPSHOTS AND TABS
// ============================================================================

/// Read-only view of a session, published to the rendering side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub active: FilterKey,
    pub rows: Vec<Row>,
    pub loading: bool,
    pub exhausted: bool,
}

/// One tab of the filter selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabCount {
    pub filter: FilterKey,
    pub count: usize,
}

/// Tabs for the filter selector: the unfiltered total, each tag with its
/// count, then the locally known list when it is not empty.
pub fn tab_counts(available: &[(TagValue, usize)], local_len: usize) -> Vec<TabCount> {
    let total = available.iter().map(|(_, count)| count).sum();
    let mut tabs = Vec::with_capacity(available.len() + 2);
    tabs.push(TabCount {
        filter: FilterKey::All,
        count: total,
    });
    tabs.extend(
        available
            .iter()
            .filter(|(tag, _)| !tag.is_empty())
            .map(|(tag, count)| TabCount {
                filter: FilterKey::Tag(tag.clone()),
                count: *count,
            }),
    );
    if local_len > 0 {
        tabs.push(TabCount {
            filter: FilterKey::Local,
            count: local_len,
        });
    }
    tabs
}

/// Filter a session opens on.
///
/// A tag the subject does not carry falls back to the unfiltered view, and
/// the unfiltered view gives way to the locally known list when there is
/// one.
pub fn resolve_initial_filter(
    requested: FilterKey,
    available: &[TagValue],
    local: &[ActorId],
) -> FilterKey {
    let filter = match requested {
        FilterKey::Tag(tag) if !available.contains(&tag) => FilterKey::All,
        FilterKey::Local if local.is_empty() => FilterKey::All,
        other => other,
    };
    if filter == FilterKey::All && !local.is_empty() {
        FilterKey::Local
    } else {
        filter
    }
}

// ============================================================================
// LIST SESSION
// ============================================================================

/// Paginated, filter-switchable list of (actor, tag) entries.
#[derive(Debug)]
pub struct ListSession<D, A> {
    config: LoaderConfig,
    store: PartitionStore,
    projection: Projection,
    lifecycle: RequestLifecycle,
    directory: A,
    dispatcher: D,
    local_list: Vec<ActorId>,
    active: FilterKey,
    /// Whether the active view was exhausted as of its last refresh. Late
    /// responses for other views never move it.
    exhausted: bool,
}

impl<D, A> ListSession<D, A>
where
    D: RequestDispatcher,
    A: ActorDirectory,
{
    /// Open a session on `requested` (see [`resolve_initial_filter`]) and
    /// issue the first fetch if the view needs one.
    pub fn open(
        config: LoaderConfig,
        requested: FilterKey,
        available: &[TagValue],
        local_list: Vec<ActorId>,
        directory: A,
        dispatcher: D,
    ) -> Self {
        let active = resolve_initial_filter(requested, available, &local_list);
        tracing::debug!(filter = %active, local = local_list.len(), "Opening list session");
        let mut session = Self {
            config,
            store: PartitionStore::new(),
            projection: Projection::new(),
            lifecycle: RequestLifecycle::new(),
            directory,
            dispatcher,
            local_list,
            active,
            exhausted: false,
        };
        session.show();
        session
    }

    /// Make `filter` the active view. Returns `false` if it already was.
    pub fn switch_filter(&mut self, filter: FilterKey) -> bool {
        if filter == self.active {
            return false;
        }
        self.lifecycle.cancel(&mut self.dispatcher);
        self.projection.clear();
        tracing::debug!(from = %self.active, to = %filter, "Switching filter");
        self.active = filter;
        self.show();
        true
    }

    /// Request the next page of the active view.
    ///
    /// Does nothing while a request is outstanding or once the view is
    /// exhausted. If late responses have meanwhile cached everything the
    /// view will get, the rows catch up from the cache instead of fetching.
    pub fn load_more(&mut self) -> Option<RequestId> {
        if self.lifecycle.is_busy() || self.exhausted {
            return None;
        }
        if view_exhausted(&self.store, &self.active) {
            self.sync_active();
            let added = self.refresh();
            tracing::debug!(filter = %self.active, added, "Caught up from cache");
            return None;
        }
        self.issue_next()
    }

    /// Absorb a completed request.
    ///
    /// The page always lands in the cache; the visible rows are refreshed
    /// only if the request served the active view. Returns whether the
    /// visible rows were refreshed.
    pub fn complete(&mut self, completion: PageCompletion) -> bool {
        let PageCompletion {
            id,
            request,
            outcome,
        } = completion;
        let current = self.lifecycle.settle(id);

        let page = match outcome {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!(
                    request_id = %id,
                    filter = %request.serves,
                    error = %err,
                    "Page request failed"
                );
                return false;
            }
        };
        if !current {
            tracing::debug!(request_id = %id, filter = %request.serves, "Absorbing stale page response");
        }

        self.directory.absorb(&page.actors);
        let directory = &self.directory;
        let entries: Vec<Entry> = page
            .entries
            .into_iter()
            .filter(|entry| directory.resolve(entry.actor).is_some())
            .collect();
        self.absorb_page(&request, entries, page.next_cursor);

        if request.serves != self.active {
            return false;
        }
        self.sync_active();
        let added = self.refresh();
        tracing::trace!(request_id = %id, added, rows = self.projection.len(), "Refreshed visible rows");

        if self.projection.is_empty() && !self.lifecycle.is_busy() && !self.is_exhausted() {
            self.issue_next();
        }
        true
    }

    /// Cancel the outstanding request, if any.
    pub fn cancel_in_flight(&mut self) -> Option<RequestId> {
        self.lifecycle.cancel(&mut self.dispatcher)
    }

    pub fn visible_rows(&self) -> &[Row] {
        self.projection.rows()
    }

    /// Nothing to show yet, but more is expected.
    pub fn is_loading(&self) -> bool {
        self.projection.is_empty() && !self.is_exhausted()
    }

    pub fn active_filter(&self) -> &FilterKey {
        &self.active
    }

    /// Whether the active view has shown every entry it will ever get.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn in_flight(&self) -> Option<&InFlight> {
        self.lifecycle.in_flight()
    }

    pub fn store(&self) -> &PartitionStore {
        &self.store
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut D {
        &mut self.dispatcher
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            active: self.active.clone(),
            rows: self.projection.rows().to_vec(),
            loading: self.is_loading(),
            exhausted: self.is_exhausted(),
        }
    }

    // ------------------------------------------------------------------------

    /// Derive the active view from the cache, then fetch if it can grow.
    fn show(&mut self) {
        let active = self.active.clone();
        match &active {
            FilterKey::All => {}
            FilterKey::Local => {
                self.store.seed_local(self.local_list.iter().copied());
            }
            FilterKey::Tag(tag) => {
                self.store.get_or_create(&active);
                self.store.sync_derived(tag);
                self.promote_on_select(tag);
            }
        }
        self.refresh();
        if !self.exhausted {
            self.issue_next();
        }
    }

    fn sync_active(&mut self) {
        if let FilterKey::Tag(tag) = &self.active {
            self.store.sync_derived(tag);
        }
    }

    /// Project new cache entries of the active view and take its
    /// exhaustion from the same state.
    fn refresh(&mut self) -> usize {
        self.exhausted = view_exhausted(&self.store, &self.active);
        let entries = view_entries(&self.store, &self.active);
        self.projection.catch_up(entries, &self.directory)
    }

    /// A derived tag view with nothing cached pages through its own cursor
    /// straight away, as does any view the policy no longer trusts to
    /// unfiltered pages.
    fn promote_on_select(&mut self, tag: &TagValue) {
        let unfiltered_done = self.store.unfiltered().position().is_exhausted();
        let policy = self.config.dedicated_fetch;
        let Some(partition) = self.store.tagged_mut(tag) else {
            return;
        };
        if partition.sourcing() != Sourcing::Derived || unfiltered_done {
            return;
        }
        if partition.is_empty() || policy.should_promote(partition.unproductive_pages()) {
            tracing::debug!(tag = %tag, cached = partition.len(), "Tag view pages on its own cursor");
            partition.promote_to_dedicated();
        }
    }

    fn absorb_page(&mut self, request: &PageRequest, entries: Vec<Entry>, next: Option<Cursor>) {
        let from = request.query.cursor.as_ref();
        match &request.query.scope {
            QueryScope::Unfiltered => {
                let derived = request.serves.as_tag().and_then(|tag| {
                    self.store
                        .tagged(tag)
                        .filter(|partition| partition.sourcing() == Sourcing::Derived)
                        .map(|partition| (tag, partition.len()))
                });
                let outcome = self.store.append(&FilterKey::All, from, entries, next);
                tracing::trace!(added = outcome.added, advanced = outcome.advanced, "Appended unfiltered page");
                if let (Some((tag, before)), true) = (derived, outcome.advanced) {
                    self.track_sufficiency(tag, before);
                }
            }
            QueryScope::Tag(tag) => {
                let outcome = self
                    .store
                    .append(&FilterKey::Tag(tag.clone()), from, entries, next);
                tracing::trace!(tag = %tag, added = outcome.added, advanced = outcome.advanced, "Appended tag page");
            }
        }
    }

    /// Count unfiltered pages fetched for a derived tag view that added
    /// nothing to it, and switch the view to its own cursor when the policy
    /// says so.
    fn track_sufficiency(&mut self, tag: &TagValue, before: usize) {
        let unfiltered_done = self.store.unfiltered().position().is_exhausted();
        let policy = self.config.dedicated_fetch;
        let Some(partition) = self.store.tagged_mut(tag) else {
            return;
        };
        if partition.len() > before {
            partition.reset_unproductive_pages();
            return;
        }
        let misses = partition.record_unproductive_page();
        if !unfiltered_done && policy.should_promote(misses) {
            tracing::debug!(tag = %tag, misses, "Unfiltered pages no longer satisfy tag view");
            partition.promote_to_dedicated();
        }
    }

    fn next_request(&self) -> Option<PageRequest> {
        let unfiltered_cursor = || self.store.unfiltered().position().cursor().cloned();
        let (scope, cursor) = match &self.active {
            FilterKey::Local => return None,
            FilterKey::All => (QueryScope::Unfiltered, unfiltered_cursor()),
            FilterKey::Tag(tag) => {
                let partition = self.store.tagged(tag)?;
                match partition.sourcing() {
                    Sourcing::Dedicated => (
                        QueryScope::Tag(tag.clone()),
                        partition.position().cursor().cloned(),
                    ),
                    _ => (QueryScope::Unfiltered, unfiltered_cursor()),
                }
            }
        };
        let limit = self.config.limit_for(cursor.as_ref());
        Some(PageRequest {
            serves: self.active.clone(),
            query: PageQuery {
                scope,
                cursor,
                limit,
            },
        })
    }

    fn issue_next(&mut self) -> Option<RequestId> {
        debug_assert!(
            !view_exhausted(&self.store, &self.active),
            "fetch issued for an exhausted view"
        );
        let request = self.next_request()?;
        self.lifecycle.issue(request, &mut self.dispatcher)
    }
}

fn view_entries<'a>(store: &'a PartitionStore, key: &FilterKey) -> &'a [Entry] {
    store.get(key).map(|partition| partition.entries()).unwrap_or(&[])
}

fn view_exhausted(store: &PartitionStore, key: &FilterKey) -> bool {
    let unfiltered_done = store.unfiltered().position().is_exhausted();
    match key {
        FilterKey::All => unfiltered_done,
        FilterKey::Local => true,
        FilterKey::Tag(tag) => {
            unfiltered_done
                || store.tagged(tag).is_some_and(|partition| {
                    partition.sourcing() == Sourcing::Dedicated
                        && partition.position().is_exhausted()
                })
        }
    }
}
