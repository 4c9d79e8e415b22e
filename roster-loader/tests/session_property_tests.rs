use proptest::prelude::*;
use roster_core::{
    ActorId, Cursor, Entry, FilterKey, LoaderConfig, Page, PageRequest, QueryScope, TagValue,
};
use roster_loader::{InMemoryDirectory, ListSession, Position};
use roster_test_utils::{
    actor, arb_filter_key, arb_page, completion, failed_completion, has_duplicate_actor, page,
    row_ids, tag_scope, RecordingDispatcher,
};
use std::collections::{HashMap, HashSet};

type Session = ListSession<RecordingDispatcher, InMemoryDirectory>;

fn available() -> Vec<TagValue> {
    ["👍", "❤", "🔥"].into_iter().map(TagValue::from).collect()
}

fn open_with(requested: FilterKey, local: &[u64], directory: InMemoryDirectory) -> Session {
    ListSession::open(
        LoaderConfig::default(),
        requested,
        &available(),
        local.iter().map(|id| ActorId::new(*id)).collect(),
        directory,
        RecordingDispatcher::new(),
    )
}

fn open(requested: FilterKey, local: &[u64]) -> Session {
    open_with(
        requested,
        local,
        InMemoryDirectory::with_actors(local.iter().map(|id| actor(*id))),
    )
}

fn deliver(session: &mut Session, delivered: Page) -> bool {
    let in_flight = session.in_flight().cloned().expect("a request is outstanding");
    session.complete(completion(in_flight.id, in_flight.request, delivered))
}

// ============================================================================
// FILTER ISOLATION
// ============================================================================

#[test]
fn tag_view_is_derived_from_unfiltered_cache() {
    let mut session = open(FilterKey::All, &[]);
    deliver(&mut session, page(&[(1, "👍"), (2, "❤"), (3, "👍")], Some("c1")));

    session.switch_filter(FilterKey::tag("👍"));
    assert_eq!(row_ids(session.visible_rows()), vec![1, 3]);
    assert!(!session.is_loading());
    assert_eq!(session.dispatcher().tag_scoped_count(), 0);
}

#[test]
fn actor_with_several_tags_shows_once_per_view() {
    let mut session = open(FilterKey::All, &[]);
    deliver(&mut session, page(&[(1, "👍"), (1, "❤"), (2, "❤")], Some("c1")));
    assert_eq!(row_ids(session.visible_rows()), vec![1, 2]);
    assert_eq!(session.visible_rows()[0].tag.as_str(), "👍");

    session.switch_filter(FilterKey::tag("❤"));
    assert_eq!(row_ids(session.visible_rows()), vec![1, 2]);
    assert!(session
        .visible_rows()
        .iter()
        .all(|row| row.tag.as_str() == "❤"));
}

#[test]
fn tag_selected_with_nothing_cached_pages_on_its_own() {
    let mut session = open(FilterKey::All, &[]);
    deliver(&mut session, page(&[(1, "👍")], Some("c1")));

    session.switch_filter(FilterKey::tag("🔥"));
    assert!(session.is_loading());
    let (_, request) = session.dispatcher().last().unwrap();
    assert_eq!(request.query.scope, tag_scope("🔥"));
    assert_eq!(request.query.cursor, None);
}

// ============================================================================
// RACE SAFETY
// ============================================================================

#[test]
fn late_response_for_previous_tag_only_updates_cache() {
    let mut session = open(FilterKey::tag("👍"), &[]);
    let stale = session.in_flight().cloned().unwrap();

    session.switch_filter(FilterKey::tag("❤"));
    assert_eq!(session.dispatcher().cancelled, vec![stale.id]);
    assert!(session.visible_rows().is_empty());

    let refreshed = session.complete(completion(
        stale.id,
        stale.request,
        page(&[(5, "👍")], Some("t1")),
    ));
    assert!(!refreshed);
    assert!(session.visible_rows().is_empty());
    assert!(session.is_loading());
    let cached = session.store().tagged(&TagValue::from("👍")).unwrap();
    assert!(cached.has_actor(ActorId::new(5)));

    deliver(&mut session, page(&[(6, "❤")], None));
    assert_eq!(row_ids(session.visible_rows()), vec![6]);
}

#[test]
fn late_derived_response_does_not_repaint_other_tag() {
    let mut session = open(FilterKey::All, &[]);
    deliver(&mut session, page(&[(1, "👍"), (2, "❤")], Some("c1")));

    session.switch_filter(FilterKey::tag("👍"));
    let stale = session.in_flight().cloned().unwrap();
    assert_eq!(stale.request.query.scope, QueryScope::Unfiltered);

    session.switch_filter(FilterKey::tag("❤"));
    assert_eq!(row_ids(session.visible_rows()), vec![2]);

    session.complete(completion(
        stale.id,
        stale.request,
        page(&[(3, "👍"), (4, "❤")], Some("c2")),
    ));
    assert_eq!(row_ids(session.visible_rows()), vec![2]);
    let thumbs = session.store().tagged(&TagValue::from("👍")).unwrap();
    assert!(thumbs.has_actor(ActorId::new(3)));
}

#[test]
fn late_unfiltered_end_is_shown_with_next_tag_page() {
    let mut session = open(FilterKey::All, &[]);
    let stale = session.in_flight().cloned().unwrap();
    session.switch_filter(FilterKey::tag("❤"));
    assert_eq!(
        session.in_flight().unwrap().request.query.scope,
        tag_scope("❤")
    );

    session.complete(completion(
        stale.id,
        stale.request,
        page(&[(1, "❤"), (2, "👍")], None),
    ));
    assert!(session.visible_rows().is_empty());
    assert!(session.is_loading());
    assert!(!session.is_exhausted());

    deliver(&mut session, page(&[(3, "❤")], Some("t1")));
    assert_eq!(row_ids(session.visible_rows()), vec![3, 1]);
    assert!(session.is_exhausted());
    assert!(session.load_more().is_none());
}

// ============================================================================
// PSEUDO-TAG
// ============================================================================

#[test]
fn local_list_is_shown_without_fetching() {
    let session = open(FilterKey::All, &[1, 2, 3]);
    assert_eq!(session.active_filter(), &FilterKey::Local);
    assert_eq!(row_ids(session.visible_rows()), vec![1, 2, 3]);
    assert_eq!(session.dispatcher().fetch_count(), 0);
    assert!(!session.is_loading());
    assert!(session.is_exhausted());
}

#[test]
fn switching_to_local_bypasses_network() {
    let mut session = open(FilterKey::tag("👍"), &[1, 2]);
    assert_eq!(session.dispatcher().fetch_count(), 1);

    session.switch_filter(FilterKey::Local);
    assert_eq!(row_ids(session.visible_rows()), vec![1, 2]);
    assert_eq!(session.dispatcher().fetch_count(), 1);
    assert!(session.in_flight().is_none());
    assert!(session.load_more().is_none());

    session.switch_filter(FilterKey::All);
    session.switch_filter(FilterKey::Local);
    assert_eq!(row_ids(session.visible_rows()), vec![1, 2]);
}

#[test]
fn unresolvable_local_actor_is_dropped() {
    let directory = InMemoryDirectory::with_actors([actor(1), actor(3)]);
    let session = open_with(FilterKey::Local, &[1, 2, 3], directory);
    assert_eq!(row_ids(session.visible_rows()), vec![1, 3]);
}

// ============================================================================
// EXHAUSTION
// ============================================================================

#[test]
fn exhausted_unfiltered_stops_fetching() {
    let mut session = open(FilterKey::All, &[]);
    deliver(&mut session, page(&[(1, "👍"), (2, "❤")], None));
    assert!(session.is_exhausted());
    assert!(session.load_more().is_none());
    assert!(session.load_more().is_none());
    assert_eq!(session.dispatcher().fetch_count(), 1);
    assert!(!session.is_loading());

    // Every entry is known, so tag views need no fetch either.
    session.switch_filter(FilterKey::tag("🔥"));
    assert!(session.visible_rows().is_empty());
    assert!(!session.is_loading());
    assert_eq!(session.dispatcher().fetch_count(), 1);
}

#[test]
fn exhausted_dedicated_tag_stops_fetching() {
    let mut session = open(FilterKey::tag("❤"), &[]);
    deliver(&mut session, page(&[(4, "❤")], None));
    assert!(session.is_exhausted());
    assert!(session.load_more().is_none());
    assert_eq!(session.dispatcher().fetch_count(), 1);

    // The unfiltered view still has its own stream to page through.
    session.switch_filter(FilterKey::All);
    assert!(session.is_loading());
    assert_eq!(session.dispatcher().fetch_count(), 2);
}

#[test]
fn empty_exhausted_view_is_not_loading() {
    let mut session = open(FilterKey::All, &[]);
    deliver(&mut session, page(&[], None));
    assert!(session.visible_rows().is_empty());
    assert!(!session.is_loading());
}

// ============================================================================
// IDEMPOTENT APPEND
// ============================================================================

#[test]
fn redelivered_page_changes_nothing() {
    let mut session = open(FilterKey::All, &[]);
    let first = session.in_flight().cloned().unwrap();
    let delivered = page(&[(1, "👍"), (2, "❤")], Some("c1"));

    session.complete(completion(first.id, first.request.clone(), delivered.clone()));
    let rows = session.visible_rows().to_vec();
    session.complete(completion(first.id, first.request, delivered));

    assert_eq!(session.visible_rows(), rows.as_slice());
    assert_eq!(
        session.store().unfiltered().position(),
        &Position::At(roster_core::Cursor::parse("c1").unwrap())
    );
    session.load_more().unwrap();
    let (_, request) = session.dispatcher().last().unwrap();
    assert_eq!(request.query.cursor.as_ref().map(|c| c.as_str()), Some("c1"));
}

#[test]
fn failed_request_can_be_retried() {
    let mut session = open(FilterKey::All, &[]);
    let first = session.in_flight().cloned().unwrap();
    session.complete(failed_completion(first.id, first.request.clone()));
    assert!(session.is_loading());

    let retry = session.load_more().unwrap();
    assert_ne!(retry, first.id);
    let (_, request) = session.dispatcher().last().unwrap();
    assert_eq!(request, &first.request);
}

// ============================================================================
// RANDOMISED SEQUENCES
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Switch(FilterKey),
    LoadMore,
    Deliver(Page),
    Replay(usize, Page),
    Fail,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        arb_filter_key().prop_map(Op::Switch),
        Just(Op::LoadMore),
        arb_page().prop_map(Op::Deliver),
        (any::<usize>(), arb_page()).prop_map(|(index, page)| Op::Replay(index, page)),
        Just(Op::Fail),
    ]
}

/// A well-behaved service: it only returns entries carrying the requested
/// tag, and answers a query the same way every time it is asked.
#[derive(Default)]
struct Service {
    answers: HashMap<(QueryScope, Option<Cursor>), Page>,
}

impl Service {
    fn answer(&mut self, request: &PageRequest, mut fresh: Page) -> Page {
        let key = (request.query.scope.clone(), request.query.cursor.clone());
        self.answers
            .entry(key)
            .or_insert_with(|| {
                if let QueryScope::Tag(tag) = &request.query.scope {
                    for entry in &mut fresh.entries {
                        entry.tag = tag.clone();
                    }
                }
                fresh
            })
            .clone()
    }
}

fn distinct_actors(entries: &[Entry]) -> Vec<u64> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .filter(|entry| seen.insert(entry.actor))
        .map(|entry| entry.actor.get())
        .collect()
}

fn apply(session: &mut Session, service: &mut Service, op: Op) {
    match op {
        Op::Switch(filter) => {
            session.switch_filter(filter);
        }
        Op::LoadMore => {
            session.load_more();
        }
        Op::Deliver(delivered) => {
            if let Some(in_flight) = session.in_flight().cloned() {
                let delivered = service.answer(&in_flight.request, delivered);
                session.complete(completion(in_flight.id, in_flight.request, delivered));
            }
        }
        Op::Replay(index, delivered) => {
            let dispatched = &session.dispatcher().dispatched;
            if dispatched.is_empty() {
                return;
            }
            let (id, request) = dispatched[index % dispatched.len()].clone();
            let delivered = service.answer(&request, delivered);
            session.complete(completion(id, request, delivered));
        }
        Op::Fail => {
            if let Some(in_flight) = session.in_flight().cloned() {
                session.complete(failed_completion(in_flight.id, in_flight.request));
            }
        }
    }
}

proptest! {
    #[test]
    fn visible_rows_never_repeat_an_actor(
        initial in arb_filter_key(),
        ops in prop::collection::vec(arb_op(), 0..40),
    ) {
        let mut session = open(initial, &[1, 2, 3]);
        let mut service = Service::default();
        for op in ops {
            apply(&mut session, &mut service, op);
            prop_assert!(!has_duplicate_actor(session.visible_rows()));
            if let FilterKey::Tag(tag) = session.active_filter() {
                prop_assert!(session.visible_rows().iter().all(|row| &row.tag == tag));
            }
            if session.is_exhausted() {
                prop_assert!(!session.is_loading());
                // Nothing cached for an exhausted view is left unshown.
                let cached = session
                    .store()
                    .get(session.active_filter())
                    .map(|partition| distinct_actors(partition.entries()))
                    .unwrap_or_default();
                prop_assert_eq!(row_ids(session.visible_rows()), cached);
            }
        }
    }

    #[test]
    fn replaying_a_page_is_idempotent(delivered in arb_page()) {
        let mut session = open(FilterKey::All, &[]);
        let first = session.in_flight().cloned().unwrap();
        session.complete(completion(first.id, first.request.clone(), delivered.clone()));
        let rows = session.visible_rows().to_vec();
        let position = session.store().unfiltered().position().clone();

        session.complete(completion(first.id, first.request, delivered));
        prop_assert_eq!(session.visible_rows(), rows.as_slice());
        prop_assert_eq!(session.store().unfiltered().position(), &position);
    }
}
