//! Partition store: cached entries and pagination state per filter key.

use roster_core::{ActorId, Cursor, Entry, FilterKey, TagValue};
use std::collections::{HashMap, HashSet};

/// Where a partition stands in its paginated stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    /// Nothing fetched yet.
    Start,
    /// More pages follow, starting at this cursor.
    At(Cursor),
    /// The service signalled the end of the stream.
    Exhausted,
}

impl Position {
    /// Position after a page whose continuation is `next`.
    pub fn after(next: Option<Cursor>) -> Self {
        match next {
            Some(cursor) => Self::At(cursor),
            None => Self::Exhausted,
        }
    }

    /// Cursor to continue from; `None` at the start or once exhausted.
    pub fn cursor(&self) -> Option<&Cursor> {
        match self {
            Self::At(cursor) => Some(cursor),
            _ => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }

    /// Whether a page fetched from `from` continues this position.
    pub fn continues_from(&self, from: Option<&Cursor>) -> bool {
        match (self, from) {
            (Self::Start, None) => true,
            (Self::At(cursor), Some(from)) => cursor == from,
            _ => false,
        }
    }
}

/// How a partition gets its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sourcing {
    /// The unfiltered partition, paged without a tag.
    Unfiltered,
    /// A tag partition fed by the unfiltered pages.
    Derived,
    /// A tag partition paged with the tag in the request and its own cursor.
    Dedicated,
    /// The locally known list. Complete on creation.
    Local,
}

/// Ordered, append-only entries for one filter key.
///
/// An entry is stored once. Every entry of a tag partition carries the same
/// tag, so there an actor appears at most once; the unfiltered partition
/// keeps one entry per (actor, tag) pair.
#[derive(Debug, Clone)]
pub struct Partition {
    entries: Vec<Entry>,
    members: HashSet<Entry>,
    position: Position,
    sourcing: Sourcing,
    unproductive_pages: u32,
}

impl Partition {
    fn new(sourcing: Sourcing) -> Self {
        let position = match sourcing {
            Sourcing::Local => Position::Exhausted,
            _ => Position::Start,
        };
        Self {
            entries: Vec::new(),
            members: HashSet::new(),
            position,
            sourcing,
            unproductive_pages: 0,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, entry: &Entry) -> bool {
        self.members.contains(entry)
    }

    pub fn has_actor(&self, actor: ActorId) -> bool {
        self.entries.iter().any(|entry| entry.actor == actor)
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn sourcing(&self) -> Sourcing {
        self.sourcing
    }

    /// Appends entries not yet present and returns how many were added.
    pub fn extend<I>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = Entry>,
    {
        let before = self.entries.len();
        for entry in entries {
            if !self.members.contains(&entry) {
                self.members.insert(entry.clone());
                self.entries.push(entry);
            }
        }
        self.entries.len() - before
    }

    /// Moves the position past a page fetched from `from`.
    ///
    /// A page that does not continue the current position is a replay or a
    /// late duplicate and leaves the position alone; in particular an
    /// exhausted partition is never reopened.
    pub fn advance(&mut self, from: Option<&Cursor>, next: Option<Cursor>) -> bool {
        if !self.position.continues_from(from) {
            return false;
        }
        self.position = Position::after(next);
        true
    }

    /// Consecutive unfiltered pages fetched for this partition that added
    /// nothing to it.
    pub fn unproductive_pages(&self) -> u32 {
        self.unproductive_pages
    }

    /// Number of consecutive unproductive unfiltered pages after this one.
    pub(crate) fn record_unproductive_page(&mut self) -> u32 {
        self.unproductive_pages += 1;
        self.unproductive_pages
    }

    pub(crate) fn reset_unproductive_pages(&mut self) {
        self.unproductive_pages = 0;
    }

    /// Detach a derived tag partition from the unfiltered stream. Entries
    /// derived so far are kept; paging restarts with the tag in the request.
    pub(crate) fn promote_to_dedicated(&mut self) {
        debug_assert_eq!(self.sourcing, Sourcing::Derived);
        self.sourcing = Sourcing::Dedicated;
        self.position = Position::Start;
        self.unproductive_pages = 0;
    }
}

/// Result of appending a page to a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    pub added: usize,
    pub advanced: bool,
}

/// Holds every partition of one session.
///
/// The unfiltered partition always exists; tag partitions are created on
/// first reference; the local partition exists once it has been seeded.
#[derive(Debug, Clone)]
pub struct PartitionStore {
    unfiltered: Partition,
    tagged: HashMap<TagValue, Partition>,
    local: Option<Partition>,
}

impl Default for PartitionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PartitionStore {
    pub fn new() -> Self {
        Self {
            unfiltered: Partition::new(Sourcing::Unfiltered),
            tagged: HashMap::new(),
            local: None,
        }
    }

    pub fn unfiltered(&self) -> &Partition {
        &self.unfiltered
    }

    pub fn tagged(&self, tag: &TagValue) -> Option<&Partition> {
        self.tagged.get(tag)
    }

    pub(crate) fn tagged_mut(&mut self, tag: &TagValue) -> Option<&mut Partition> {
        self.tagged.get_mut(tag)
    }

    pub fn get(&self, key: &FilterKey) -> Option<&Partition> {
        match key {
            FilterKey::All => Some(&self.unfiltered),
            FilterKey::Tag(tag) => self.tagged.get(tag),
            FilterKey::Local => self.local.as_ref(),
        }
    }

    /// Returns the partition for `key`, creating an empty one if needed.
    ///
    /// A new tag partition starts out derived and is seeded with the
    /// matching unfiltered entries already cached.
    pub fn get_or_create(&mut self, key: &FilterKey) -> &mut Partition {
        match key {
            FilterKey::All => &mut self.unfiltered,
            FilterKey::Tag(tag) => {
                let unfiltered = &self.unfiltered;
                self.tagged.entry(tag.clone()).or_insert_with(|| {
                    let mut partition = Partition::new(Sourcing::Derived);
                    partition.extend(
                        unfiltered
                            .entries()
                            .iter()
                            .filter(|entry| entry.matches(tag))
                            .cloned(),
                    );
                    partition
                })
            }
            FilterKey::Local => self
                .local
                .get_or_insert_with(|| Partition::new(Sourcing::Local)),
        }
    }

    /// Materialise the local partition from the locally known list. Only the
    /// first call has an effect.
    pub fn seed_local<I>(&mut self, actors: I) -> bool
    where
        I: IntoIterator<Item = ActorId>,
    {
        if self.local.is_some() {
            return false;
        }
        let mut partition = Partition::new(Sourcing::Local);
        partition.extend(actors.into_iter().map(|actor| Entry {
            actor,
            tag: TagValue::empty(),
        }));
        self.local = Some(partition);
        true
    }

    /// Append a page fetched from `from` to the partition for `key`,
    /// skipping entries already present.
    ///
    /// Unfiltered pages also feed every tag partition still derived from
    /// them.
    pub fn append(
        &mut self,
        key: &FilterKey,
        from: Option<&Cursor>,
        entries: Vec<Entry>,
        next: Option<Cursor>,
    ) -> AppendOutcome {
        match key {
            FilterKey::All => {
                self.feed_derived(&entries);
                let advanced = self.unfiltered.advance(from, next);
                let added = self.unfiltered.extend(entries);
                AppendOutcome { added, advanced }
            }
            FilterKey::Tag(_) => {
                let partition = self.get_or_create(key);
                let advanced = partition.advance(from, next);
                let added = partition.extend(entries);
                AppendOutcome { added, advanced }
            }
            FilterKey::Local => {
                debug_assert!(false, "the local partition is never paged");
                AppendOutcome {
                    added: 0,
                    advanced: false,
                }
            }
        }
    }

    /// Lazy view over the unfiltered entries carrying `tag`.
    pub fn filter_view<'a>(&'a self, tag: &'a TagValue) -> impl Iterator<Item = &'a Entry> + 'a {
        self.unfiltered
            .entries()
            .iter()
            .filter(move |entry| entry.matches(tag))
    }

    /// Copy matching unfiltered entries into the tag partition.
    ///
    /// Applies to derived partitions, and to dedicated ones once the
    /// unfiltered stream is exhausted (every entry is then known).
    pub fn sync_derived(&mut self, tag: &TagValue) -> usize {
        let unfiltered_done = self.unfiltered.position().is_exhausted();
        let Some(partition) = self.tagged.get_mut(tag) else {
            return 0;
        };
        if partition.sourcing() != Sourcing::Derived && !unfiltered_done {
            return 0;
        }
        partition.extend(
            self.unfiltered
                .entries()
                .iter()
                .filter(|entry| entry.matches(tag))
                .cloned(),
        )
    }

    fn feed_derived(&mut self, entries: &[Entry]) {
        for (tag, partition) in self.tagged.iter_mut() {
            if partition.sourcing() == Sourcing::Derived {
                partition.extend(entries.iter().filter(|entry| entry.matches(tag)).cloned());
            }
        }
    }
}
