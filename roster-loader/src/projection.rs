//! Dedup projection of a partition onto the visible row set.

use roster_core::{ActorDirectory, ActorId, Entry, Row};
use std::collections::HashSet;

/// Visible rows for the active partition, one per actor.
///
/// The projection remembers how many entries of its source it has consumed,
/// so a completed fetch only projects what it appended.
#[derive(Debug, Clone, Default)]
pub struct Projection {
    rows: Vec<Row>,
    shown: HashSet<ActorId>,
    consumed: usize,
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, actor: ActorId) -> bool {
        self.shown.contains(&actor)
    }

    /// Emit a row for every first-seen actor of `entries`, in order.
    /// Entries whose actor cannot be resolved are skipped.
    pub fn extend<'a, I, A>(&mut self, entries: I, directory: &A) -> usize
    where
        I: IntoIterator<Item = &'a Entry>,
        A: ActorDirectory + ?Sized,
    {
        let before = self.rows.len();
        for entry in entries {
            if self.shown.contains(&entry.actor) {
                continue;
            }
            let Some(actor) = directory.resolve(entry.actor) else {
                tracing::trace!(actor = %entry.actor, "Skipping unresolved actor");
                continue;
            };
            self.shown.insert(entry.actor);
            self.rows.push(Row {
                actor,
                tag: entry.tag.clone(),
            });
        }
        self.rows.len() - before
    }

    /// Project the entries of `source` not consumed yet.
    ///
    /// `source` must be the same append-only sequence between calls to
    /// `clear`.
    pub fn catch_up<A>(&mut self, source: &[Entry], directory: &A) -> usize
    where
        A: ActorDirectory + ?Sized,
    {
        let start = self.consumed.min(source.len());
        self.consumed = source.len();
        self.extend(&source[start..], directory)
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.shown.clear();
        self.consumed = 0;
    }
}

/// Side-effect-free projection of `entries` onto rows.
pub fn project<'a, I, A>(entries: I, directory: &A) -> Vec<Row>
where
    I: IntoIterator<Item = &'a Entry>,
    A: ActorDirectory + ?Sized,
{
    let mut projection = Projection::new();
    projection.extend(entries, directory);
    projection.rows
}
