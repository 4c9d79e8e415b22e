//! In-memory actor directory.

use roster_core::{Actor, ActorDirectory, ActorId};
use std::collections::HashMap;

/// Actor directory backed by a hash map, filled from the actors each page
/// resolves plus whatever the caller already knows.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    actors: HashMap<ActorId, Actor>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_actors(actors: impl IntoIterator<Item = Actor>) -> Self {
        Self {
            actors: actors.into_iter().map(|actor| (actor.id, actor)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

impl ActorDirectory for InMemoryDirectory {
    fn resolve(&self, id: ActorId) -> Option<Actor> {
        self.actors.get(&id).cloned()
    }

    fn absorb(&mut self, actors: &[Actor]) {
        for actor in actors {
            self.actors.insert(actor.id, actor.clone());
        }
    }
}
