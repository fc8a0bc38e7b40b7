use crate::entities::{Entity, Universe};

/// Well-known entities of the current level.
///
/// Handles are weak: every access re-validates them against the universe, and [`Self::prune`]
/// forgets the ones that died.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Services {
    player_entity: Option<Entity>,
    raft_entity: Option<Entity>,
}

impl Services {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player_entity(&self, universe: &Universe) -> Option<Entity> {
        self.player_entity.filter(|&e| universe.validate_entity(e))
    }

    pub fn set_player_entity(&mut self, entity: Option<Entity>) {
        self.player_entity = entity;
    }

    pub fn raft_entity(&self, universe: &Universe) -> Option<Entity> {
        self.raft_entity.filter(|&e| universe.validate_entity(e))
    }

    pub fn set_raft_entity(&mut self, entity: Option<Entity>) {
        self.raft_entity = entity;
    }

    /// Forgets handles of destroyed entities.
    pub fn prune(&mut self, universe: &Universe) {
        self.player_entity = self.player_entity(universe);
        self.raft_entity = self.raft_entity(universe);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
