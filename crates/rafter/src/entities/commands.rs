use super::Entity;
use rafter_lvl::EntityDef;

/// A structural change requested during an update.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Spawn(EntityDef),
    Despawn(Entity),
}

/// Commands queued by components during [`super::Universe::update_all`]. They're applied in
/// submission order, after the last component kind has updated.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    commands: Vec<Command>,
}

impl CommandQueue {
    pub fn spawn(&mut self, definition: EntityDef) {
        self.commands.push(Command::Spawn(definition));
    }

    pub fn despawn(&mut self, entity: Entity) {
        self.commands.push(Command::Despawn(entity));
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Empties the queue, returning the queued commands.
    pub fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }
}
