//! The Rafter entity component registry
//!
//! ## Implementation details
//! The set of component kinds is closed. [`crate::create_components!`] (invoked in
//! `entities/registry.rs`) generates the [`ComponentKind`] enum, the [`KindSet`] bit set and the
//! [`Components`] struct holding one instance of every component, so that dispatch by kind is
//! a plain `match` and components can borrow each other's storages field by field.
//!
//! Components never create or destroy entities during an update. They push commands into
//! [`UpdateContext::commands`], which the [`Universe`] applies once every kind has updated, so
//! new entities show up in the next frame's update.

use crate::{
    input::{InputConfig, InputSnapshot},
    rails::RailManager,
};
use glam::Vec3;
use rafter_lvl::Definition;
use std::{fmt, num::NonZeroU32, time::Duration};

pub mod macros;

mod commands;
pub use commands::*;
mod order;
pub use order::*;
mod registry;
pub use registry::*;
mod storage;
pub use storage::*;
mod universe;
pub use universe::*;

/// An entity handle. It's very cheap to copy (2x32-bit values)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    /// The entity's index within the universe entity set.
    pub index: u32,
    /// The entity's generation number. It's unique across the entire universe.
    pub generation: NonZeroU32,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// A single component kind, owning the data records of every entity that has it attached.
///
/// Any new component implementations must be registered in `entities/registry.rs`.
pub trait Component: Default + 'static {
    /// Per-entity record
    type Data: Clone + fmt::Debug;
    /// Serialized form of [`Self::Data`]
    type Def: Definition;

    /// Kinds that get attached to an entity before this one.
    const DEPENDENCIES: &'static [ComponentKind] = &[];

    fn storage(&self) -> &ComponentStorage<Self::Data>;
    fn storage_mut(&mut self) -> &mut ComponentStorage<Self::Data>;

    /// Record used when the component is attached without a definition.
    fn default_data(&self) -> Self::Data;
    fn data_from_def(&self, def: Self::Def) -> Self::Data;
    fn def_from_data(&self, data: &Self::Data) -> Self::Def;

    /// Updates every entity of this kind. Other kinds are reachable through `components`, with
    /// the data they wrote earlier in the update order.
    fn update_all_entities(
        _components: &mut Components,
        _ctx: &mut UpdateContext<'_>,
        _delta: Duration,
    ) {
    }
}

/// Everything an update pass can read besides the components themselves.
pub struct UpdateContext<'a> {
    pub rails: &'a RailManager,
    pub input: &'a InputSnapshot,
    pub input_config: &'a InputConfig,
    /// The one player entity that reacts to input
    pub active_player: Option<Entity>,
    pub gravity: Vec3,
    /// Deferred spawns and despawns, applied after the last kind has updated
    pub commands: CommandQueue,
}

impl<'a> UpdateContext<'a> {
    pub fn new(
        rails: &'a RailManager,
        input: &'a InputSnapshot,
        input_config: &'a InputConfig,
    ) -> Self {
        Self {
            rails,
            input,
            input_config,
            active_player: None,
            gravity: Vec3::new(0.0, 0.0, -9.81),
            commands: CommandQueue::default(),
        }
    }
}
