//! The component kinds registered in [`crate::entities::Components`].

use crate::entities::{ComponentKind, ComponentStorage, Entity};

mod light;
pub use light::*;
mod physics;
pub use physics::*;
mod player;
pub use player::*;
mod rail_denizen;
pub use rail_denizen::*;
mod render_mesh;
pub use render_mesh::*;
mod simple_movement;
pub use simple_movement::*;
mod transform;
pub use transform::*;

/// Dependency every kind but [`TransformComponent`] declares.
const NEEDS_TRANSFORM: &[ComponentKind] = &[ComponentKind::Transform];

/// Logs entities that lost a component they depend on, once per entity.
fn report_missing<T>(
    storage: &mut ComponentStorage<T>,
    missing: impl IntoIterator<Item = Entity>,
    kind: ComponentKind,
    dependency: ComponentKind,
) {
    for entity in missing {
        storage.warn_once(entity, format!("{kind} is missing its {dependency}, skipping"));
    }
}
