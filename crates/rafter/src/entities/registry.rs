use super::{Component, Entity, UpdateContext};
use crate::components::*;
use log::*;
use rafter_lvl::{read_definition, write_definition, DefinitionError};
use rafter_utils::AnyResult;

/// Trait marking components registered in [`Components`]. Ties each type to its
/// [`ComponentKind`] and to its field.
///
/// Code outside `create_components!` must not implement it.
pub trait RegisteredComponent: Component {
    const KIND: ComponentKind;

    fn get(components: &Components) -> &Self;
    fn get_mut(components: &mut Components) -> &mut Self;
}

// ----------------------------------------------------------------------------
// Any new components must be added here. Update order is configured separately, see
// `UpdateOrder`.
// ----------------------------------------------------------------------------
crate::create_components! {
    components {
        Transform: TransformComponent,
        SimpleMovement: SimpleMovementComponent,
        RailDenizen: RailDenizenComponent,
        Player: PlayerComponent,
        RenderMesh: RenderMeshComponent,
        Physics: PhysicsComponent,
        Light: LightComponent,
    }
}
// ----------------------------------------------------------------------------

fn attach_default<T: RegisteredComponent>(components: &mut Components, entity: Entity) {
    let component = T::get_mut(components);
    let data = component.default_data();
    component.storage_mut().insert(entity, data);
}

fn remove_record<T: RegisteredComponent>(components: &mut Components, entity: Entity) -> bool {
    T::get_mut(components)
        .storage_mut()
        .remove(entity)
        .is_some()
}

fn import_record<T: RegisteredComponent>(
    components: &mut Components,
    entity: Entity,
    raw: &[u8],
) -> Result<(), DefinitionError> {
    let def = read_definition::<T::Def>(raw)?;
    let component = T::get_mut(components);
    let data = component.data_from_def(def);
    component.storage_mut().insert(entity, data);
    Ok(())
}

fn export_record<T: RegisteredComponent>(
    components: &Components,
    entity: Entity,
) -> Option<AnyResult<Vec<u8>>> {
    let component = T::get(components);
    let data = component.storage().get(entity)?;
    Some(write_definition(&component.def_from_data(data)))
}

impl Components {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: RegisteredComponent>(&self) -> &T {
        T::get(self)
    }

    pub fn get_mut<T: RegisteredComponent>(&mut self) -> &mut T {
        T::get_mut(self)
    }

    /// Number of records across all kinds.
    pub fn record_count(&self) -> usize {
        ComponentKind::ALL
            .iter()
            .map(|&kind| self.record_count_of(kind))
            .sum()
    }
}

impl ComponentKind {
    /// Logs the kind table, useful at startup.
    pub fn log_registry() {
        for kind in ComponentKind::ALL {
            let dependencies = kind
                .dependencies()
                .iter()
                .map(|dep| dep.name())
                .collect::<Vec<_>>();
            trace!(
                "component {kind} (`{}`), depends on {:?}",
                kind.node_name(),
                dependencies
            );
        }
    }
}
