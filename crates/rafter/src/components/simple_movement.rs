use super::{report_missing, NEEDS_TRANSFORM};
use crate::entities::{
    Component, ComponentKind, ComponentStorage, Components, Entity, UpdateContext,
};
use glam::Vec3;
use rafter_lvl::defs::SimpleMovementDef;
use smallvec::SmallVec;
use std::time::Duration;

/// Moves entities at a constant velocity, in world units per second.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimpleMovementData {
    pub velocity: Vec3,
    /// Seconds left before the entity is despawned, `None` keeps it forever
    pub lifetime: Option<f32>,
}

#[derive(Default)]
pub struct SimpleMovementComponent {
    storage: ComponentStorage<SimpleMovementData>,
}

impl Component for SimpleMovementComponent {
    type Data = SimpleMovementData;
    type Def = SimpleMovementDef;

    const DEPENDENCIES: &'static [ComponentKind] = NEEDS_TRANSFORM;

    fn storage(&self) -> &ComponentStorage<SimpleMovementData> {
        &self.storage
    }

    fn storage_mut(&mut self) -> &mut ComponentStorage<SimpleMovementData> {
        &mut self.storage
    }

    fn default_data(&self) -> SimpleMovementData {
        SimpleMovementData::default()
    }

    fn data_from_def(&self, def: SimpleMovementDef) -> SimpleMovementData {
        SimpleMovementData {
            velocity: def.velocity,
            lifetime: (def.lifetime > 0.0).then_some(def.lifetime),
        }
    }

    fn def_from_data(&self, data: &SimpleMovementData) -> SimpleMovementDef {
        SimpleMovementDef {
            velocity: data.velocity,
            // An expired lifetime must not read back as "forever"
            lifetime: data.lifetime.map_or(0.0, |left| left.max(f32::MIN_POSITIVE)),
        }
    }

    fn update_all_entities(
        components: &mut Components,
        ctx: &mut UpdateContext<'_>,
        delta: Duration,
    ) {
        let Components {
            simple_movement,
            transform,
            ..
        } = components;

        let dt = delta.as_secs_f32();
        let transforms = transform.storage_mut();
        let mut missing = SmallVec::<[Entity; 4]>::new();

        for (entity, movement) in simple_movement.storage.iter_mut() {
            match transforms.get_mut(entity) {
                Some(transform) => transform.translate(movement.velocity * dt),
                None => missing.push(entity),
            }

            if let Some(left) = &mut movement.lifetime {
                *left -= dt;
                if *left <= 0.0 {
                    ctx.commands.despawn(entity);
                }
            }
        }

        report_missing(
            &mut simple_movement.storage,
            missing,
            ComponentKind::SimpleMovement,
            ComponentKind::Transform,
        );
    }
}
