use super::{report_missing, NEEDS_TRANSFORM};
use crate::{
    entities::{Component, ComponentKind, ComponentStorage, Components, Entity, UpdateContext},
    render::api::RenderDevice,
};
use glam::{Mat4, Vec3, Vec4};
use itertools::Itertools;
use rafter_lvl::defs::PhysicsDef;
use smallvec::SmallVec;
use std::{f32::consts::TAU, time::Duration};

const DEBUG_CIRCLE_SEGMENTS: usize = 16;
const DYNAMIC_BODY_COLOR: Vec4 = Vec4::new(0.0, 1.0, 0.0, 1.0);
const KINEMATIC_BODY_COLOR: Vec4 = Vec4::new(0.0, 0.5, 1.0, 1.0);

/// A collision sphere. Kinematic bodies follow their transform, dynamic ones move it.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsData {
    pub radius: f32,
    /// Sphere's offset from the transform's position
    pub offset: Vec3,
    pub velocity: Vec3,
    pub gravity_multiplier: f32,
    pub kinematic: bool,

    /// World space center of the sphere, as of the last update
    pub body_position: Vec3,
}

impl Default for PhysicsData {
    fn default() -> Self {
        Self {
            radius: 1.0,
            offset: Vec3::ZERO,
            velocity: Vec3::ZERO,
            gravity_multiplier: 1.0,
            kinematic: true,
            body_position: Vec3::ZERO,
        }
    }
}

#[derive(Default)]
pub struct PhysicsComponent {
    storage: ComponentStorage<PhysicsData>,
}

impl PhysicsComponent {
    /// Draws every body as three axis aligned wireframe circles.
    pub fn debug_draw_world(&self, device: &mut dyn RenderDevice, camera_transform: Mat4) {
        device.set_model_view_projection(camera_transform);

        for (_, body) in self.storage.iter() {
            let color = if body.kinematic {
                KINEMATIC_BODY_COLOR
            } else {
                DYNAMIC_BODY_COLOR
            };

            for (u, v) in [(Vec3::X, Vec3::Y), (Vec3::X, Vec3::Z), (Vec3::Y, Vec3::Z)] {
                let circle = (0..=DEBUG_CIRCLE_SEGMENTS).map(|i| {
                    let angle = TAU * i as f32 / DEBUG_CIRCLE_SEGMENTS as f32;
                    body.body_position + (u * angle.cos() + v * angle.sin()) * body.radius
                });
                for (from, to) in circle.tuple_windows() {
                    device.draw_debug_line(from, to, color);
                }
            }
        }
    }
}

impl Component for PhysicsComponent {
    type Data = PhysicsData;
    type Def = PhysicsDef;

    const DEPENDENCIES: &'static [ComponentKind] = NEEDS_TRANSFORM;

    fn storage(&self) -> &ComponentStorage<PhysicsData> {
        &self.storage
    }

    fn storage_mut(&mut self) -> &mut ComponentStorage<PhysicsData> {
        &mut self.storage
    }

    fn default_data(&self) -> PhysicsData {
        PhysicsData::default()
    }

    fn data_from_def(&self, def: PhysicsDef) -> PhysicsData {
        PhysicsData {
            radius: def.radius,
            offset: def.offset,
            velocity: def.velocity,
            gravity_multiplier: def.gravity_multiplier,
            kinematic: def.kinematic,
            body_position: Vec3::ZERO,
        }
    }

    fn def_from_data(&self, data: &PhysicsData) -> PhysicsDef {
        PhysicsDef {
            radius: data.radius,
            offset: data.offset,
            velocity: data.velocity,
            gravity_multiplier: data.gravity_multiplier,
            kinematic: data.kinematic,
        }
    }

    fn update_all_entities(
        components: &mut Components,
        ctx: &mut UpdateContext<'_>,
        delta: Duration,
    ) {
        let Components {
            physics, transform, ..
        } = components;

        let dt = delta.as_secs_f32();
        let transforms = transform.storage_mut();
        let mut missing = SmallVec::<[Entity; 4]>::new();

        for (entity, body) in physics.storage.iter_mut() {
            let Some(transform) = transforms.get_mut(entity) else {
                missing.push(entity);
                continue;
            };

            if !body.kinematic {
                body.velocity += ctx.gravity * body.gravity_multiplier * dt;
                transform.translate(body.velocity * dt);
            }
            body.body_position = transform.position + body.offset;
        }

        report_missing(
            &mut physics.storage,
            missing,
            ComponentKind::Physics,
            ComponentKind::Transform,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::{HeadlessDevice, RenderCommand};
    use std::num::NonZeroU32;

    #[test]
    fn debug_circles() {
        let mut physics = PhysicsComponent::default();
        physics.storage.insert(
            Entity {
                index: 0,
                generation: NonZeroU32::MIN,
            },
            PhysicsData {
                radius: 2.0,
                body_position: Vec3::new(1.0, 1.0, 1.0),
                ..Default::default()
            },
        );

        let mut device = HeadlessDevice::new();
        physics.debug_draw_world(&mut device, Mat4::IDENTITY);

        let lines = device
            .commands()
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawDebugLine(from, to, _) => Some((*from, *to)),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(lines.len(), 3 * DEBUG_CIRCLE_SEGMENTS);
        for (from, to) in lines {
            assert!((from.distance(Vec3::ONE) - 2.0).abs() < 1e-4);
            assert!((to.distance(Vec3::ONE) - 2.0).abs() < 1e-4);
        }
    }
}
