use super::{report_missing, FORWARD, NEEDS_TRANSFORM};
use crate::entities::{
    Component, ComponentKind, ComponentStorage, Components, Entity, UpdateContext,
};
use glam::{Quat, Vec3, Vec4};
use log::*;
use rafter_lvl::{
    defs::{PlayerDef, RenderMeshDef, SimpleMovementDef, TransformDef},
    EntityDef,
};
use rafter_utils::AnyResult;
use smallvec::SmallVec;
use std::time::Duration;

/// How far in front of the player projectiles appear.
pub const PROJECTILE_SPAWN_DISTANCE: f32 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerData {
    /// Rotation about +Z, in radians
    pub yaw: f32,
    /// Rotation above the horizon, in radians
    pub pitch: f32,
    pub projectile_speed: f32,
    pub projectile_mesh: String,
    pub projectile_shader: String,
    /// Minimum amount of seconds between two shots
    pub fire_cooldown: f32,
    /// Seconds before a projectile despawns
    pub projectile_lifetime: f32,

    pub since_last_shot: f32,
}

impl Default for PlayerData {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            projectile_speed: 20.0,
            projectile_mesh: String::from("meshes/projectile"),
            projectile_shader: String::from("shaders/textured"),
            fire_cooldown: 0.5,
            projectile_lifetime: 3.0,
            since_last_shot: 0.5,
        }
    }
}

impl PlayerData {
    /// Unit vector the player aims at.
    pub fn aim_direction(&self) -> Vec3 {
        Quat::from_rotation_z(self.yaw) * Quat::from_rotation_x(self.pitch) * FORWARD
    }

    pub fn can_fire(&self) -> bool {
        self.since_last_shot >= self.fire_cooldown
    }

    /// Builds the definition of a projectile launched from `origin`.
    pub fn projectile(&self, origin: Vec3) -> AnyResult<EntityDef> {
        let aim = self.aim_direction();

        EntityDef::new()
            .with(&TransformDef {
                position: origin + aim * PROJECTILE_SPAWN_DISTANCE,
                orientation: Quat::from_rotation_arc(FORWARD, aim),
                scale: Vec3::ONE,
            })?
            .with(&SimpleMovementDef {
                velocity: aim * self.projectile_speed,
                // Never let a projectile live forever
                lifetime: self.projectile_lifetime.max(f32::MIN_POSITIVE),
            })?
            .with(&RenderMeshDef {
                mesh: self.projectile_mesh.clone(),
                shader: self.projectile_shader.clone(),
                transparent: false,
                visible: true,
                casts_shadow: true,
                tint: Vec4::ONE,
            })
    }
}

#[derive(Default)]
pub struct PlayerComponent {
    storage: ComponentStorage<PlayerData>,
}

impl Component for PlayerComponent {
    type Data = PlayerData;
    type Def = PlayerDef;

    const DEPENDENCIES: &'static [ComponentKind] = NEEDS_TRANSFORM;

    fn storage(&self) -> &ComponentStorage<PlayerData> {
        &self.storage
    }

    fn storage_mut(&mut self) -> &mut ComponentStorage<PlayerData> {
        &mut self.storage
    }

    fn default_data(&self) -> PlayerData {
        PlayerData::default()
    }

    fn data_from_def(&self, def: PlayerDef) -> PlayerData {
        PlayerData {
            yaw: def.yaw,
            pitch: def.pitch,
            projectile_speed: def.projectile_speed,
            projectile_mesh: def.projectile_mesh,
            projectile_shader: def.projectile_shader,
            fire_cooldown: def.fire_cooldown,
            projectile_lifetime: def.projectile_lifetime,
            // Freshly loaded players can shoot right away
            since_last_shot: def.fire_cooldown,
        }
    }

    fn def_from_data(&self, data: &PlayerData) -> PlayerDef {
        PlayerDef {
            yaw: data.yaw,
            pitch: data.pitch,
            projectile_speed: data.projectile_speed,
            projectile_mesh: data.projectile_mesh.clone(),
            projectile_shader: data.projectile_shader.clone(),
            fire_cooldown: data.fire_cooldown,
            projectile_lifetime: data.projectile_lifetime,
        }
    }

    fn update_all_entities(
        components: &mut Components,
        ctx: &mut UpdateContext<'_>,
        delta: Duration,
    ) {
        let Components {
            player, transform, ..
        } = components;

        let dt = delta.as_secs_f32();
        let transforms = transform.storage();
        let mut missing = SmallVec::<[Entity; 2]>::new();

        for (entity, data) in player.storage.iter_mut() {
            data.since_last_shot += dt;

            if ctx.active_player != Some(entity) {
                continue;
            }

            (data.yaw, data.pitch) = ctx
                .input_config
                .apply_look(data.yaw, data.pitch, ctx.input.look_delta);

            if !ctx.input.fire || !data.can_fire() {
                continue;
            }

            let Some(transform) = transforms.get(entity) else {
                missing.push(entity);
                continue;
            };

            match data.projectile(transform.position) {
                Ok(projectile) => {
                    ctx.commands.spawn(projectile);
                    data.since_last_shot = 0.0;
                }
                Err(error) => error!("{entity} couldn't fire: {error:#}"),
            }
        }

        report_missing(
            &mut player.storage,
            missing,
            ComponentKind::Player,
            ComponentKind::Transform,
        );
    }
}
