//! A small built-in level, used by the runner when no level file is given.

use crate::render::headless::HeadlessAssets;
use glam::{Quat, Vec3, Vec4};
use rafter_lvl::{
    defs::{
        LightDef, PhysicsDef, PlayerDef, RailDenizenDef, RenderMeshDef, SimpleMovementDef,
        TransformDef,
    },
    EntityDef, LevelDef, RailDef,
};
use rafter_utils::AnyResult;

pub const DEMO_RAIL: &str = "river";

pub fn demo_rail() -> RailDef {
    RailDef {
        name: Some(String::from("Demo river")),
        total_time: 90.0,
        reliable_distance: 8.0,
        points: vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 40.0, 0.0),
            Vec3::new(20.0, 65.0, 0.0),
            Vec3::new(45.0, 65.0, 0.0),
            Vec3::new(65.0, 40.0, 0.0),
            Vec3::new(65.0, 0.0, 0.0),
            Vec3::new(30.0, -25.0, 0.0),
        ],
        wrap: true,
    }
}

fn transform(position: Vec3) -> TransformDef {
    TransformDef {
        position,
        orientation: Quat::IDENTITY,
        scale: Vec3::ONE,
    }
}

fn mesh(mesh: &str, shader: &str) -> RenderMeshDef {
    RenderMeshDef {
        mesh: mesh.to_string(),
        shader: shader.to_string(),
        transparent: false,
        visible: true,
        casts_shadow: true,
        tint: Vec4::ONE,
    }
}

fn rider(attach_offset: Vec3) -> RailDenizenDef {
    RailDenizenDef {
        rail_name: DEMO_RAIL.to_string(),
        distance: 0.0,
        speed: 1.0,
        attach_offset,
        enabled: true,
        timed: true,
        facing: Vec3::Y,
    }
}

pub fn demo_level() -> AnyResult<LevelDef> {
    let mut entities = vec![];

    entities.push(
        EntityDef::new()
            .with(&transform(Vec3::new(30.0, 20.0, 80.0)))?
            .with(&LightDef {
                ambient_color: Vec3::new(0.6, 0.7, 0.9),
                ambient_intensity: 0.35,
                diffuse_color: Vec3::new(1.0, 0.95, 0.85),
                diffuse_intensity: 0.8,
                specular_color: Vec3::ONE,
                specular_intensity: 0.4,
                specular_exponent: 24.0,
                shadow_intensity: 0.6,
            })?,
    );

    // The raft, and the player standing on it
    entities.push(
        EntityDef::new()
            .with(&transform(Vec3::ZERO))?
            .with(&rider(Vec3::new(0.0, 0.0, 0.3)))?
            .with(&mesh("meshes/raft", "shaders/textured_lit"))?
            .with(&PhysicsDef {
                radius: 2.5,
                offset: Vec3::ZERO,
                velocity: Vec3::ZERO,
                gravity_multiplier: 0.0,
                kinematic: true,
            })?,
    );
    entities.push(
        EntityDef::new()
            .with(&transform(Vec3::ZERO))?
            .with(&rider(Vec3::new(0.0, 0.0, 1.0)))?
            .with(&PlayerDef {
                yaw: 0.0,
                pitch: 0.0,
                projectile_speed: 25.0,
                projectile_mesh: String::from("meshes/projectile"),
                projectile_shader: String::from("shaders/textured_lit"),
                fire_cooldown: 0.4,
                projectile_lifetime: 3.0,
            })?,
    );

    entities.push(
        EntityDef::new()
            .with(&TransformDef {
                position: Vec3::new(32.5, 20.0, -0.2),
                orientation: Quat::IDENTITY,
                scale: Vec3::new(80.0, 100.0, 1.0),
            })?
            .with(&RenderMeshDef {
                transparent: true,
                casts_shadow: false,
                tint: Vec4::new(0.4, 0.6, 0.8, 0.8),
                ..mesh("meshes/river", "shaders/water")
            })?,
    );

    for (x, y) in [(-8.0, 10.0), (10.0, 30.0), (50.0, 20.0), (75.0, 55.0), (30.0, 80.0)] {
        entities.push(
            EntityDef::new()
                .with(&transform(Vec3::new(x, y, 0.0)))?
                .with(&mesh("meshes/tree", "shaders/textured_lit"))?,
        );
    }

    // A crate tossed into the river
    entities.push(
        EntityDef::new()
            .with(&transform(Vec3::new(5.0, 15.0, 10.0)))?
            .with(&mesh("meshes/cube", "shaders/textured_lit"))?
            .with(&SimpleMovementDef {
                velocity: Vec3::new(0.5, 0.0, 0.0),
                lifetime: 0.0,
            })?
            .with(&PhysicsDef {
                radius: 0.5,
                offset: Vec3::ZERO,
                velocity: Vec3::new(0.0, 2.0, 3.0),
                gravity_multiplier: 0.2,
                kinematic: false,
            })?,
    );

    Ok(LevelDef { entities })
}

/// Headless assets with every mesh the demo level uses.
pub fn demo_assets() -> HeadlessAssets {
    let mut assets = HeadlessAssets::with_stock_shaders();
    for mesh in ["meshes/raft", "meshes/projectile", "meshes/river", "meshes/tree"] {
        assets.add_mesh(mesh);
    }
    assets
}
