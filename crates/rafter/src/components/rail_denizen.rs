use super::{report_missing, FORWARD, NEEDS_TRANSFORM};
use crate::entities::{
    Component, ComponentKind, ComponentStorage, Components, Entity, UpdateContext,
};
use glam::{Quat, Vec3};
use rafter_lvl::defs::RailDenizenDef;
use smallvec::SmallVec;
use std::time::Duration;

/// Attaches an entity to a rail, moving it along at a set speed.
#[derive(Debug, Clone, PartialEq)]
pub struct RailDenizenData {
    pub rail_name: String,
    /// Distance travelled from the start of the rail
    pub distance: f32,
    /// Units per second, or a multiplier of the rail's natural speed if `timed` is set.
    /// Negative values travel backwards.
    pub speed: f32,
    /// Added to the rail position, in world space
    pub attach_offset: Vec3,
    pub enabled: bool,
    pub timed: bool,

    /// Last known facing, kept while the rail can't provide one
    pub facing: Vec3,
}

impl Default for RailDenizenData {
    fn default() -> Self {
        Self {
            rail_name: String::new(),
            distance: 0.0,
            speed: 0.0,
            attach_offset: Vec3::ZERO,
            enabled: true,
            timed: false,
            facing: FORWARD,
        }
    }
}

#[derive(Default)]
pub struct RailDenizenComponent {
    storage: ComponentStorage<RailDenizenData>,
}

impl Component for RailDenizenComponent {
    type Data = RailDenizenData;
    type Def = RailDenizenDef;

    const DEPENDENCIES: &'static [ComponentKind] = NEEDS_TRANSFORM;

    fn storage(&self) -> &ComponentStorage<RailDenizenData> {
        &self.storage
    }

    fn storage_mut(&mut self) -> &mut ComponentStorage<RailDenizenData> {
        &mut self.storage
    }

    fn default_data(&self) -> RailDenizenData {
        RailDenizenData::default()
    }

    fn data_from_def(&self, def: RailDenizenDef) -> RailDenizenData {
        RailDenizenData {
            rail_name: def.rail_name,
            distance: def.distance,
            speed: def.speed,
            attach_offset: def.attach_offset,
            enabled: def.enabled,
            timed: def.timed,
            facing: def.facing.try_normalize().unwrap_or(FORWARD),
        }
    }

    fn def_from_data(&self, data: &RailDenizenData) -> RailDenizenDef {
        RailDenizenDef {
            rail_name: data.rail_name.clone(),
            distance: data.distance,
            speed: data.speed,
            attach_offset: data.attach_offset,
            enabled: data.enabled,
            timed: data.timed,
            facing: data.facing,
        }
    }

    fn update_all_entities(
        components: &mut Components,
        ctx: &mut UpdateContext<'_>,
        delta: Duration,
    ) {
        let Components {
            rail_denizen,
            transform,
            ..
        } = components;

        let dt = delta.as_secs_f32();
        let transforms = transform.storage_mut();
        let mut unknown_rails = SmallVec::<[Entity; 4]>::new();
        let mut missing = SmallVec::<[Entity; 4]>::new();

        for (entity, denizen) in rail_denizen.storage.iter_mut() {
            if !denizen.enabled {
                continue;
            }

            let Some(rail) = ctx.rails.get_rail(&denizen.rail_name) else {
                unknown_rails.push(entity);
                continue;
            };
            let Some(transform) = transforms.get_mut(entity) else {
                missing.push(entity);
                continue;
            };

            let speed = if denizen.timed {
                denizen.speed * rail.natural_speed()
            } else {
                denizen.speed
            };
            denizen.distance = rail.normalize_distance(denizen.distance + speed * dt);

            let sample = rail.sample(denizen.distance);
            if let Some(facing) = sample.facing {
                denizen.facing = facing;
            }

            transform.position = sample.position + denizen.attach_offset;
            transform.orientation = Quat::from_rotation_arc(FORWARD, denizen.facing);
        }

        let storage = &mut rail_denizen.storage;
        for entity in unknown_rails {
            let rail_name = storage
                .get(entity)
                .map(|d| d.rail_name.clone())
                .unwrap_or_default();
            storage.warn_once(entity, format!("rail `{rail_name}` isn't loaded, skipping"));
        }
        report_missing(
            storage,
            missing,
            ComponentKind::RailDenizen,
            ComponentKind::Transform,
        );
    }
}
