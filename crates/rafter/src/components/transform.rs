use crate::entities::{Component, ComponentStorage, Components, Entity, UpdateContext};
use glam::{Mat4, Quat, Vec3};
use rafter_lvl::defs::TransformDef;
use smallvec::SmallVec;
use std::time::Duration;

/// Axis entities face when their orientation is the identity. Z points up.
pub const FORWARD: Vec3 = Vec3::Y;

#[derive(Debug, Clone, PartialEq)]
pub struct TransformData {
    pub position: Vec3,
    pub orientation: Quat,
    pub scale: Vec3,
}

impl Default for TransformData {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl TransformData {
    /// Object to world space transformation.
    #[inline]
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.orientation, self.position)
    }

    /// Direction the entity faces.
    #[inline]
    pub fn facing(&self) -> Vec3 {
        self.orientation * FORWARD
    }

    /// Adds the provided vector to this transform's position.
    #[inline]
    pub fn translate(&mut self, v: Vec3) {
        self.position += v;
    }
}

#[derive(Default)]
pub struct TransformComponent {
    storage: ComponentStorage<TransformData>,
}

impl Component for TransformComponent {
    type Data = TransformData;
    type Def = TransformDef;

    fn storage(&self) -> &ComponentStorage<TransformData> {
        &self.storage
    }

    fn storage_mut(&mut self) -> &mut ComponentStorage<TransformData> {
        &mut self.storage
    }

    fn default_data(&self) -> TransformData {
        TransformData::default()
    }

    fn data_from_def(&self, def: TransformDef) -> TransformData {
        TransformData {
            position: def.position,
            orientation: def.orientation,
            scale: def.scale,
        }
    }

    fn def_from_data(&self, data: &TransformData) -> TransformDef {
        TransformDef {
            position: data.position,
            orientation: data.orientation,
            scale: data.scale,
        }
    }

    /// Keeps orientations unit length, as other kinds integrate into them.
    fn update_all_entities(
        components: &mut Components,
        _ctx: &mut UpdateContext<'_>,
        _delta: Duration,
    ) {
        let storage = &mut components.transform.storage;
        let mut degenerate = SmallVec::<[Entity; 4]>::new();

        for (entity, transform) in storage.iter_mut() {
            let length = transform.orientation.length();
            if length.is_finite() && length > f32::EPSILON {
                transform.orientation = transform.orientation / length;
            } else {
                transform.orientation = Quat::IDENTITY;
                degenerate.push(entity);
            }
        }

        for entity in degenerate {
            storage.warn_once(entity, "degenerate orientation, reset to identity");
        }
    }
}
