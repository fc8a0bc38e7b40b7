use super::{TransformData, NEEDS_TRANSFORM};
use crate::entities::{Component, ComponentKind, ComponentStorage, Entity};
use glam::Vec3;
use rafter_lvl::defs::LightDef;

#[derive(Debug, Clone, PartialEq)]
pub struct LightData {
    pub ambient_color: Vec3,
    pub ambient_intensity: f32,
    pub diffuse_color: Vec3,
    pub diffuse_intensity: f32,
    pub specular_color: Vec3,
    pub specular_intensity: f32,
    pub specular_exponent: f32,
    pub shadow_intensity: f32,
}

impl Default for LightData {
    fn default() -> Self {
        Self {
            ambient_color: Vec3::ONE,
            ambient_intensity: 0.3,
            diffuse_color: Vec3::ONE,
            diffuse_intensity: 0.7,
            specular_color: Vec3::ONE,
            specular_intensity: 0.5,
            specular_exponent: 16.0,
            shadow_intensity: 0.5,
        }
    }
}

impl LightData {
    pub fn ambient_material(&self) -> Vec3 {
        self.ambient_color * self.ambient_intensity
    }

    pub fn diffuse_material(&self) -> Vec3 {
        self.diffuse_color * self.diffuse_intensity
    }

    pub fn specular_material(&self) -> Vec3 {
        self.specular_color * self.specular_intensity
    }
}

/// Scene lights. Only the main light, the first one with a transform, is used for rendering.
#[derive(Default)]
pub struct LightComponent {
    storage: ComponentStorage<LightData>,
}

impl LightComponent {
    pub fn main_light<'a>(
        &'a self,
        transforms: &'a ComponentStorage<TransformData>,
    ) -> Option<(Entity, &'a LightData, &'a TransformData)> {
        self.storage
            .iter()
            .find_map(|(entity, light)| Some((entity, light, transforms.get(entity)?)))
    }
}

impl Component for LightComponent {
    type Data = LightData;
    type Def = LightDef;

    const DEPENDENCIES: &'static [ComponentKind] = NEEDS_TRANSFORM;

    fn storage(&self) -> &ComponentStorage<LightData> {
        &self.storage
    }

    fn storage_mut(&mut self) -> &mut ComponentStorage<LightData> {
        &mut self.storage
    }

    fn default_data(&self) -> LightData {
        LightData::default()
    }

    fn data_from_def(&self, def: LightDef) -> LightData {
        LightData {
            ambient_color: def.ambient_color,
            ambient_intensity: def.ambient_intensity,
            diffuse_color: def.diffuse_color,
            diffuse_intensity: def.diffuse_intensity,
            specular_color: def.specular_color,
            specular_intensity: def.specular_intensity,
            specular_exponent: def.specular_exponent,
            shadow_intensity: def.shadow_intensity,
        }
    }

    fn def_from_data(&self, data: &LightData) -> LightDef {
        LightDef {
            ambient_color: data.ambient_color,
            ambient_intensity: data.ambient_intensity,
            diffuse_color: data.diffuse_color,
            diffuse_intensity: data.diffuse_intensity,
            specular_color: data.specular_color,
            specular_intensity: data.specular_intensity,
            specular_exponent: data.specular_exponent,
            shadow_intensity: data.shadow_intensity,
        }
    }
}
