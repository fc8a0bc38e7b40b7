//! Game configuration, loaded from a TOML file. Every field is optional.

use crate::{
    entities::{UpdateOrder, UpdateOrderError},
    input::InputConfig,
    render::{RenderingOptions, ShaderDefines},
};
use glam::{Vec3, Vec4};
use rafter_utils::{math::AngleExt, AnyResult, AnyhowResultExt};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rendering: RenderingConfig,
    pub river: RiverConfig,
    pub input: InputSettings,
    pub world: WorldConfig,
    pub rendering_options: RenderingOptionsConfig,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> AnyResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .otherwise(format!("couldn't read config file `{}`", path.display()))?;
        Self::from_toml(&text).otherwise(format!("invalid config file `{}`", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn input_config(&self) -> InputConfig {
        InputConfig {
            mouse_sensitivity: self.input.mouse_sensitivity,
            invert_y: self.input.invert_y,
            max_pitch: self.input.max_pitch.degrees(),
        }
    }

    /// The configured update order, or the default one if none is set.
    pub fn update_order(&self) -> Result<UpdateOrder, UpdateOrderError> {
        match &self.world.update_order {
            Some(names) => UpdateOrder::from_names(names.as_slice()),
            None => Ok(UpdateOrder::default()),
        }
    }

    pub fn gravity(&self) -> Vec3 {
        Vec3::from(self.world.gravity)
    }

    pub fn rendering_options(&self) -> RenderingOptions {
        let options = &self.rendering_options;
        let mut enabled = ShaderDefines::empty();
        enabled.set(ShaderDefines::PHONG_SHADING, options.phong_shading);
        enabled.set(ShaderDefines::SPECULAR_EFFECT, options.specular_effect);
        enabled.set(ShaderDefines::SHADOW_EFFECT, options.shadow_effect);
        enabled.set(ShaderDefines::NORMALS, options.normals);
        RenderingOptions::new(enabled)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderingConfig {
    /// Main camera's vertical field of view, in degrees
    pub viewport_angle: f32,
    pub near_plane: f32,
    pub far_plane: f32,

    /// Width and height of the shadow map, in texels
    pub shadow_map_resolution: u32,
    pub shadow_map_zoom: f32,
    /// How far ahead of the main camera the light camera aims
    pub shadow_map_offset: f32,
    /// Light camera's field of view before zooming, in degrees
    pub shadow_map_viewport_angle: f32,
    pub shadow_map_bias: f32,

    pub fog_roll_in_dist: f32,
    pub fog_max_dist: f32,
    pub fog_color: [f32; 4],
    pub fog_max_saturation: f32,

    pub debug_show_shadow_map: bool,
    pub skip_render_meshes: bool,
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            viewport_angle: 60.0,
            near_plane: 0.1,
            far_plane: 500.0,
            shadow_map_resolution: 1024,
            shadow_map_zoom: 1.0,
            shadow_map_offset: 20.0,
            shadow_map_viewport_angle: 45.0,
            shadow_map_bias: 0.007,
            fog_roll_in_dist: 30.0,
            fog_max_dist: 120.0,
            fog_color: [0.72, 0.83, 0.92, 1.0],
            fog_max_saturation: 0.85,
            debug_show_shadow_map: false,
            skip_render_meshes: false,
        }
    }
}

impl RenderingConfig {
    pub fn fog_color(&self) -> Vec4 {
        Vec4::from(self.fog_color)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RiverConfig {
    pub texture_repeats: f32,
    /// River texture scroll speed, in texture lengths per second
    pub speed: f32,
}

impl Default for RiverConfig {
    fn default() -> Self {
        Self {
            texture_repeats: 6.0,
            speed: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    pub mouse_sensitivity: f32,
    pub invert_y: bool,
    /// In degrees
    pub max_pitch: f32,
    /// Whether the camera looks where the player aims. Touch devices keep it looking ahead.
    pub mouse_look: bool,
}

impl Default for InputSettings {
    fn default() -> Self {
        let defaults = InputConfig::default();
        Self {
            mouse_sensitivity: defaults.mouse_sensitivity,
            invert_y: defaults.invert_y,
            max_pitch: defaults.max_pitch.to_degrees(),
            mouse_look: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Component kind names, see [`UpdateOrder::from_names`]
    pub update_order: Option<Vec<String>>,
    pub gravity: [f32; 3],
    pub draw_debug_physics: bool,
    /// Height of the main camera above the player
    pub camera_height: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            update_order: None,
            gravity: [0.0, 0.0, -9.81],
            draw_debug_physics: false,
            camera_height: 1.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderingOptionsConfig {
    pub phong_shading: bool,
    pub specular_effect: bool,
    pub shadow_effect: bool,
    pub normals: bool,
}

impl Default for RenderingOptionsConfig {
    fn default() -> Self {
        Self {
            phong_shading: true,
            specular_effect: true,
            shadow_effect: true,
            normals: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ComponentKind;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.update_order(), Ok(UpdateOrder::default()));
        assert!(config.rendering_options().is_enabled(ShaderDefines::all()));
    }

    #[test]
    fn partial_sections() {
        let config = Config::from_toml(
            r#"
            [rendering]
            shadow_map_resolution = 2048

            [rendering_options]
            shadow_effect = false

            [world]
            update_order = ["Transform", "Player", "RailDenizen", "SimpleMovement", "Physics", "Light", "RenderMesh"]
            "#,
        )
        .unwrap();

        assert_eq!(config.rendering.shadow_map_resolution, 2048);
        assert_eq!(config.rendering.shadow_map_zoom, 1.0);
        assert!(!config
            .rendering_options()
            .is_enabled(ShaderDefines::SHADOW_EFFECT));
        assert_eq!(
            config.update_order().unwrap().kinds()[0],
            ComponentKind::Transform
        );
    }

    #[test]
    fn bad_update_order() {
        let config = Config::from_toml("[world]\nupdate_order = [\"Transform\"]").unwrap();
        assert!(config.update_order().is_err());
    }
}
