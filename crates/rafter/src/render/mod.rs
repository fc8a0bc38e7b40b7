//! World rendering: a shadow pass followed by the main pass, drawn through the host's
//! [`api::RenderDevice`] and [`api::AssetManager`].

use ahash::AHashSet;
use api::{AssetManager, RenderDevice, ShaderHandle};
use glam::{Mat4, Vec3};
use log::*;
use std::fmt::Display;

pub mod api;
pub mod headless;

mod camera;
pub use camera::*;
mod defines;
pub use defines::*;
mod world_renderer;
pub use world_renderer::*;

/// Which meshes a pass draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawSelection {
    Visible,
    ShadowCasters,
}

/// State shared by every draw call of a render pass.
pub struct DrawContext<'a> {
    pub device: &'a mut dyn RenderDevice,
    pub assets: &'a mut dyn AssetManager,
    /// World to clip space transformation of the pass camera
    pub camera_transform: Mat4,
    pub eye: Vec3,
    pub selection: DrawSelection,
    /// Used instead of each mesh's own shader, by the depth pass
    pub shader_override: Option<ShaderHandle>,
    /// Resources already reported as missing
    pub reported: &'a mut AHashSet<String>,
}

impl DrawContext<'_> {
    /// Logs a warning about a resource, once for the renderer's lifetime.
    pub fn warn_once(&mut self, resource: &str, message: impl Display) {
        if !self.reported.contains(resource) {
            self.reported.insert(resource.to_string());
            warn!("{message}");
        }
    }
}
