//! Interfaces of the graphics backend and asset cache Rafter renders through.
//!
//! Both are provided by the host application. [`super::headless`] has implementations that
//! only record what they were asked to do.

use glam::{Mat4, UVec2, Vec3, Vec4};
use rafter_utils::AnyResult;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        Self::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        Self::Vec4(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self {
        Self::Mat4(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    Screen,
    /// The off-screen depth target written by the shadow pass
    ShadowMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthFunction {
    Disabled,
    Less,
    LessEqual,
    Always,
}

/// A compiled shader program, along with the preprocessor defines it was compiled with.
pub trait Shader {
    fn name(&self) -> &str;
    fn has_define(&self, define: &str) -> bool;
    fn set_uniform(&mut self, name: &str, value: UniformValue);
    /// Recompiles the shader if its defines changed. Returns whether it was recompiled.
    fn reload_if_dirty(&mut self) -> AnyResult<bool>;
    fn is_ready(&self) -> bool;
}

pub trait AssetManager {
    fn find_shader(&self, name: &str) -> Option<ShaderHandle>;
    fn shader(&self, handle: ShaderHandle) -> Option<&dyn Shader>;
    fn shader_mut(&mut self, handle: ShaderHandle) -> Option<&mut dyn Shader>;

    /// Changes the defines every shader is compiled with. Shaders recompile on their next
    /// [`Shader::reload_if_dirty`].
    fn reset_global_shader_defines(&mut self, add: &[&str], omit: &[&str]);
    fn for_each_shader_with_define(&mut self, define: &str, f: &mut dyn FnMut(&mut dyn Shader));

    fn find_mesh(&self, name: &str) -> Option<MeshHandle>;

    fn has_mesh(&self, name: &str) -> bool {
        self.find_mesh(name).is_some()
    }
}

/// The graphics device. Draw calls use the most recently set state.
pub trait RenderDevice {
    fn push_debug_marker(&mut self, name: &str);
    fn pop_debug_marker(&mut self);

    fn set_render_target(&mut self, target: RenderTarget);
    fn set_viewport(&mut self, size: UVec2);
    fn clear_frame_buffer(&mut self, color: Vec4);
    fn set_culling(&mut self, mode: CullMode);
    fn set_depth_function(&mut self, function: DepthFunction);
    fn set_color(&mut self, color: Vec4);
    fn set_model_view_projection(&mut self, mvp: Mat4);

    fn bind_shader(&mut self, shader: ShaderHandle);
    /// Binds the shadow map as a texture on the given unit.
    fn bind_shadow_map(&mut self, unit: u32);

    fn draw_mesh(&mut self, mesh: MeshHandle);
    /// Draws a textured, axis aligned quad spanning the two corners.
    fn draw_quad(&mut self, bottom_left: Vec3, top_right: Vec3);
    fn draw_debug_line(&mut self, from: Vec3, to: Vec3, color: Vec4);
}
