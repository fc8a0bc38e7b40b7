//! Backend-less implementations of the render interfaces.
//!
//! [`HeadlessDevice`] records every call as a [`RenderCommand`], [`HeadlessAssets`] keeps track
//! of shader defines, uniforms and reloads. The headless runner and the tests render through
//! them.

use super::api::*;
use ahash::{AHashMap, AHashSet};
use glam::{Mat4, UVec2, Vec3, Vec4};
use log::*;
use rafter_utils::AnyResult;

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    PushDebugMarker(String),
    PopDebugMarker,
    SetRenderTarget(RenderTarget),
    SetViewport(UVec2),
    ClearFrameBuffer(Vec4),
    SetCulling(CullMode),
    SetDepthFunction(DepthFunction),
    SetColor(Vec4),
    SetModelViewProjection(Mat4),
    BindShader(ShaderHandle),
    BindShadowMap(u32),
    DrawMesh(MeshHandle),
    DrawQuad(Vec3, Vec3),
    DrawDebugLine(Vec3, Vec3, Vec4),
}

#[derive(Debug, Default)]
pub struct HeadlessDevice {
    commands: Vec<RenderCommand>,
    marker_depth: usize,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::DrawMesh(_)))
            .count()
    }

    /// Nesting level of debug markers, zero when every marker was popped.
    pub fn marker_depth(&self) -> usize {
        self.marker_depth
    }
}

impl RenderDevice for HeadlessDevice {
    fn push_debug_marker(&mut self, name: &str) {
        self.marker_depth += 1;
        self.commands
            .push(RenderCommand::PushDebugMarker(name.to_string()));
    }

    fn pop_debug_marker(&mut self) {
        if self.marker_depth == 0 {
            warn!("popping a debug marker that was never pushed");
        }
        self.marker_depth = self.marker_depth.saturating_sub(1);
        self.commands.push(RenderCommand::PopDebugMarker);
    }

    fn set_render_target(&mut self, target: RenderTarget) {
        self.commands.push(RenderCommand::SetRenderTarget(target));
    }

    fn set_viewport(&mut self, size: UVec2) {
        self.commands.push(RenderCommand::SetViewport(size));
    }

    fn clear_frame_buffer(&mut self, color: Vec4) {
        self.commands.push(RenderCommand::ClearFrameBuffer(color));
    }

    fn set_culling(&mut self, mode: CullMode) {
        self.commands.push(RenderCommand::SetCulling(mode));
    }

    fn set_depth_function(&mut self, function: DepthFunction) {
        self.commands.push(RenderCommand::SetDepthFunction(function));
    }

    fn set_color(&mut self, color: Vec4) {
        self.commands.push(RenderCommand::SetColor(color));
    }

    fn set_model_view_projection(&mut self, mvp: Mat4) {
        self.commands.push(RenderCommand::SetModelViewProjection(mvp));
    }

    fn bind_shader(&mut self, shader: ShaderHandle) {
        self.commands.push(RenderCommand::BindShader(shader));
    }

    fn bind_shadow_map(&mut self, unit: u32) {
        self.commands.push(RenderCommand::BindShadowMap(unit));
    }

    fn draw_mesh(&mut self, mesh: MeshHandle) {
        self.commands.push(RenderCommand::DrawMesh(mesh));
    }

    fn draw_quad(&mut self, bottom_left: Vec3, top_right: Vec3) {
        self.commands
            .push(RenderCommand::DrawQuad(bottom_left, top_right));
    }

    fn draw_debug_line(&mut self, from: Vec3, to: Vec3, color: Vec4) {
        self.commands
            .push(RenderCommand::DrawDebugLine(from, to, color));
    }
}

/// A shader that's never compiled for real.
///
/// Its own defines are always active. Optional defines are active unless globally omitted, and
/// global additions apply to every shader.
#[derive(Debug, Clone)]
pub struct HeadlessShader {
    name: String,
    local_defines: Vec<String>,
    optional_defines: Vec<String>,
    global_add: Vec<String>,
    global_omit: Vec<String>,

    active_defines: AHashSet<String>,
    uniforms: AHashMap<String, UniformValue>,
    dirty: bool,
    ready: bool,
    reload_count: u32,
}

impl HeadlessShader {
    pub fn new(name: impl Into<String>) -> Self {
        let mut shader = Self {
            name: name.into(),
            local_defines: vec![],
            optional_defines: vec![],
            global_add: vec![],
            global_omit: vec![],
            active_defines: AHashSet::default(),
            uniforms: AHashMap::default(),
            dirty: false,
            ready: true,
            reload_count: 0,
        };
        shader.compile();
        shader
    }

    /// Adds a define the shader is always compiled with.
    pub fn with_define(mut self, define: &str) -> Self {
        self.local_defines.push(define.to_string());
        self.compile();
        self
    }

    /// Adds a define the shader supports, active unless globally omitted.
    pub fn with_optional_define(mut self, define: &str) -> Self {
        self.optional_defines.push(define.to_string());
        self.compile();
        self
    }

    pub fn with_ready(mut self, ready: bool) -> Self {
        self.ready = ready;
        self
    }

    fn compile(&mut self) {
        let optional = self
            .optional_defines
            .iter()
            .filter(|d| !self.global_omit.contains(d));

        self.active_defines = self
            .local_defines
            .iter()
            .chain(optional)
            .chain(self.global_add.iter())
            .cloned()
            .collect();
    }

    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name).copied()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn reload_count(&self) -> u32 {
        self.reload_count
    }
}

impl Shader for HeadlessShader {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_define(&self, define: &str) -> bool {
        self.active_defines.contains(define)
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.uniforms.insert(name.to_string(), value);
    }

    fn reload_if_dirty(&mut self) -> AnyResult<bool> {
        if !self.dirty {
            return Ok(false);
        }

        self.compile();
        self.dirty = false;
        self.reload_count += 1;
        Ok(true)
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}

#[derive(Debug, Default)]
pub struct HeadlessAssets {
    shaders: Vec<HeadlessShader>,
    shader_names: AHashMap<String, ShaderHandle>,
    meshes: AHashMap<String, MeshHandle>,
    global_add: Vec<String>,
    global_omit: Vec<String>,
}

impl HeadlessAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a shader, replacing any shader of the same name. It's compiled with the current
    /// global defines.
    pub fn add_shader(&mut self, mut shader: HeadlessShader) -> ShaderHandle {
        shader.global_add = self.global_add.clone();
        shader.global_omit = self.global_omit.clone();
        shader.compile();

        if let Some(&handle) = self.shader_names.get(shader.name()) {
            self.shaders[handle.0 as usize] = shader;
            return handle;
        }

        let handle = ShaderHandle(self.shaders.len() as u32);
        self.shader_names.insert(shader.name().to_string(), handle);
        self.shaders.push(shader);
        handle
    }

    pub fn add_mesh(&mut self, name: &str) -> MeshHandle {
        let next = MeshHandle(self.meshes.len() as u32);
        *self.meshes.entry(name.to_string()).or_insert(next)
    }

    pub fn headless_shader(&self, name: &str) -> Option<&HeadlessShader> {
        let handle = self.shader_names.get(name)?;
        self.shaders.get(handle.0 as usize)
    }

    /// Shaders Rafter's renderer expects, with the defines the stock shaders are written with,
    /// plus a unit cube mesh.
    pub fn with_stock_shaders() -> Self {
        let mut assets = Self::new();
        assets.add_shader(HeadlessShader::new("shaders/render_depth"));
        assets.add_shader(HeadlessShader::new("shaders/render_depth_skinned"));
        assets.add_shader(HeadlessShader::new("shaders/textured"));
        assets.add_shader(
            HeadlessShader::new("shaders/textured_lit")
                .with_optional_define("PHONG_SHADING")
                .with_optional_define("SPECULAR_EFFECT")
                .with_optional_define("SHADOW_EFFECT")
                .with_optional_define("NORMALS")
                .with_define("FOG_EFFECT"),
        );
        assets.add_shader(
            HeadlessShader::new("shaders/water")
                .with_define("WATER")
                .with_define("FOG_EFFECT")
                .with_optional_define("SHADOW_EFFECT"),
        );
        assets.add_mesh("meshes/cube");
        assets
    }
}

impl AssetManager for HeadlessAssets {
    fn find_shader(&self, name: &str) -> Option<ShaderHandle> {
        self.shader_names.get(name).copied()
    }

    fn shader(&self, handle: ShaderHandle) -> Option<&dyn Shader> {
        self.shaders
            .get(handle.0 as usize)
            .map(|s| s as &dyn Shader)
    }

    fn shader_mut(&mut self, handle: ShaderHandle) -> Option<&mut dyn Shader> {
        self.shaders
            .get_mut(handle.0 as usize)
            .map(|s| s as &mut dyn Shader)
    }

    fn reset_global_shader_defines(&mut self, add: &[&str], omit: &[&str]) {
        self.global_add = add.iter().map(|s| s.to_string()).collect();
        self.global_omit = omit.iter().map(|s| s.to_string()).collect();

        for shader in &mut self.shaders {
            shader.global_add = self.global_add.clone();
            shader.global_omit = self.global_omit.clone();
            shader.dirty = true;
        }
    }

    fn for_each_shader_with_define(&mut self, define: &str, f: &mut dyn FnMut(&mut dyn Shader)) {
        for shader in &mut self.shaders {
            if shader.has_define(define) {
                f(shader);
            }
        }
    }

    fn find_mesh(&self, name: &str) -> Option<MeshHandle> {
        self.meshes.get(name).copied()
    }
}
