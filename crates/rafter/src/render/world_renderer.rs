use super::{
    api::{AssetManager, CullMode, DepthFunction, RenderDevice, RenderTarget, Shader, ShaderHandle},
    Camera, DrawContext, DrawSelection, RenderingOptions, ShaderDefines,
};
use crate::{
    components::{LightData, RenderPass},
    config::RenderingConfig,
    entities::{Component, Components},
};
use ahash::AHashSet;
use glam::{Mat4, UVec2, Vec3, Vec4};
use log::*;
use rafter_utils::{math::AngleExt, AnyResult, AnyhowResultExt};
use smallvec::SmallVec;

/// Texture unit shaders expect the shadow map on.
pub const SHADOW_MAP_TEXTURE_UNIT: u32 = 7;

/// Near the maximum depth, without reaching it. Depth gets packed into the color channels,
/// and a full 1.0 doesn't decode.
pub const SHADOW_MAP_CLEAR_COLOR: Vec4 = Vec4::new(0.99, 0.99, 0.99, 1.0);

pub const DEPTH_SHADER: &str = "shaders/render_depth";
pub const DEPTH_SKINNED_SHADER: &str = "shaders/render_depth_skinned";
pub const TEXTURED_SHADER: &str = "shaders/textured";

/// Define of shaders drawing the river surface.
pub const WATER_DEFINE: &str = "WATER";
/// Define of shaders that fade into fog.
pub const FOG_DEFINE: &str = "FOG_EFFECT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    Idle,
    ShadowPass,
    MainPass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePass {
    Shadow,
    Main,
}

/// What happened during a single [`WorldRenderer::render_frame`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    /// Passes in the order they ran
    pub passes: SmallVec<[FramePass; 2]>,
    pub shadow_draws: usize,
    pub main_draws: usize,
    pub shadow_map_bound: bool,
    pub defines_refreshed: bool,
}

/// Per-frame inputs of the renderer.
pub struct SceneView<'a> {
    pub components: &'a Components,
    pub camera: &'a Camera,
    pub river_offset: f32,
    pub texture_repeats: f32,
    pub draw_debug_physics: bool,
}

/// Renders the world in two passes: the shadow map from the main light's point of view, then
/// the scene itself.
pub struct WorldRenderer {
    config: RenderingConfig,
    light_camera: Camera,

    depth_shader: ShaderHandle,
    depth_skinned_shader: Option<ShaderHandle>,
    textured_shader: ShaderHandle,

    phase: FramePhase,
    frame: u64,
    shadow_written_frame: Option<u64>,
    define_refreshes: u32,
    reported: AHashSet<String>,
}

impl WorldRenderer {
    /// Looks up the shaders the passes need. Fails if the depth or textured shaders are missing.
    pub fn initialize(config: RenderingConfig, assets: &dyn AssetManager) -> AnyResult<Self> {
        let depth_shader = assets
            .find_shader(DEPTH_SHADER)
            .otherwise(format!("required shader `{DEPTH_SHADER}` not found"))?;
        let textured_shader = assets
            .find_shader(TEXTURED_SHADER)
            .otherwise(format!("required shader `{TEXTURED_SHADER}` not found"))?;

        let depth_skinned_shader = assets.find_shader(DEPTH_SKINNED_SHADER);
        if depth_skinned_shader.is_none() {
            warn!("shader `{DEPTH_SKINNED_SHADER}` not found, skinned meshes won't cast shadows");
        }

        let resolution = config.shadow_map_resolution.max(1);
        let light_camera = Camera {
            resolution: UVec2::splat(resolution),
            ..Default::default()
        };

        info!("world renderer initialized, {resolution}x{resolution} shadow map");

        Ok(Self {
            config,
            light_camera,
            depth_shader,
            depth_skinned_shader,
            textured_shader,
            phase: FramePhase::Idle,
            frame: 0,
            shadow_written_frame: None,
            define_refreshes: 0,
            reported: AHashSet::default(),
        })
    }

    pub fn config(&self) -> &RenderingConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut RenderingConfig {
        &mut self.config
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn light_camera(&self) -> &Camera {
        &self.light_camera
    }

    /// Amount of times global shader defines were recompiled.
    pub fn define_refreshes(&self) -> u32 {
        self.define_refreshes
    }

    fn warn_once(&mut self, key: &str, message: impl std::fmt::Display) {
        if self.reported.insert(key.to_string()) {
            warn!("{message}");
        }
    }

    /// Recompiles the shaders the renderer owns with the currently enabled defines.
    pub fn refresh_global_shader_defines(
        &mut self,
        options: &mut RenderingOptions,
        assets: &mut dyn AssetManager,
        device: &mut dyn RenderDevice,
    ) {
        let omitted = options.omitted_names();
        assets.reset_global_shader_defines(&[], &omitted);

        device.push_debug_marker("ShaderCompile");
        let shaders = [Some(self.depth_shader), self.depth_skinned_shader, Some(self.textured_shader)];
        for handle in shaders.into_iter().flatten() {
            let Some(shader) = assets.shader_mut(handle) else {
                continue;
            };
            if let Err(error) = shader.reload_if_dirty() {
                error!("couldn't recompile shader `{}`: {error:#}", shader.name());
            }
        }
        device.pop_debug_marker();

        options.mark_clean();
        self.define_refreshes += 1;
        debug!("global shader defines refreshed, omitting {omitted:?}");
    }

    /// Renders the shadow map, then the world.
    pub fn render_frame(
        &mut self,
        scene: &SceneView<'_>,
        options: &mut RenderingOptions,
        device: &mut dyn RenderDevice,
        assets: &mut dyn AssetManager,
    ) -> FrameReport {
        self.frame += 1;
        let refreshes_before = self.define_refreshes;

        let mut report = FrameReport {
            frame: self.frame,
            ..Default::default()
        };

        report.passes.push(FramePass::Shadow);
        report.shadow_draws = self.render_shadow_map(scene, options, device, assets);

        report.passes.push(FramePass::Main);
        let (main_draws, shadow_map_bound) = self.render_world(scene, options, device, assets);
        report.main_draws = main_draws;
        report.shadow_map_bound = shadow_map_bound;

        report.defines_refreshed = self.define_refreshes != refreshes_before;
        self.phase = FramePhase::Idle;
        report
    }

    /// Renders shadow casters into the shadow map, from the main light. Returns the amount of
    /// draws.
    pub fn render_shadow_map(
        &mut self,
        scene: &SceneView<'_>,
        options: &mut RenderingOptions,
        device: &mut dyn RenderDevice,
        assets: &mut dyn AssetManager,
    ) -> usize {
        self.phase = FramePhase::ShadowPass;
        device.push_debug_marker("Render ShadowMap");

        device.push_debug_marker("Scene Setup");
        if options.is_dirty() {
            self.refresh_global_shader_defines(options, assets, device);
        }

        let bias = self.config.shadow_map_bias;
        for handle in [Some(self.depth_shader), self.depth_skinned_shader].into_iter().flatten() {
            if let Some(shader) = assets.shader_mut(handle) {
                shader.set_uniform("bias", bias.into());
            }
        }
        device.pop_debug_marker();

        let draws = self.create_shadow_map(scene, device, assets);
        device.pop_debug_marker();
        draws
    }

    fn create_shadow_map(
        &mut self,
        scene: &SceneView<'_>,
        device: &mut dyn RenderDevice,
        assets: &mut dyn AssetManager,
    ) -> usize {
        let components = scene.components;
        let transforms = components.transform.storage();

        let Some((_, _, light_transform)) = components.light.main_light(transforms) else {
            self.warn_once("main light", "there's no light in the scene, skipping shadows");
            return 0;
        };

        let ready = assets.shader(self.depth_shader).map_or(false, |s| s.is_ready());
        if !ready {
            self.warn_once(DEPTH_SHADER, format!("shader `{DEPTH_SHADER}` isn't ready"));
            return 0;
        }

        device.push_debug_marker("CreateShadowMap");
        let resolution = self.config.shadow_map_resolution.max(1);
        let zoom = if self.config.shadow_map_zoom > 0.0 {
            self.config.shadow_map_zoom
        } else {
            1.0
        };

        let camera = scene.camera;
        let mut focus = camera.position + camera.facing * self.config.shadow_map_offset;
        focus.z = 0.0;

        self.light_camera.position = light_transform.position;
        self.light_camera.viewport_angle = self.config.shadow_map_viewport_angle.degrees() / zoom;
        self.light_camera.resolution = UVec2::splat(resolution);
        self.light_camera.look_at(focus);

        // Near-white is the furthest depth
        device.set_render_target(RenderTarget::ShadowMap);
        device.set_viewport(UVec2::splat(resolution));
        device.clear_frame_buffer(SHADOW_MAP_CLEAR_COLOR);
        device.set_culling(CullMode::Back);

        // Every caster goes through the static depth shader, bound per draw. Meshes carry no
        // skinning data yet, so the skinned variant only gets its defines and bias.
        let mut ctx = DrawContext {
            device: &mut *device,
            assets: &mut *assets,
            camera_transform: self.light_camera.transform_matrix(),
            eye: self.light_camera.position,
            selection: DrawSelection::ShadowCasters,
            shader_override: Some(self.depth_shader),
            reported: &mut self.reported,
        };

        let mut draws = 0;
        for pass in RenderPass::ALL {
            ctx.device.push_debug_marker("RenderPass");
            draws += components.render_mesh.render_pass(transforms, pass, &mut ctx);
            ctx.device.pop_debug_marker();
        }

        device.set_render_target(RenderTarget::Screen);
        device.set_viewport(camera.resolution);
        device.pop_debug_marker();

        self.shadow_written_frame = Some(self.frame);
        draws
    }

    /// Renders the world from the main camera. Returns the amount of mesh draws and whether the
    /// shadow map was bound.
    pub fn render_world(
        &mut self,
        scene: &SceneView<'_>,
        options: &mut RenderingOptions,
        device: &mut dyn RenderDevice,
        assets: &mut dyn AssetManager,
    ) -> (usize, bool) {
        self.phase = FramePhase::MainPass;
        let components = scene.components;
        let transforms = components.transform.storage();

        device.push_debug_marker("Render World");

        device.push_debug_marker("Scene Setup");
        if options.is_dirty() {
            self.refresh_global_shader_defines(options, assets, device);
        }

        let camera_transform = scene.camera.transform_matrix();
        device.set_color(Vec4::ONE);
        device.set_depth_function(DepthFunction::Less);
        device.set_model_view_projection(camera_transform);

        let shadows_enabled = options.is_enabled(ShaderDefines::SHADOW_EFFECT);
        if shadows_enabled {
            let light_view_projection = self.light_camera.transform_matrix();
            for_each_shader_with(assets, ShaderDefines::SHADOW_EFFECT, |shader| {
                shader.set_uniform("view_projection", camera_transform.into());
                shader.set_uniform("light_view_projection", light_view_projection.into());
            });
        }

        let (river_offset, texture_repeats) = (scene.river_offset, scene.texture_repeats);
        assets.for_each_shader_with_define(WATER_DEFINE, &mut |shader| {
            shader.set_uniform("river_offset", river_offset.into());
            shader.set_uniform("texture_repeats", texture_repeats.into());
        });

        match components.light.main_light(transforms) {
            Some((_, light, _)) => {
                for_each_shader_with(assets, ShaderDefines::PHONG_SHADING, |shader| {
                    set_lighting_uniforms(shader, light, shadows_enabled);
                });
            }
            None => self.warn_once("main light", "there's no light in the scene, skipping lighting"),
        }

        let config = &self.config;
        assets.for_each_shader_with_define(FOG_DEFINE, &mut |shader| {
            shader.set_uniform("fog_roll_in_dist", config.fog_roll_in_dist.into());
            shader.set_uniform("fog_max_dist", config.fog_max_dist.into());
            shader.set_uniform("fog_color", config.fog_color().into());
            shader.set_uniform("fog_max_saturation", config.fog_max_saturation.into());
        });

        let shadow_map_bound = self.shadow_written_frame == Some(self.frame);
        if shadow_map_bound {
            device.bind_shadow_map(SHADOW_MAP_TEXTURE_UNIT);
        } else {
            self.warn_once("shadow map", "shadow map wasn't rendered this frame, not binding it");
        }
        device.pop_debug_marker();

        let mut draws = 0;
        if !self.config.skip_render_meshes {
            let mut ctx = DrawContext {
                device: &mut *device,
                assets: &mut *assets,
                camera_transform,
                eye: scene.camera.position,
                selection: DrawSelection::Visible,
                shader_override: None,
                reported: &mut self.reported,
            };

            for pass in RenderPass::ALL {
                ctx.device.push_debug_marker("RenderPass");
                draws += components.render_mesh.render_pass(transforms, pass, &mut ctx);
                ctx.device.pop_debug_marker();
            }
        }

        if scene.draw_debug_physics {
            device.push_debug_marker("Debug Draw World");
            components.physics.debug_draw_world(device, camera_transform);
            device.pop_debug_marker();
        }

        if self.config.debug_show_shadow_map {
            self.debug_show_shadow_map(scene.camera, device);
        }

        device.pop_debug_marker();
        (draws, shadow_map_bound)
    }

    /// Draws the shadow map on a large quad in the world.
    pub fn debug_show_shadow_map(&self, camera: &Camera, device: &mut dyn RenderDevice) {
        let world = Mat4::from_scale(Vec3::splat(10.0));

        device.set_render_target(RenderTarget::Screen);
        device.set_model_view_projection(camera.transform_matrix() * world);
        device.set_color(Vec4::ONE);
        device.bind_shadow_map(0);
        device.bind_shader(self.textured_shader);
        device.draw_quad(Vec3::ZERO, Vec3::new(10.0, 0.0, 10.0));
    }
}

fn for_each_shader_with(
    assets: &mut dyn AssetManager,
    define: ShaderDefines,
    mut f: impl FnMut(&mut dyn Shader),
) {
    if let Some(name) = define.name() {
        assets.for_each_shader_with_define(name, &mut f);
    }
}

fn set_lighting_uniforms(shader: &mut dyn Shader, light: &LightData, shadows_enabled: bool) {
    if shadows_enabled {
        shader.set_uniform("shadow_intensity", light.shadow_intensity.into());
    }
    shader.set_uniform("ambient_material", light.ambient_material().into());
    shader.set_uniform("diffuse_material", light.diffuse_material().into());
    shader.set_uniform("specular_material", light.specular_material().into());
    shader.set_uniform("shininess", light.specular_exponent.into());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        components::{LightComponent, PhysicsComponent, RenderMeshComponent, TransformComponent},
        entities::Universe,
        render::headless::{HeadlessAssets, HeadlessDevice, HeadlessShader, RenderCommand},
    };

    /// A light high above a single cube at the origin.
    fn scene() -> Universe {
        let mut universe = Universe::new();

        let light = universe.create_entity();
        universe.add_component::<LightComponent>(light);
        universe
            .get_component_data_mut::<TransformComponent>(light)
            .unwrap()
            .position = Vec3::new(0.0, -10.0, 50.0);

        let cube = universe.create_entity();
        universe.add_component::<RenderMeshComponent>(cube);
        universe.add_component::<PhysicsComponent>(cube);
        let mesh = universe
            .get_component_data_mut::<RenderMeshComponent>(cube)
            .unwrap();
        mesh.mesh = String::from("meshes/cube");
        mesh.shader = String::from(TEXTURED_SHADER);
        universe
    }

    fn render(
        renderer: &mut WorldRenderer,
        universe: &Universe,
        assets: &mut HeadlessAssets,
        debug_physics: bool,
    ) -> (FrameReport, HeadlessDevice) {
        let camera = Camera {
            position: Vec3::new(0.0, -20.0, 5.0),
            ..Default::default()
        };
        let scene = SceneView {
            components: universe.components(),
            camera: &camera,
            river_offset: 0.0,
            texture_repeats: 6.0,
            draw_debug_physics: debug_physics,
        };

        let mut options = RenderingOptions::default();
        let mut device = HeadlessDevice::new();
        let report = renderer.render_frame(&scene, &mut options, &mut device, assets);
        assert_eq!(renderer.phase(), FramePhase::Idle);
        (report, device)
    }

    #[test]
    fn light_camera_focuses_on_the_ground() {
        let universe = scene();
        let mut assets = HeadlessAssets::with_stock_shaders();
        let mut renderer = WorldRenderer::initialize(RenderingConfig::default(), &assets).unwrap();

        let (report, _) = render(&mut renderer, &universe, &mut assets, false);
        assert_eq!(report.shadow_draws, 1);
        assert_eq!(report.main_draws, 1);

        let light_camera = renderer.light_camera();
        assert_eq!(light_camera.position, Vec3::new(0.0, -10.0, 50.0));
        let focus = light_camera.position + light_camera.facing * 50.0 / light_camera.facing.z.abs();
        assert!(focus.z.abs() < 1e-3);
    }

    #[test]
    fn unready_depth_shader_skips_shadows() {
        let universe = scene();
        let mut assets = HeadlessAssets::with_stock_shaders();
        assets.add_shader(HeadlessShader::new(DEPTH_SHADER).with_ready(false));
        let mut renderer = WorldRenderer::initialize(RenderingConfig::default(), &assets).unwrap();

        let (report, device) = render(&mut renderer, &universe, &mut assets, false);
        assert_eq!(report.shadow_draws, 0);
        assert!(!report.shadow_map_bound);
        assert_eq!(report.main_draws, 1);
        assert!(!device
            .commands()
            .contains(&RenderCommand::SetRenderTarget(RenderTarget::ShadowMap)));
    }

    #[test]
    fn debug_switches() {
        let universe = scene();
        let mut assets = HeadlessAssets::with_stock_shaders();
        let config = RenderingConfig {
            skip_render_meshes: true,
            debug_show_shadow_map: true,
            ..Default::default()
        };
        let mut renderer = WorldRenderer::initialize(config, &assets).unwrap();

        let (report, device) = render(&mut renderer, &universe, &mut assets, true);
        assert_eq!(report.main_draws, 0);
        assert_eq!(report.shadow_draws, 1);

        let commands = device.commands();
        let lines = commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::DrawDebugLine(..)))
            .count();
        assert_eq!(lines, 48);
        assert!(matches!(commands.last(), Some(RenderCommand::PopDebugMarker)));
        assert!(commands
            .iter()
            .any(|c| matches!(c, RenderCommand::DrawQuad(..))));
        assert!(commands.contains(&RenderCommand::BindShadowMap(0)));
    }

    #[test]
    fn shadow_pass_uses_the_depth_shader() {
        let universe = scene();
        let mut assets = HeadlessAssets::with_stock_shaders();
        let mut renderer = WorldRenderer::initialize(RenderingConfig::default(), &assets).unwrap();
        let skinned = renderer.depth_skinned_shader.unwrap();

        let (_, device) = render(&mut renderer, &universe, &mut assets, false);
        let commands = device.commands();
        let start = commands
            .iter()
            .position(|c| *c == RenderCommand::SetRenderTarget(RenderTarget::ShadowMap))
            .unwrap();
        let end = commands
            .iter()
            .position(|c| *c == RenderCommand::SetRenderTarget(RenderTarget::Screen))
            .unwrap();

        let binds = commands[start..end]
            .iter()
            .filter_map(|c| match c {
                RenderCommand::BindShader(shader) => Some(*shader),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(binds, [renderer.depth_shader]);
        assert!(!commands.contains(&RenderCommand::BindShader(skinned)));
    }

    #[test]
    fn skinned_depth_shader_is_optional() {
        let mut assets = HeadlessAssets::new();
        assets.add_shader(HeadlessShader::new(DEPTH_SHADER));
        assets.add_shader(HeadlessShader::new(TEXTURED_SHADER));
        assert!(WorldRenderer::initialize(RenderingConfig::default(), &assets).is_ok());

        let mut assets = HeadlessAssets::new();
        assets.add_shader(HeadlessShader::new(TEXTURED_SHADER));
        assert!(WorldRenderer::initialize(RenderingConfig::default(), &assets).is_err());
    }
}
