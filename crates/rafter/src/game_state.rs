use crate::{
    components::{PlayerComponent, RailDenizenComponent, TransformComponent, FORWARD},
    config::Config,
    entities::{Component, ComponentKind, Entity, UpdateContext, Universe},
    input::{InputConfig, InputSnapshot},
    rails::{Rail, RailManager},
    render::{
        api::{AssetManager, RenderDevice},
        Camera, FrameReport, RenderingOptions, SceneView, ShaderDefines, WorldRenderer,
    },
    services::Services,
};
use anyhow::Context;
use glam::{Quat, UVec2, Vec2, Vec3};
use log::*;
use rafter_lvl::LevelDef;
use rafter_utils::{math::AngleExt, AnyResult};
use std::{f32::consts::TAU, path::Path, sync::Arc, time::Duration};

/// Owns the whole simulation: the universe, rails, the main camera and the renderer.
pub struct GameState {
    config: Config,
    universe: Universe,
    rails: RailManager,
    services: Services,

    main_camera: Camera,
    camera_yaw: f32,
    camera_pitch: f32,

    renderer: WorldRenderer,
    rendering_options: RenderingOptions,
    input_config: InputConfig,

    /// River texture scroll, in `0..1`
    river_offset: f32,
    frame: u64,
}

impl GameState {
    /// Sets up the game. Fails if the configuration is invalid or if shaders required by the
    /// renderer are missing.
    pub fn initialize(
        window_size: UVec2,
        config: Config,
        assets: &dyn AssetManager,
    ) -> AnyResult<Self> {
        let update_order = config.update_order()?;
        let renderer = WorldRenderer::initialize(config.rendering.clone(), assets)?;

        let main_camera = Camera {
            viewport_angle: config.rendering.viewport_angle.degrees(),
            resolution: window_size,
            near_plane: config.rendering.near_plane,
            far_plane: config.rendering.far_plane,
            ..Default::default()
        };

        ComponentKind::log_registry();
        debug!("update order: {:?}", update_order.kinds());

        Ok(Self {
            universe: Universe::with_update_order(update_order),
            rails: RailManager::new(),
            services: Services::new(),
            main_camera,
            camera_yaw: 0.0,
            camera_pitch: 0.0,
            renderer,
            rendering_options: config.rendering_options(),
            input_config: config.input_config(),
            river_offset: 0.0,
            frame: 0,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn universe_mut(&mut self) -> &mut Universe {
        &mut self.universe
    }

    pub fn rails(&self) -> &RailManager {
        &self.rails
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn main_camera(&self) -> &Camera {
        &self.main_camera
    }

    pub fn renderer(&self) -> &WorldRenderer {
        &self.renderer
    }

    pub fn rendering_options(&self) -> &RenderingOptions {
        &self.rendering_options
    }

    /// Input settings from the `[input]` config section, what hosts pass to [`Self::update`]
    /// unless they let players change them at runtime.
    pub fn input_config(&self) -> &InputConfig {
        &self.input_config
    }

    pub fn river_offset(&self) -> f32 {
        self.river_offset
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn load_rail(&mut self, path: impl AsRef<Path>) -> AnyResult<Arc<Rail>> {
        self.rails.load_rail(path)
    }

    pub fn load_rails<P: AsRef<Path>>(&mut self, paths: impl IntoIterator<Item = P>) -> AnyResult {
        self.rails.load_rails(paths)
    }

    pub fn rails_mut(&mut self) -> &mut RailManager {
        &mut self.rails
    }

    /// Replaces the current level. The first player entity becomes the active player, the first
    /// rail denizen becomes the raft. Returns the amount of spawned entities.
    pub fn load_level(&mut self, level: &LevelDef) -> usize {
        self.unload_level();

        for definition in &level.entities {
            self.universe.spawn_entity(definition);
        }

        let player = self
            .universe
            .component::<PlayerComponent>()
            .storage()
            .entities()
            .first()
            .copied();
        // Players usually ride the raft, on a rail of their own
        let raft = self
            .universe
            .component::<RailDenizenComponent>()
            .storage()
            .entities()
            .iter()
            .copied()
            .find(|&entity| Some(entity) != player);
        self.services.set_player_entity(player);
        self.services.set_raft_entity(raft);

        let player_data = player.and_then(|p| self.universe.get_component_data::<PlayerComponent>(p));
        if let Some(data) = player_data {
            self.camera_yaw = data.yaw;
            self.camera_pitch = data.pitch;
        }

        info!(
            "level loaded: {} entities, player {}, raft {}",
            self.universe.entity_count(),
            display_entity(player),
            display_entity(raft)
        );
        level.entities.len()
    }

    pub fn load_level_file(&mut self, path: impl AsRef<Path>) -> AnyResult<usize> {
        let path = path.as_ref();
        let level = LevelDef::load(path)
            .with_context(|| format!("couldn't load level `{}`", path.display()))?;
        Ok(self.load_level(&level))
    }

    /// Destroys every entity. Rails stay loaded.
    pub fn unload_level(&mut self) {
        self.universe.clear();
        self.services.clear();
        self.river_offset = 0.0;
    }

    /// Advances the simulation.
    pub fn update(&mut self, delta: Duration, input: &InputSnapshot, input_config: &InputConfig) {
        self.frame += 1;
        self.services.prune(&self.universe);

        let mut ctx = UpdateContext::new(&self.rails, input, input_config);
        ctx.active_player = self.services.player_entity(&self.universe);
        ctx.gravity = self.config.gravity();
        self.universe.update_all(&mut ctx, delta);

        let dt = delta.as_secs_f32();
        let offset = (self.river_offset + self.config.river.speed * dt).rem_euclid(1.0);
        self.river_offset = if offset < 1.0 { offset } else { 0.0 };

        if self.config.input.mouse_look {
            self.update_main_camera_mouse(input.look_delta, input_config);
        } else {
            self.update_main_camera_android();
        }
    }

    /// Renders the world from the main camera.
    pub fn render(
        &mut self,
        device: &mut dyn RenderDevice,
        assets: &mut dyn AssetManager,
    ) -> FrameReport {
        let scene = SceneView {
            components: self.universe.components(),
            camera: &self.main_camera,
            river_offset: self.river_offset,
            texture_repeats: self.config.river.texture_repeats,
            draw_debug_physics: self.config.world.draw_debug_physics,
        };

        self.renderer
            .render_frame(&scene, &mut self.rendering_options, device, assets)
    }

    /// Rotates the main camera by a mouse movement and moves it onto the player.
    pub fn update_main_camera_mouse(&mut self, delta: Vec2, input_config: &InputConfig) {
        (self.camera_yaw, self.camera_pitch) =
            input_config.apply_look(self.camera_yaw, self.camera_pitch, delta);
        self.follow_player();
    }

    /// Moves the main camera onto the player, looking in the raft's direction of travel. Used
    /// where there's no mouse to look around with.
    pub fn update_main_camera_android(&mut self) {
        let raft_facing = self
            .services
            .raft_entity(&self.universe)
            .and_then(|raft| self.universe.get_component_data::<TransformComponent>(raft))
            .map(|transform| transform.facing());

        if let Some(facing) = raft_facing {
            if facing.x != 0.0 || facing.y != 0.0 {
                self.camera_yaw = (-facing.x).atan2(facing.y).rem_euclid(TAU);
            }
        }
        self.camera_pitch = 0.0;
        self.follow_player();
    }

    fn follow_player(&mut self) {
        let anchor = [
            self.services.player_entity(&self.universe),
            self.services.raft_entity(&self.universe),
        ]
        .into_iter()
        .flatten()
        .find_map(|e| self.universe.get_component_data::<TransformComponent>(e))
        .map(|transform| transform.position);

        if let Some(anchor) = anchor {
            self.main_camera.position = anchor + Vec3::Z * self.config.world.camera_height;
        }
        self.main_camera.facing = Quat::from_rotation_z(self.camera_yaw)
            * Quat::from_rotation_x(self.camera_pitch)
            * FORWARD;
    }

    /// Toggles a global shader define. Shaders get recompiled before the next pass.
    pub fn set_rendering_option(&mut self, define: ShaderDefines, enabled: bool) {
        self.rendering_options.set(define, enabled);
    }

    pub fn resize(&mut self, window_size: UVec2) {
        self.main_camera.resolution = window_size;
    }
}

fn display_entity(entity: Option<Entity>) -> String {
    entity.map_or_else(|| String::from("none"), |e| e.to_string())
}
