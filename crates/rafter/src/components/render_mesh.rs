use super::{report_missing, TransformData, NEEDS_TRANSFORM};
use crate::{
    entities::{Component, ComponentKind, ComponentStorage, Components, Entity, UpdateContext},
    render::{DrawContext, DrawSelection},
};
use glam::{Mat4, Vec3, Vec4};
use rafter_lvl::defs::RenderMeshDef;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPass {
    Opaque,
    Transparent,
}

impl RenderPass {
    /// Passes in drawing order.
    pub const ALL: [RenderPass; 2] = [RenderPass::Opaque, RenderPass::Transparent];
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderMeshData {
    pub mesh: String,
    pub shader: String,
    pub pass: RenderPass,
    pub visible: bool,
    pub casts_shadow: bool,
    pub tint: Vec4,
}

impl Default for RenderMeshData {
    fn default() -> Self {
        Self {
            mesh: String::new(),
            shader: String::new(),
            pass: RenderPass::Opaque,
            visible: true,
            casts_shadow: true,
            tint: Vec4::ONE,
        }
    }
}

/// A mesh queued for drawing.
#[derive(Debug, Clone)]
pub struct DrawItem<'a> {
    pub entity: Entity,
    pub mesh: &'a RenderMeshData,
    pub world: Mat4,
    /// Squared distance from the camera
    pub depth: f32,
}

#[derive(Default)]
pub struct RenderMeshComponent {
    storage: ComponentStorage<RenderMeshData>,
}

impl RenderMeshComponent {
    /// Meshes of a pass in drawing order: opaque ones front to back, transparent ones back to
    /// front. Meshes without a transform are left out.
    pub fn collect_draws<'a>(
        &'a self,
        transforms: &ComponentStorage<TransformData>,
        pass: RenderPass,
        eye: Vec3,
        selection: DrawSelection,
    ) -> Vec<DrawItem<'a>> {
        let mut items = self
            .storage
            .iter()
            .filter(|(_, mesh)| mesh.pass == pass && mesh.visible)
            .filter(|(_, mesh)| selection == DrawSelection::Visible || mesh.casts_shadow)
            .filter_map(|(entity, mesh)| {
                let transform = transforms.get(entity)?;
                Some(DrawItem {
                    entity,
                    mesh,
                    world: transform.world_matrix(),
                    depth: transform.position.distance_squared(eye),
                })
            })
            .collect::<Vec<_>>();

        match pass {
            RenderPass::Opaque => items.sort_by(|a, b| a.depth.total_cmp(&b.depth)),
            RenderPass::Transparent => items.sort_by(|a, b| b.depth.total_cmp(&a.depth)),
        }
        items
    }

    /// Draws a single pass. Meshes whose shader or mesh isn't available are skipped, which gets
    /// reported once per resource. Returns the amount of issued draws.
    ///
    /// Dirty shaders are reloaded before their first use.
    pub fn render_pass(
        &self,
        transforms: &ComponentStorage<TransformData>,
        pass: RenderPass,
        ctx: &mut DrawContext<'_>,
    ) -> usize {
        let mut drawn = 0;

        for item in self.collect_draws(transforms, pass, ctx.eye, ctx.selection) {
            let shader = match ctx.shader_override {
                Some(shader) => shader,
                None => match ctx.assets.find_shader(&item.mesh.shader) {
                    Some(shader) => shader,
                    None => {
                        let shader = &item.mesh.shader;
                        ctx.warn_once(shader, format!("shader `{shader}` not found"));
                        continue;
                    }
                },
            };

            // Binding a shader recompiles it if global defines changed
            let Some(program) = ctx.assets.shader_mut(shader) else {
                let name = &item.mesh.shader;
                ctx.warn_once(name, format!("shader `{name}` not found"));
                continue;
            };
            match program.reload_if_dirty() {
                Ok(_) if program.is_ready() => {}
                Ok(_) => {
                    let name = program.name().to_string();
                    ctx.warn_once(&name, format!("shader `{name}` isn't ready, skipping"));
                    continue;
                }
                Err(error) => {
                    let name = program.name().to_string();
                    ctx.warn_once(&name, format!("shader `{name}` failed to reload: {error:#}"));
                    continue;
                }
            }

            let Some(mesh) = ctx.assets.find_mesh(&item.mesh.mesh) else {
                let name = &item.mesh.mesh;
                ctx.warn_once(name, format!("mesh `{name}` not found"));
                continue;
            };

            ctx.device
                .set_model_view_projection(ctx.camera_transform * item.world);
            ctx.device.set_color(item.mesh.tint);
            ctx.device.bind_shader(shader);
            ctx.device.draw_mesh(mesh);
            drawn += 1;
        }

        drawn
    }
}

impl Component for RenderMeshComponent {
    type Data = RenderMeshData;
    type Def = RenderMeshDef;

    const DEPENDENCIES: &'static [ComponentKind] = NEEDS_TRANSFORM;

    fn storage(&self) -> &ComponentStorage<RenderMeshData> {
        &self.storage
    }

    fn storage_mut(&mut self) -> &mut ComponentStorage<RenderMeshData> {
        &mut self.storage
    }

    fn default_data(&self) -> RenderMeshData {
        RenderMeshData::default()
    }

    fn data_from_def(&self, def: RenderMeshDef) -> RenderMeshData {
        RenderMeshData {
            mesh: def.mesh,
            shader: def.shader,
            pass: if def.transparent {
                RenderPass::Transparent
            } else {
                RenderPass::Opaque
            },
            visible: def.visible,
            casts_shadow: def.casts_shadow,
            tint: def.tint,
        }
    }

    fn def_from_data(&self, data: &RenderMeshData) -> RenderMeshDef {
        RenderMeshDef {
            mesh: data.mesh.clone(),
            shader: data.shader.clone(),
            transparent: data.pass == RenderPass::Transparent,
            visible: data.visible,
            casts_shadow: data.casts_shadow,
            tint: data.tint,
        }
    }

    /// Only checks that meshes can be placed in the world, drawing happens in [`Self::render_pass`].
    fn update_all_entities(
        components: &mut Components,
        _ctx: &mut UpdateContext<'_>,
        _delta: Duration,
    ) {
        let Components {
            render_mesh,
            transform,
            ..
        } = components;

        let transforms = transform.storage();
        let missing = render_mesh
            .storage
            .entities()
            .iter()
            .copied()
            .filter(|&entity| !transforms.contains(entity))
            .collect::<Vec<_>>();

        report_missing(
            &mut render_mesh.storage,
            missing,
            ComponentKind::RenderMesh,
            ComponentKind::Transform,
        );
    }
}
