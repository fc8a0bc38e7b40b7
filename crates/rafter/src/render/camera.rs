use glam::{Mat4, UVec2, Vec3};
use rafter_utils::math::{AngleExt, Radians};

/// A perspective camera. Z points up.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Unit view direction
    pub facing: Vec3,
    pub up: Vec3,
    /// Vertical field of view
    pub viewport_angle: Radians,
    pub resolution: UVec2,
    pub near_plane: f32,
    pub far_plane: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            facing: Vec3::Y,
            up: Vec3::Z,
            viewport_angle: 60.0f32.degrees(),
            resolution: UVec2::new(1280, 720),
            near_plane: 0.1,
            far_plane: 500.0,
        }
    }
}

impl Camera {
    pub fn aspect_ratio(&self) -> f32 {
        self.resolution.x.max(1) as f32 / self.resolution.y.max(1) as f32
    }

    /// Points the camera at a target. Does nothing if the target is at the camera's position.
    pub fn look_at(&mut self, target: Vec3) {
        if let Some(facing) = (target - self.position).try_normalize() {
            self.facing = facing;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        // Looking straight along the up vector would make the basis degenerate
        let up = if self.facing.cross(self.up).length_squared() < 1e-6 {
            Vec3::Y
        } else {
            self.up
        };
        Mat4::look_to_rh(self.position, self.facing, up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.viewport_angle.to_radians(),
            self.aspect_ratio(),
            self.near_plane,
            self.far_plane,
        )
    }

    /// World to clip space transformation.
    pub fn transform_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
