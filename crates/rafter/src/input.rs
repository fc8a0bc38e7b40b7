//! Input as seen by the simulation. Device handling lives outside of Rafter, hosts translate
//! whatever they receive into an [`InputSnapshot`] once per frame.

use glam::Vec2;
use rafter_utils::math::{AngleExt, Radians};
use std::f32::consts::TAU;

/// State of the controls during a single frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    /// Mouse or touch movement since the previous frame, in pixels. +Y points down.
    pub look_delta: Vec2,
    pub fire: bool,
}

impl InputSnapshot {
    pub fn look(delta: Vec2) -> Self {
        Self {
            look_delta: delta,
            fire: false,
        }
    }

    pub fn firing() -> Self {
        Self {
            look_delta: Vec2::ZERO,
            fire: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputConfig {
    /// Radians of rotation per pixel of look movement
    pub mouse_sensitivity: f32,
    pub invert_y: bool,
    /// Limit of the aim pitch, in both directions
    pub max_pitch: Radians,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            mouse_sensitivity: 0.0025,
            invert_y: false,
            max_pitch: 80.0f32.degrees(),
        }
    }
}

impl InputConfig {
    /// Turns a look movement into a new yaw and pitch, both in radians. Yaw wraps into
    /// `0..TAU`, pitch stays within `max_pitch` of the horizon.
    pub fn apply_look(&self, yaw: f32, pitch: f32, delta: Vec2) -> (f32, f32) {
        let look = delta * self.mouse_sensitivity;
        // Screen +Y points down, so moving the mouse up raises the aim
        let pitch_delta = if self.invert_y { -look.y } else { look.y };
        let max_pitch = self.max_pitch.to_radians().abs();

        (
            (yaw - look.x).rem_euclid(TAU),
            (pitch - pitch_delta).clamp(-max_pitch, max_pitch),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looking_around() {
        let config = InputConfig {
            mouse_sensitivity: 0.01,
            invert_y: false,
            max_pitch: 45.0f32.degrees(),
        };

        let (yaw, pitch) = config.apply_look(0.0, 0.0, Vec2::new(-100.0, -50.0));
        assert!((yaw - 1.0).abs() < 1e-6);
        assert!((pitch - 0.5).abs() < 1e-6);

        // Yaw wraps around instead of going negative
        let (yaw, _) = config.apply_look(0.0, 0.0, Vec2::new(100.0, 0.0));
        assert!((yaw - (TAU - 1.0)).abs() < 1e-5);

        let inverted = InputConfig {
            invert_y: true,
            ..config.clone()
        };
        let (_, pitch) = inverted.apply_look(0.0, 0.0, Vec2::new(0.0, -50.0));
        assert!((pitch + 0.5).abs() < 1e-6);
    }

    #[test]
    fn pitch_is_clamped() {
        let config = InputConfig {
            mouse_sensitivity: 1.0,
            invert_y: false,
            max_pitch: 30.0f32.degrees(),
        };
        let limit = 30.0f32.to_radians();

        let (_, pitch) = config.apply_look(0.0, 0.0, Vec2::new(0.0, -10.0));
        assert!((pitch - limit).abs() < 1e-6);

        let (_, pitch) = config.apply_look(0.0, 0.0, Vec2::new(0.0, 10.0));
        assert!((pitch + limit).abs() < 1e-6);

        // A negative limit still means "this far in both directions"
        let negative = InputConfig {
            max_pitch: Radians(-limit),
            ..config
        };
        let (_, pitch) = negative.apply_look(0.0, 0.0, Vec2::new(0.0, -10.0));
        assert!((pitch - limit).abs() < 1e-6);
    }
}
