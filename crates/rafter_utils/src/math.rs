//! Angle helpers.
//!
//! [`Radians`] is the only angle type that crosses API boundaries. Configuration files store
//! degrees, which get converted with [`AngleExt::degrees`] as soon as they're loaded.

use std::ops::{Div, Mul};

/// Type-safe wrapper for an angle specified in radians, so that degrees don't sneak into
/// projection math.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Radians(pub f32);

impl Radians {
    #[inline]
    pub fn from_degrees(d: f32) -> Self {
        Self(d.to_radians())
    }

    #[inline]
    pub fn to_radians(self) -> f32 {
        self.0
    }

    #[inline]
    pub fn to_degrees(self) -> f32 {
        self.0.to_degrees()
    }

    /// Clamps the angle into the `min..=max` range.
    #[inline]
    pub fn clamp(self, min: Radians, max: Radians) -> Self {
        Self(self.0.clamp(min.0, max.0))
    }
}

impl Mul<f32> for Radians {
    type Output = Radians;

    fn mul(self, rhs: f32) -> Self::Output {
        Radians(self.0 * rhs)
    }
}

impl Div<f32> for Radians {
    type Output = Radians;

    fn div(self, rhs: f32) -> Self::Output {
        Radians(self.0 / rhs)
    }
}

pub trait AngleExt {
    /// Interprets this float as a radian angle value
    fn radians(self) -> Radians;
    /// Interprets this float as a degree angle value
    fn degrees(self) -> Radians;
}

impl AngleExt for f32 {
    #[inline]
    fn radians(self) -> Radians {
        Radians(self)
    }

    #[inline]
    fn degrees(self) -> Radians {
        Radians::from_degrees(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn degrees_convert() {
        assert!((90.0f32.degrees().to_radians() - FRAC_PI_2).abs() < 1e-6);
        assert_eq!(FRAC_PI_2.radians(), Radians(FRAC_PI_2));
        assert!(((Radians(FRAC_PI_2) / 2.0).to_degrees() - 45.0).abs() < 1e-4);
    }
}
