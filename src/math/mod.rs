mod matrix;
mod quaternion;
mod vector;

pub use matrix::*;
pub use quaternion::*;
pub use vector::*;

use std::f32;

/// Anything shorter (or any determinant smaller) than this is treated as zero.
pub const EPSILON: f32 = 0.000_001;

const TAU: f32 = f32::consts::PI * 2.0;

/// Wrap an angle in radians between \[0 - TAU\]
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    angle.rem_euclid(TAU)
}

#[inline]
pub fn degrees(degrees: f32) -> f32 {
    degrees * f32::consts::PI / 180.0
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wraps_angles() {
        assert!((normalize_angle(-0.5) - (TAU - 0.5)).abs() < 1e-5);
        assert!((normalize_angle(TAU + 0.25) - 0.25).abs() < 1e-5);
        assert!((normalize_angle(1.0) - 1.0).abs() < 1e-6);
    }
}
