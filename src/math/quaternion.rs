use crate::math::{Vector3, Vector4};
use std::ops::{Mul, MulAssign};

#[repr(C)]
#[derive(Copy, Clone, Default, Debug, PartialEq)]
pub struct Quaternion(pub Vector4);

unsafe impl bytemuck::Zeroable for Quaternion {}

unsafe impl bytemuck::Pod for Quaternion {}

/// Think of it like a unit vector with a 4th "twist" component.
impl Quaternion {
    #[inline]
    pub const fn identity() -> Quaternion {
        Quaternion(Vector4([0.0, 0.0, 0.0, 1.0]))
    }

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Quaternion {
        Quaternion(Vector4([x, y, z, w]))
    }

    /// The axis is used as given, pass a unit vector to get a unit quaternion.
    #[inline]
    pub fn from_axis_angle(axis: Vector3, angle: f32) -> Quaternion {
        let half_theta = angle / 2.0;
        let sin_half_theta = half_theta.sin();
        let cos_half_theta = half_theta.cos();
        Quaternion((axis * sin_half_theta).widened(cos_half_theta))
    }

    /// Recover `(axis, angle)` from a unit quaternion.
    ///
    /// A zero rotation has no meaningful axis, so it reports `(1, 0, 0)` rather than
    /// dividing by zero.
    pub fn axis_angle(&self) -> (Vector3, f32) {
        let angle = self.0[3].max(-1.0).min(1.0).acos() * 2.0;
        let sin_half_theta = (angle / 2.0).sin();
        if sin_half_theta.abs() <= f32::EPSILON {
            (Vector3::right(), angle)
        } else {
            (self.0.narrowed() * (1.0 / sin_half_theta), angle)
        }
    }

    #[inline]
    pub fn normalized(&self) -> Quaternion {
        Quaternion(self.0.normalized())
    }

    #[inline]
    pub fn conjugated(&self) -> Quaternion {
        Quaternion(Vector4([-self.0[0], -self.0[1], -self.0[2], self.0[3]]))
    }

    #[inline]
    pub fn forward_axis(&self) -> Vector3 {
        Vector3::forward().rotated(*self)
    }
}

impl MulAssign<Quaternion> for Quaternion {
    #[inline]
    fn mul_assign(&mut self, rhs: Quaternion) {
        *self = *self * rhs;
    }
}

impl Mul<Quaternion> for Quaternion {
    type Output = Quaternion;
    #[rustfmt::skip]
    fn mul(self, rhs: Quaternion) -> Quaternion {
        Quaternion(Vector4([
            self.0[0] * rhs.0[3] + self.0[3] * rhs.0[0] + self.0[1] * rhs.0[2] - self.0[2] * rhs.0[1],
            self.0[1] * rhs.0[3] + self.0[3] * rhs.0[1] + self.0[2] * rhs.0[0] - self.0[0] * rhs.0[2],
            self.0[2] * rhs.0[3] + self.0[3] * rhs.0[2] + self.0[0] * rhs.0[1] - self.0[1] * rhs.0[0],
            self.0[3] * rhs.0[3] - self.0[0] * rhs.0[0] - self.0[1] * rhs.0[1] - self.0[2] * rhs.0[2],
        ]))
    }
}

impl Mul<Vector3> for Quaternion {
    type Output = Quaternion;
    fn mul(self, rhs: Vector3) -> Quaternion {
        Quaternion(Vector4([
            self.0[3] * rhs.0[0] + self.0[1] * rhs.0[2] - self.0[2] * rhs.0[1],
            self.0[3] * rhs.0[1] + self.0[2] * rhs.0[0] - self.0[0] * rhs.0[2],
            self.0[3] * rhs.0[2] + self.0[0] * rhs.0[1] - self.0[1] * rhs.0[0],
            -self.0[0] * rhs.0[0] - self.0[1] * rhs.0[1] - self.0[2] * rhs.0[2],
        ]))
    }
}
