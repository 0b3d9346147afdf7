use crate::math::Quaternion;
use std::{
    cmp::PartialEq,
    convert::From,
    f32,
    ops::{Add, AddAssign, Index, IndexMut, Mul, Neg, Sub, SubAssign},
};

#[repr(C)]
#[derive(Copy, Clone, Default, Debug)]
pub struct Vector3(pub [f32; 3]);

unsafe impl bytemuck::Zeroable for Vector3 {}

unsafe impl bytemuck::Pod for Vector3 {}

impl Vector3 {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Vector3 {
        Vector3([x, y, z])
    }

    #[inline]
    pub const fn splat(f: f32) -> Vector3 {
        Vector3([f, f, f])
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.0[0]
    }

    #[inline]
    pub fn set_x(&mut self, x: f32) {
        self.0[0] = x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.0[1]
    }

    #[inline]
    pub fn set_y(&mut self, y: f32) {
        self.0[1] = y
    }

    #[inline]
    pub fn z(&self) -> f32 {
        self.0[2]
    }

    #[inline]
    pub fn set_z(&mut self, z: f32) {
        self.0[2] = z
    }

    #[inline]
    pub const fn up() -> Vector3 {
        Vector3([0.0, 1.0, 0.0])
    }

    #[inline]
    pub const fn right() -> Vector3 {
        Vector3([1.0, 0.0, 0.0])
    }

    /// Local "forward" of an entity. Note the render pipeline looks down -z, see
    /// `Pointer::ray_direction` for where that mismatch gets corrected.
    #[inline]
    pub const fn forward() -> Vector3 {
        Vector3([0.0, 0.0, 1.0])
    }

    #[inline]
    pub fn widened(&self, w: f32) -> Vector4 {
        Vector4([self.0[0], self.0[1], self.0[2], w])
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.squared_normal().sqrt()
    }

    #[inline]
    pub fn squared_normal(&self) -> f32 {
        self.dot(*self)
    }

    /// Unit-length copy. A zero vector stays a zero vector instead of turning into NaNs.
    #[inline]
    pub fn normalized(&self) -> Vector3 {
        let squared = self.squared_normal();
        if squared > 0.0 {
            *self * (1.0 / squared.sqrt())
        } else {
            *self
        }
    }

    #[inline]
    pub fn cross(&self, rhs: Vector3) -> Vector3 {
        Vector3([
            self.0[1] * rhs.0[2] - self.0[2] * rhs.0[1],
            self.0[2] * rhs.0[0] - self.0[0] * rhs.0[2],
            self.0[0] * rhs.0[1] - self.0[1] * rhs.0[0],
        ])
    }

    #[inline]
    pub fn rotated(&self, rotation: Quaternion) -> Vector3 {
        (rotation * *self * rotation.conjugated()).0.narrowed()
    }

    #[inline]
    pub fn dot(&self, rhs: Vector3) -> f32 {
        (self.0[0] * rhs.0[0]) + (self.0[1] * rhs.0[1]) + (self.0[2] * rhs.0[2])
    }

    #[inline]
    pub fn approx_eq(&self, rhs: Vector3, epsilon: f32) -> bool {
        self.0
            .iter()
            .zip(rhs.0.iter())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }

    #[inline]
    pub fn to_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

impl PartialEq for Vector3 {
    #[inline]
    fn eq(&self, rhs: &Vector3) -> bool {
        self.approx_eq(*rhs, f32::EPSILON)
    }
}

impl Add for Vector3 {
    type Output = Vector3;
    #[inline]
    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3([
            self.0[0] + rhs.0[0],
            self.0[1] + rhs.0[1],
            self.0[2] + rhs.0[2],
        ])
    }
}

impl AddAssign for Vector3 {
    #[inline]
    fn add_assign(&mut self, rhs: Vector3) {
        self.0[0] += rhs.0[0];
        self.0[1] += rhs.0[1];
        self.0[2] += rhs.0[2];
    }
}

impl Sub for Vector3 {
    type Output = Vector3;
    #[inline]
    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3([
            self.0[0] - rhs.0[0],
            self.0[1] - rhs.0[1],
            self.0[2] - rhs.0[2],
        ])
    }
}

impl SubAssign for Vector3 {
    #[inline]
    fn sub_assign(&mut self, rhs: Vector3) {
        self.0[0] -= rhs.0[0];
        self.0[1] -= rhs.0[1];
        self.0[2] -= rhs.0[2];
    }
}

impl Mul<f32> for Vector3 {
    type Output = Vector3;
    #[inline]
    fn mul(self, rhs: f32) -> Vector3 {
        Vector3([self.0[0] * rhs, self.0[1] * rhs, self.0[2] * rhs])
    }
}

impl Neg for Vector3 {
    type Output = Vector3;
    #[inline]
    fn neg(self) -> Vector3 {
        Vector3([-self.0[0], -self.0[1], -self.0[2]])
    }
}

impl Index<usize> for Vector3 {
    type Output = f32;
    #[inline]
    fn index(&self, index: usize) -> &f32 {
        &self.0[index]
    }
}

impl IndexMut<usize> for Vector3 {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut f32 {
        &mut self.0[index]
    }
}

impl From<(f32, f32, f32)> for Vector3 {
    #[inline]
    fn from(value: (f32, f32, f32)) -> Vector3 {
        Vector3([value.0, value.1, value.2])
    }
}

impl From<[f32; 3]> for Vector3 {
    #[inline]
    fn from(value: [f32; 3]) -> Vector3 {
        Vector3(value)
    }
}

#[repr(C)]
#[derive(Copy, Clone, Default, Debug)]
pub struct Vector4(pub [f32; 4]);

unsafe impl bytemuck::Zeroable for Vector4 {}

unsafe impl bytemuck::Pod for Vector4 {}

impl Vector4 {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Vector4 {
        Vector4([x, y, z, w])
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.0[0]
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.0[1]
    }

    #[inline]
    pub fn z(&self) -> f32 {
        self.0[2]
    }

    #[inline]
    pub fn w(&self) -> f32 {
        self.0[3]
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.dot(*self).sqrt()
    }

    #[inline]
    pub fn normalized(&self) -> Vector4 {
        let length = self.length();
        if length > 0.0 {
            *self * (1.0 / length)
        } else {
            *self
        }
    }

    #[inline]
    pub fn narrowed(&self) -> Vector3 {
        Vector3([self.0[0], self.0[1], self.0[2]])
    }

    #[inline]
    pub fn dot(&self, rhs: Vector4) -> f32 {
        (self.0[0] * rhs.0[0])
            + (self.0[1] * rhs.0[1])
            + (self.0[2] * rhs.0[2])
            + (self.0[3] * rhs.0[3])
    }

    #[inline]
    pub fn approx_eq(&self, rhs: Vector4, epsilon: f32) -> bool {
        self.0
            .iter()
            .zip(rhs.0.iter())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

impl PartialEq for Vector4 {
    #[inline]
    fn eq(&self, rhs: &Vector4) -> bool {
        self.approx_eq(*rhs, f32::EPSILON)
    }
}

impl Neg for Vector4 {
    type Output = Vector4;
    #[inline]
    fn neg(self) -> Vector4 {
        Vector4([-self.0[0], -self.0[1], -self.0[2], -self.0[3]])
    }
}

impl Index<usize> for Vector4 {
    type Output = f32;
    #[inline]
    fn index(&self, index: usize) -> &f32 {
        &self.0[index]
    }
}

impl IndexMut<usize> for Vector4 {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut f32 {
        &mut self.0[index]
    }
}

impl Add for Vector4 {
    type Output = Vector4;
    #[inline]
    fn add(self, rhs: Vector4) -> Vector4 {
        Vector4([
            self.0[0] + rhs.0[0],
            self.0[1] + rhs.0[1],
            self.0[2] + rhs.0[2],
            self.0[3] + rhs.0[3],
        ])
    }
}

impl Mul<f32> for Vector4 {
    type Output = Vector4;
    #[inline]
    fn mul(self, rhs: f32) -> Vector4 {
        Vector4([
            self.0[0] * rhs,
            self.0[1] * rhs,
            self.0[2] * rhs,
            self.0[3] * rhs,
        ])
    }
}

impl From<(f32, f32, f32, f32)> for Vector4 {
    #[inline]
    fn from(value: (f32, f32, f32, f32)) -> Vector4 {
        Vector4([value.0, value.1, value.2, value.3])
    }
}
