use crate::math::{Quaternion, Vector3, Vector4, EPSILON};

use std::ops::{Index, IndexMut, Mul};

/// Column-major 4x4 matrix. `self.0[c]` is column `c`, so the translation lives in `self.0[3]`.
#[repr(C)]
#[derive(Copy, Clone, Default, Debug, PartialEq)]
pub struct Matrix4(pub [Vector4; 4]);

unsafe impl bytemuck::Zeroable for Matrix4 {}
unsafe impl bytemuck::Pod for Matrix4 {}

impl Matrix4 {
    #[inline]
    pub const fn new(x: Vector4, y: Vector4, z: Vector4, w: Vector4) -> Matrix4 {
        Matrix4([x, y, z, w])
    }

    #[inline]
    pub const fn identity() -> Matrix4 {
        Matrix4([
            Vector4([1.0, 0.0, 0.0, 0.0]),
            Vector4([0.0, 1.0, 0.0, 0.0]),
            Vector4([0.0, 0.0, 1.0, 0.0]),
            Vector4([0.0, 0.0, 0.0, 1.0]),
        ])
    }

    #[inline]
    pub fn from_cols_array(m: [f32; 16]) -> Matrix4 {
        Matrix4([
            Vector4([m[0], m[1], m[2], m[3]]),
            Vector4([m[4], m[5], m[6], m[7]]),
            Vector4([m[8], m[9], m[10], m[11]]),
            Vector4([m[12], m[13], m[14], m[15]]),
        ])
    }

    #[inline]
    pub fn to_cols_array(&self) -> [f32; 16] {
        bytemuck::cast(*self)
    }

    #[inline]
    pub fn translation(&self) -> Vector3 {
        self.0[3].narrowed()
    }

    /// Standard GL perspective projection, clip-space z in \[-1, 1\].
    #[inline]
    pub fn perspective(fov: f32, aspect_ratio: f32, near: f32, far: f32) -> Matrix4 {
        let depth = near - far;
        let tan_fov = (fov / 2.0).tan();
        Matrix4([
            Vector4([1.0 / (tan_fov * aspect_ratio), 0.0, 0.0, 0.0]),
            Vector4([0.0, 1.0 / tan_fov, 0.0, 0.0]),
            Vector4([0.0, 0.0, (near + far) / depth, -1.0]),
            Vector4([0.0, 0.0, (2.0 * far * near) / depth, 0.0]),
        ])
    }

    /// `self * T(v)`
    #[inline]
    pub fn translated(&self, v: Vector3) -> Matrix4 {
        let mut ret = *self;
        ret.0[3] = self.0[0] * v.0[0] + self.0[1] * v.0[1] + self.0[2] * v.0[2] + self.0[3];
        ret
    }

    /// `self * R(angle, axis)`. An axis too short to normalize leaves the matrix untouched.
    pub fn rotated(&self, angle: f32, axis: Vector3) -> Matrix4 {
        let length = axis.length();
        if length < EPSILON {
            return *self;
        }
        let axis = axis * (1.0 / length);
        let (x, y, z) = (axis.0[0], axis.0[1], axis.0[2]);
        let s = angle.sin();
        let c = angle.cos();
        let t = 1.0 - c;
        let rotation = Matrix4([
            Vector4([x * x * t + c, y * x * t + z * s, z * x * t - y * s, 0.0]),
            Vector4([x * y * t - z * s, y * y * t + c, z * y * t + x * s, 0.0]),
            Vector4([x * z * t + y * s, y * z * t - x * s, z * z * t + c, 0.0]),
            Vector4([0.0, 0.0, 0.0, 1.0]),
        ]);
        self * &rotation
    }

    /// `self * S(v)`
    #[inline]
    pub fn scaled(&self, v: Vector3) -> Matrix4 {
        Matrix4([
            self.0[0] * v.0[0],
            self.0[1] * v.0[1],
            self.0[2] * v.0[2],
            self.0[3],
        ])
    }

    #[inline]
    #[rustfmt::skip]
    pub fn transpose(&self) -> Matrix4 {
        Matrix4([
            Vector4([self.0[0].0[0], self.0[1].0[0], self.0[2].0[0], self.0[3].0[0]]),
            Vector4([self.0[0].0[1], self.0[1].0[1], self.0[2].0[1], self.0[3].0[1]]),
            Vector4([self.0[0].0[2], self.0[1].0[2], self.0[2].0[2], self.0[3].0[2]]),
            Vector4([self.0[0].0[3], self.0[1].0[3], self.0[2].0[3], self.0[3].0[3]]),
        ])
    }

    /// Invert via cofactor expansion.
    ///
    /// Returns `None` when the determinant is within `EPSILON` of zero. Nothing is written in
    /// that case, so callers decide what to fall back to.
    #[rustfmt::skip]
    pub fn inverse(&self) -> Option<Matrix4> {
        let a = self.to_cols_array();
        let (a00, a01, a02, a03) = (a[0], a[1], a[2], a[3]);
        let (a10, a11, a12, a13) = (a[4], a[5], a[6], a[7]);
        let (a20, a21, a22, a23) = (a[8], a[9], a[10], a[11]);
        let (a30, a31, a32, a33) = (a[12], a[13], a[14], a[15]);

        let b00 = a00 * a11 - a01 * a10;
        let b01 = a00 * a12 - a02 * a10;
        let b02 = a00 * a13 - a03 * a10;
        let b03 = a01 * a12 - a02 * a11;
        let b04 = a01 * a13 - a03 * a11;
        let b05 = a02 * a13 - a03 * a12;
        let b06 = a20 * a31 - a21 * a30;
        let b07 = a20 * a32 - a22 * a30;
        let b08 = a20 * a33 - a23 * a30;
        let b09 = a21 * a32 - a22 * a31;
        let b10 = a21 * a33 - a23 * a31;
        let b11 = a22 * a33 - a23 * a32;

        let det = b00 * b11 - b01 * b10 + b02 * b09 + b03 * b08 - b04 * b07 + b05 * b06;
        if det.abs() < EPSILON {
            return None;
        }
        let det = 1.0 / det;

        Some(Matrix4::from_cols_array([
            (a11 * b11 - a12 * b10 + a13 * b09) * det,
            (a02 * b10 - a01 * b11 - a03 * b09) * det,
            (a31 * b05 - a32 * b04 + a33 * b03) * det,
            (a22 * b04 - a21 * b05 - a23 * b03) * det,
            (a12 * b08 - a10 * b11 - a13 * b07) * det,
            (a00 * b11 - a02 * b08 + a03 * b07) * det,
            (a32 * b02 - a30 * b05 - a33 * b01) * det,
            (a20 * b05 - a22 * b02 + a23 * b01) * det,
            (a10 * b10 - a11 * b08 + a13 * b06) * det,
            (a01 * b08 - a00 * b10 - a03 * b06) * det,
            (a30 * b04 - a31 * b02 + a33 * b00) * det,
            (a21 * b02 - a20 * b04 - a23 * b00) * det,
            (a11 * b07 - a10 * b09 - a12 * b06) * det,
            (a00 * b09 - a01 * b07 + a02 * b06) * det,
            (a31 * b01 - a30 * b03 - a32 * b00) * det,
            (a20 * b03 - a21 * b01 + a22 * b00) * det,
        ]))
    }

    /// The inverse of the rotation described by `q`.
    ///
    /// A view matrix is the inverse of the camera's world orientation, so poses get turned
    /// into view-space rotations with this directly.
    pub fn inverse_rotation(q: Quaternion) -> Matrix4 {
        let rotation = Matrix4::from(q);
        rotation.inverse().unwrap_or_else(|| {
            log::warn!("Orientation {:?} is not invertible, using identity", q);
            Matrix4::identity()
        })
    }

    #[inline]
    pub fn approx_eq(&self, rhs: &Matrix4, epsilon: f32) -> bool {
        self.0
            .iter()
            .zip(rhs.0.iter())
            .all(|(a, b)| a.approx_eq(*b, epsilon))
    }

    #[inline]
    pub fn to_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

impl From<Quaternion> for Matrix4 {
    #[inline]
    fn from(q: Quaternion) -> Matrix4 {
        let [x, y, z, w] = (q.0).0;
        let (x2, y2, z2) = (x + x, y + y, z + z);
        let (xx, yx, yy) = (x * x2, y * x2, y * y2);
        let (zx, zy, zz) = (z * x2, z * y2, z * z2);
        let (wx, wy, wz) = (w * x2, w * y2, w * z2);
        Matrix4([
            Vector4([1.0 - yy - zz, yx + wz, zx - wy, 0.0]),
            Vector4([yx - wz, 1.0 - xx - zz, zy + wx, 0.0]),
            Vector4([zx + wy, zy - wx, 1.0 - xx - yy, 0.0]),
            Vector4([0.0, 0.0, 0.0, 1.0]),
        ])
    }
}

impl Index<usize> for Matrix4 {
    type Output = Vector4;
    #[inline]
    fn index(&self, index: usize) -> &Vector4 {
        &self.0[index]
    }
}

impl IndexMut<usize> for Matrix4 {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Vector4 {
        &mut self.0[index]
    }
}

impl Mul<&Matrix4> for &Matrix4 {
    type Output = Matrix4;

    fn mul(self, rhs: &Matrix4) -> Matrix4 {
        let mut ret = Matrix4::default();
        for column in 0..4 {
            ret[column] = self[0] * rhs[column][0]
                + self[1] * rhs[column][1]
                + self[2] * rhs[column][2]
                + self[3] * rhs[column][3];
        }
        ret
    }
}

impl Mul<Vector4> for &Matrix4 {
    type Output = Vector4;

    #[inline]
    fn mul(self, rhs: Vector4) -> Vector4 {
        self[0] * rhs[0] + self[1] * rhs[1] + self[2] * rhs[2] + self[3] * rhs[3]
    }
}
