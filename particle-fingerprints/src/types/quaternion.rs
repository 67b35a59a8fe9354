//! Quaternions representing rotations in 3D
use std::ops::{Mul, Neg};

use super::{Matrix3, Vector3D};

/// A quaternion `w + x i + y j + z k`. Unit quaternions represent rotations in
/// 3D space, with `q` and `-q` representing the same rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    /// scalar (real) part
    pub w: f64,
    /// first imaginary component
    pub x: f64,
    /// second imaginary component
    pub y: f64,
    /// third imaginary component
    pub z: f64,
}

impl Default for Quaternion {
    fn default() -> Quaternion {
        Quaternion::identity()
    }
}

impl Quaternion {
    /// Create a new quaternion `w + x i + y j + z k`
    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Quaternion {
        Quaternion { w, x, y, z }
    }

    /// Get the quaternion representing the identity rotation
    pub const fn identity() -> Quaternion {
        Quaternion::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Create the unit quaternion for a rotation of `angle` radians around
    /// `axis`. The axis does not need to be normalized.
    pub fn from_axis_angle(axis: Vector3D, angle: f64) -> Quaternion {
        let axis = axis.normalized();
        let (sin, cos) = f64::sin_cos(0.5 * angle);
        Quaternion::new(cos, sin * axis[0], sin * axis[1], sin * axis[2])
    }

    /// Get the imaginary (vector) part of this quaternion
    pub fn vector(&self) -> Vector3D {
        Vector3D::new(self.x, self.y, self.z)
    }

    /// Get the conjugate of this quaternion. For unit quaternions, this is the
    /// inverse rotation.
    #[must_use]
    pub fn conjugate(&self) -> Quaternion {
        Quaternion::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Get the squared norm of this quaternion
    pub fn norm2(&self) -> f64 {
        self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Get the norm of this quaternion
    pub fn norm(&self) -> f64 {
        f64::sqrt(self.norm2())
    }

    /// Get a copy of this quaternion with unit norm
    #[must_use]
    pub fn normalized(&self) -> Quaternion {
        let norm = self.norm();
        Quaternion::new(self.w / norm, self.x / norm, self.y / norm, self.z / norm)
    }

    /// Get the rotation matrix corresponding to this quaternion. The
    /// quaternion is assumed to be normalized.
    pub fn rotation_matrix(&self) -> Matrix3 {
        let Quaternion { w, x, y, z } = *self;
        Matrix3::new([
            [1.0 - 2.0 * (y * y + z * z), 2.0 * (x * y - w * z),       2.0 * (x * z + w * y)],
            [2.0 * (x * y + w * z),       1.0 - 2.0 * (x * x + z * z), 2.0 * (y * z - w * x)],
            [2.0 * (x * z - w * y),       2.0 * (y * z + w * x),       1.0 - 2.0 * (x * x + y * y)],
        ])
    }

    /// Rotate `vector` with the rotation represented by this (normalized)
    /// quaternion
    pub fn rotate(&self, vector: Vector3D) -> Vector3D {
        self.rotation_matrix() * vector
    }
}

// Hamilton product
impl_arithmetic!(
    Quaternion, Quaternion, Mul, mul, Quaternion,
    self, other,
    Quaternion::new(
        self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
        self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
        self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
        self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
    )
);

impl Neg for Quaternion {
    type Output = Quaternion;
    fn neg(self) -> Quaternion {
        Quaternion::new(-self.w, -self.x, -self.y, -self.z)
    }
}
