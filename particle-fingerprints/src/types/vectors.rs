//! 3-dimensional vector type
use std::ops::{Add, Sub, Neg, Mul, Div, BitXor, Index, IndexMut};
use std::ops::{AddAssign, SubAssign, MulAssign, DivAssign};

use approx::{AbsDiffEq, RelativeEq, UlpsEq};

/// A 3-dimensional vector type, stored as three `f64` values.
///
/// `a * b` is the dot product between vectors and `a ^ b` the cross product;
/// `a * s` and `a / s` scale the vector by the scalar `s`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(transparent)]
pub struct Vector3D([f64; 3]);

impl Vector3D {
    /// Create a new `Vector3D` with components `x`, `y`, `z`
    pub const fn new(x: f64, y: f64, z: f64) -> Vector3D {
        Vector3D([x, y, z])
    }

    /// Create a new `Vector3D` with all components set to 0
    pub const fn zero() -> Vector3D {
        Vector3D([0.0, 0.0, 0.0])
    }

    /// Get the first component of this vector
    #[inline]
    pub fn x(&self) -> f64 {
        self.0[0]
    }

    /// Get the second component of this vector
    #[inline]
    pub fn y(&self) -> f64 {
        self.0[1]
    }

    /// Get the third component of this vector
    #[inline]
    pub fn z(&self) -> f64 {
        self.0[2]
    }

    /// Get the square of the euclidean norm of this vector
    #[inline]
    pub fn norm2(&self) -> f64 {
        self * self
    }

    /// Get the euclidean norm of this vector
    #[inline]
    pub fn norm(&self) -> f64 {
        f64::sqrt(self.norm2())
    }

    /// Get a normalized copy of this vector. The result contains NaN if this
    /// vector has a zero norm.
    #[inline]
    #[must_use]
    pub fn normalized(&self) -> Vector3D {
        self / self.norm()
    }

    /// Compute the tensor (outer) product `self ⊗ other` of two vectors
    pub fn tensorial(&self, other: &Vector3D) -> crate::Matrix3 {
        crate::Matrix3::new([
            [self[0] * other[0], self[0] * other[1], self[0] * other[2]],
            [self[1] * other[0], self[1] * other[1], self[1] * other[2]],
            [self[2] * other[0], self[2] * other[1], self[2] * other[2]],
        ])
    }
}

impl From<[f64; 3]> for Vector3D {
    fn from(array: [f64; 3]) -> Vector3D {
        Vector3D(array)
    }
}

impl From<Vector3D> for [f64; 3] {
    fn from(vector: Vector3D) -> [f64; 3] {
        vector.0
    }
}

impl Index<usize> for Vector3D {
    type Output = f64;
    #[inline]
    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl IndexMut<usize> for Vector3D {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.0[index]
    }
}

impl_arithmetic!(
    Vector3D, Vector3D, Add, add, Vector3D,
    self, other,
    Vector3D::new(self[0] + other[0], self[1] + other[1], self[2] + other[2])
);

impl_arithmetic!(
    Vector3D, Vector3D, Sub, sub, Vector3D,
    self, other,
    Vector3D::new(self[0] - other[0], self[1] - other[1], self[2] - other[2])
);

// dot product
impl_arithmetic!(
    Vector3D, Vector3D, Mul, mul, f64,
    self, other,
    self[0] * other[0] + self[1] * other[1] + self[2] * other[2]
);

// cross product
impl_arithmetic!(
    Vector3D, Vector3D, BitXor, bitxor, Vector3D,
    self, other,
    Vector3D::new(
        self[1] * other[2] - self[2] * other[1],
        self[2] * other[0] - self[0] * other[2],
        self[0] * other[1] - self[1] * other[0],
    )
);

lhs_scalar_arithmetic!(
    Vector3D, Mul, mul, Vector3D,
    self, other,
    Vector3D::new(self[0] * other, self[1] * other, self[2] * other)
);

rhs_scalar_arithmetic!(
    Vector3D, Mul, mul, Vector3D,
    self, other,
    Vector3D::new(self * other[0], self * other[1], self * other[2])
);

lhs_scalar_arithmetic!(
    Vector3D, Div, div, Vector3D,
    self, other,
    Vector3D::new(self[0] / other, self[1] / other, self[2] / other)
);

impl_inplace_arithmetic!(
    Vector3D, Vector3D, AddAssign, add_assign,
    self, other,
    {
        self[0] += other[0];
        self[1] += other[1];
        self[2] += other[2];
    }
);

impl_inplace_arithmetic!(
    Vector3D, Vector3D, SubAssign, sub_assign,
    self, other,
    {
        self[0] -= other[0];
        self[1] -= other[1];
        self[2] -= other[2];
    }
);

impl MulAssign<f64> for Vector3D {
    #[inline]
    fn mul_assign(&mut self, other: f64) {
        self[0] *= other;
        self[1] *= other;
        self[2] *= other;
    }
}

impl DivAssign<f64> for Vector3D {
    #[inline]
    fn div_assign(&mut self, other: f64) {
        self[0] /= other;
        self[1] /= other;
        self[2] /= other;
    }
}

impl Neg for Vector3D {
    type Output = Vector3D;
    #[inline]
    fn neg(self) -> Vector3D {
        Vector3D::new(-self[0], -self[1], -self[2])
    }
}

impl<'a> Neg for &'a Vector3D {
    type Output = Vector3D;
    #[inline]
    fn neg(self) -> Vector3D {
        Vector3D::new(-self[0], -self[1], -self[2])
    }
}

impl AbsDiffEq for Vector3D {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Vector3D, epsilon: f64) -> bool {
        f64::abs_diff_eq(&self[0], &other[0], epsilon) &&
        f64::abs_diff_eq(&self[1], &other[1], epsilon) &&
        f64::abs_diff_eq(&self[2], &other[2], epsilon)
    }
}

impl RelativeEq for Vector3D {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Vector3D, epsilon: f64, max_relative: f64) -> bool {
        f64::relative_eq(&self[0], &other[0], epsilon, max_relative) &&
        f64::relative_eq(&self[1], &other[1], epsilon, max_relative) &&
        f64::relative_eq(&self[2], &other[2], epsilon, max_relative)
    }
}

impl UlpsEq for Vector3D {
    fn default_max_ulps() -> u32 {
        f64::default_max_ulps()
    }

    fn ulps_eq(&self, other: &Vector3D, epsilon: f64, max_ulps: u32) -> bool {
        f64::ulps_eq(&self[0], &other[0], epsilon, max_ulps) &&
        f64::ulps_eq(&self[1], &other[1], epsilon, max_ulps) &&
        f64::ulps_eq(&self[2], &other[2], epsilon, max_ulps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_ulps_eq;

    #[test]
    fn arithmetic() {
        let a = Vector3D::new(2.0, 3.5, 4.75);
        let b = Vector3D::new(6.25, -8.5, 7.5);

        assert_eq!(a + b, Vector3D::new(8.25, -5.0, 12.25));
        assert_eq!(a - b, Vector3D::new(-4.25, 12.0, -2.75));
        assert_eq!(-a, Vector3D::new(-2.0, -3.5, -4.75));

        assert_eq!(a * 2.0, Vector3D::new(4.0, 7.0, 9.5));
        assert_eq!(2.0 * a, Vector3D::new(4.0, 7.0, 9.5));
        assert_eq!(a / 2.0, Vector3D::new(1.0, 1.75, 2.375));

        let mut c = a;
        c += b;
        assert_eq!(c, a + b);
        c -= b;
        assert_eq!(c, a);
        c *= 2.0;
        assert_eq!(c, a * 2.0);
        c /= 2.0;
        assert_eq!(c, a);
    }

    #[test]
    fn dot_cross() {
        let a = Vector3D::new(1.0, 0.0, 0.0);
        let b = Vector3D::new(0.0, 1.0, 0.0);

        assert_eq!(a * b, 0.0);
        assert_eq!(a ^ b, Vector3D::new(0.0, 0.0, 1.0));

        let c = Vector3D::new(2.0, 3.5, 4.8);
        let d = Vector3D::new(6.1, -8.5, 7.3);
        assert_ulps_eq!(c * d, 2.0 * 6.1 - 3.5 * 8.5 + 4.8 * 7.3);
        assert_ulps_eq!((c ^ d) * c, 0.0, epsilon = 1e-12);
        assert_ulps_eq!((c ^ d) * d, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn norms() {
        let a = Vector3D::new(3.0, 0.0, -4.0);
        assert_eq!(a.norm2(), 25.0);
        assert_eq!(a.norm(), 5.0);
        assert_ulps_eq!(a.normalized(), Vector3D::new(0.6, 0.0, -0.8));
    }

    #[test]
    fn tensorial() {
        let a = Vector3D::new(1.0, 2.0, 3.0);
        let b = Vector3D::new(4.0, 5.0, 6.0);
        let m = a.tensorial(&b);
        assert_eq!(m[0], [4.0, 5.0, 6.0]);
        assert_eq!(m[1], [8.0, 10.0, 12.0]);
        assert_eq!(m[2], [12.0, 15.0, 18.0]);
    }
}
