//! 3x3 matrix type
use std::ops::{Add, Sub, Mul, Index, IndexMut};
use std::ops::{AddAssign, SubAssign};

use approx::{AbsDiffEq, RelativeEq, UlpsEq};

use super::Vector3D;

/// A 3x3 matrix type, stored in row-major order: `matrix[i][j]` is the entry
/// at row `i` and column `j`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(transparent)]
pub struct Matrix3([[f64; 3]; 3]);

impl Matrix3 {
    /// Create a new `Matrix3` from the given rows
    pub const fn new(data: [[f64; 3]; 3]) -> Matrix3 {
        Matrix3(data)
    }

    /// Create a new `Matrix3` with all entries set to 0
    pub const fn zero() -> Matrix3 {
        Matrix3([[0.0; 3]; 3])
    }

    /// Create the identity matrix
    pub const fn one() -> Matrix3 {
        Matrix3([
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ])
    }

    /// Get the row `i` of this matrix as a vector
    #[inline]
    pub fn row(&self, i: usize) -> Vector3D {
        Vector3D::from(self.0[i])
    }

    /// Get the column `j` of this matrix as a vector
    #[inline]
    pub fn column(&self, j: usize) -> Vector3D {
        Vector3D::new(self.0[0][j], self.0[1][j], self.0[2][j])
    }

    /// Get the trace of this matrix
    pub fn trace(&self) -> f64 {
        self[0][0] + self[1][1] + self[2][2]
    }

    /// Get the determinant of this matrix
    pub fn determinant(&self) -> f64 {
        let m = &self.0;
        m[0][0] * (m[1][1] * m[2][2] - m[2][1] * m[1][2])
      - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
      + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Get the inverse of this matrix.
    ///
    /// # Panics
    ///
    /// If the matrix is not invertible
    #[must_use]
    pub fn inverse(&self) -> Matrix3 {
        let determinant = self.determinant();
        assert!(determinant.abs() > f64::EPSILON, "this matrix is not invertible");

        let m = &self.0;
        let inv_det = 1.0 / determinant;
        Matrix3([
            [
                (m[1][1] * m[2][2] - m[2][1] * m[1][2]) * inv_det,
                (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det,
                (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det,
            ],
            [
                (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det,
                (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det,
                (m[1][0] * m[0][2] - m[0][0] * m[1][2]) * inv_det,
            ],
            [
                (m[1][0] * m[2][1] - m[2][0] * m[1][1]) * inv_det,
                (m[2][0] * m[0][1] - m[0][0] * m[2][1]) * inv_det,
                (m[0][0] * m[1][1] - m[1][0] * m[0][1]) * inv_det,
            ],
        ])
    }

    /// Get the transpose of this matrix
    #[must_use]
    pub fn transposed(&self) -> Matrix3 {
        let m = &self.0;
        Matrix3([
            [m[0][0], m[1][0], m[2][0]],
            [m[0][1], m[1][1], m[2][1]],
            [m[0][2], m[1][2], m[2][2]],
        ])
    }

    /// Check if this matrix is symmetric, up to the given absolute `tolerance`
    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        f64::abs(self[0][1] - self[1][0]) <= tolerance &&
        f64::abs(self[0][2] - self[2][0]) <= tolerance &&
        f64::abs(self[1][2] - self[2][1]) <= tolerance
    }
}

impl From<[[f64; 3]; 3]> for Matrix3 {
    fn from(data: [[f64; 3]; 3]) -> Matrix3 {
        Matrix3(data)
    }
}

impl Index<usize> for Matrix3 {
    type Output = [f64; 3];
    #[inline]
    fn index(&self, index: usize) -> &[f64; 3] {
        &self.0[index]
    }
}

impl IndexMut<usize> for Matrix3 {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut [f64; 3] {
        &mut self.0[index]
    }
}

impl_arithmetic!(
    Matrix3, Matrix3, Add, add, Matrix3,
    self, other,
    {
        let mut result = Matrix3::zero();
        for i in 0..3 {
            for j in 0..3 {
                result[i][j] = self[i][j] + other[i][j];
            }
        }
        result
    }
);

impl_arithmetic!(
    Matrix3, Matrix3, Sub, sub, Matrix3,
    self, other,
    {
        let mut result = Matrix3::zero();
        for i in 0..3 {
            for j in 0..3 {
                result[i][j] = self[i][j] - other[i][j];
            }
        }
        result
    }
);

impl_arithmetic!(
    Matrix3, Matrix3, Mul, mul, Matrix3,
    self, other,
    {
        let mut result = Matrix3::zero();
        for i in 0..3 {
            for j in 0..3 {
                for k in 0..3 {
                    result[i][j] += self[i][k] * other[k][j];
                }
            }
        }
        result
    }
);

impl_arithmetic!(
    Matrix3, Vector3D, Mul, mul, Vector3D,
    self, vector,
    Vector3D::new(
        self[0][0] * vector[0] + self[0][1] * vector[1] + self[0][2] * vector[2],
        self[1][0] * vector[0] + self[1][1] * vector[1] + self[1][2] * vector[2],
        self[2][0] * vector[0] + self[2][1] * vector[1] + self[2][2] * vector[2],
    )
);

lhs_scalar_arithmetic!(
    Matrix3, Mul, mul, Matrix3,
    self, other,
    {
        let mut result = Matrix3::zero();
        for i in 0..3 {
            for j in 0..3 {
                result[i][j] = self[i][j] * other;
            }
        }
        result
    }
);

impl_inplace_arithmetic!(
    Matrix3, Matrix3, AddAssign, add_assign,
    self, other,
    {
        for i in 0..3 {
            for j in 0..3 {
                self[i][j] += other[i][j];
            }
        }
    }
);

impl_inplace_arithmetic!(
    Matrix3, Matrix3, SubAssign, sub_assign,
    self, other,
    {
        for i in 0..3 {
            for j in 0..3 {
                self[i][j] -= other[i][j];
            }
        }
    }
);

impl AbsDiffEq for Matrix3 {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Matrix3, epsilon: f64) -> bool {
        (0..3).all(|i| (0..3).all(|j| f64::abs_diff_eq(&self[i][j], &other[i][j], epsilon)))
    }
}

impl RelativeEq for Matrix3 {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Matrix3, epsilon: f64, max_relative: f64) -> bool {
        (0..3).all(|i| (0..3).all(|j| f64::relative_eq(&self[i][j], &other[i][j], epsilon, max_relative)))
    }
}

impl UlpsEq for Matrix3 {
    fn default_max_ulps() -> u32 {
        f64::default_max_ulps()
    }

    fn ulps_eq(&self, other: &Matrix3, epsilon: f64, max_ulps: u32) -> bool {
        (0..3).all(|i| (0..3).all(|j| f64::ulps_eq(&self[i][j], &other[i][j], epsilon, max_ulps)))
    }
}
