// Eigen decomposition of 3x3 real symmetric matrices, using the cyclic Jacobi
// eigenvalue algorithm. See for example Numerical Recipes, 3rd edition,
// section 11.1.

use crate::{Matrix3, Vector3D};

/// Maximal number of Jacobi sweeps. Convergence is quadratic, and 3x3 matrices
/// usually converge in less than 6 sweeps.
const MAX_SWEEPS: usize = 50;

/// Eigendecomposition of a real symmetric 3x3 matrix into eigenvalues and
/// eigenvectors.
///
/// The decomposition is deterministic: the same input always produces the same
/// eigenvalues, eigenvectors and eigenvector signs.
#[derive(Debug, Clone, Copy)]
pub struct SymmetricEigen {
    /// Eigenvalues of the input matrix, sorted in increasing order
    pub eigenvalues: [f64; 3],
    /// Eigenvectors of the input matrix, stored as the columns of this
    /// matrix. Column `i` corresponds to `eigenvalues[i]`.
    pub eigenvectors: Matrix3,
}

impl SymmetricEigen {
    /// Compute the eigendecomposition of a symmetric real matrix. Only the
    /// upper triangle of `matrix` is used.
    pub fn new(matrix: Matrix3) -> SymmetricEigen {
        debug_assert!(
            matrix.is_symmetric(1e-9 * (1.0 + frobenius2(&matrix).sqrt())),
            "matrix is not symmetric"
        );

        let mut a = matrix;
        a[1][0] = a[0][1];
        a[2][0] = a[0][2];
        a[2][1] = a[1][2];

        let mut v = Matrix3::one();

        let tolerance = f64::EPSILON * f64::EPSILON * frobenius2(&a);
        for _ in 0..MAX_SWEEPS {
            let off_diagonal = a[0][1] * a[0][1] + a[0][2] * a[0][2] + a[1][2] * a[1][2];
            if off_diagonal <= tolerance {
                break;
            }

            for &(p, q) in &[(0, 1), (0, 2), (1, 2)] {
                jacobi_rotation(&mut a, &mut v, p, q);
            }
        }

        let mut eigenvalues = [a[0][0], a[1][1], a[2][2]];

        // Selection sort of eigenvalues and corresponding vectors
        for i in 0..2 {
            let mut k = i;
            for j in (i + 1)..3 {
                if eigenvalues[j] < eigenvalues[k] {
                    k = j;
                }
            }

            if k != i {
                eigenvalues.swap(i, k);
                for row in 0..3 {
                    let tmp = v[row][i];
                    v[row][i] = v[row][k];
                    v[row][k] = tmp;
                }
            }
        }

        SymmetricEigen {
            eigenvalues: eigenvalues,
            eigenvectors: v,
        }
    }

    /// Get the `i`-th eigenvector, corresponding to `self.eigenvalues[i]`
    pub fn eigenvector(&self, i: usize) -> Vector3D {
        self.eigenvectors.column(i)
    }

    /// Recreate the input matrix from the eigenvalues and eigenvectors
    pub fn recompose(&self) -> Matrix3 {
        let [l0, l1, l2] = self.eigenvalues;
        let diagonal = Matrix3::new([
            [l0, 0.0, 0.0],
            [0.0, l1, 0.0],
            [0.0, 0.0, l2],
        ]);
        return self.eigenvectors * diagonal * self.eigenvectors.transposed();
    }
}

/// Squared Frobenius norm of a matrix
fn frobenius2(matrix: &Matrix3) -> f64 {
    let mut sum = 0.0;
    for i in 0..3 {
        for j in 0..3 {
            sum += matrix[i][j] * matrix[i][j];
        }
    }
    return sum;
}

/// Apply a single Jacobi rotation in the `(p, q)` plane to zero out `a[p][q]`,
/// accumulating the rotation in `v`.
#[allow(clippy::many_single_char_names)]
fn jacobi_rotation(a: &mut Matrix3, v: &mut Matrix3, p: usize, q: usize) {
    let apq = a[p][q];
    if apq == 0.0 {
        return;
    }

    let theta = (a[q][q] - a[p][p]) / (2.0 * apq);
    // choose the smallest rotation angle, for stability
    let t = f64::signum(theta) / (f64::abs(theta) + f64::hypot(theta, 1.0));
    let c = 1.0 / f64::hypot(t, 1.0);
    let s = t * c;

    // a = a × J
    for k in 0..3 {
        let akp = a[k][p];
        let akq = a[k][q];
        a[k][p] = c * akp - s * akq;
        a[k][q] = s * akp + c * akq;
    }

    // a = J^T × a
    for k in 0..3 {
        let apk = a[p][k];
        let aqk = a[q][k];
        a[p][k] = c * apk - s * aqk;
        a[q][k] = s * apk + c * aqk;
    }

    a[p][q] = 0.0;
    a[q][p] = 0.0;

    // v = v × J
    for k in 0..3 {
        let vkp = v[k][p];
        let vkq = v[k][q];
        v[k][p] = c * vkp - s * vkq;
        v[k][q] = s * vkp + c * vkq;
    }
}
