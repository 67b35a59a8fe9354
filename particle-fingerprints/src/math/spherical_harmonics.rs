#![allow(clippy::range_plus_one)]

use std::f64::consts::SQRT_2;

use num_complex::Complex64;

/// `\sqrt{\frac{1}{2 \pi}}`
const SQRT_1_OVER_2PI: f64 = 0.3989422804014327;
/// `\sqrt{3}`
const SQRT_3: f64 = 1.7320508075688772;
/// `\sqrt{3 / 2}`
const SQRT_3_OVER_2: f64 = 1.224744871391589;

/// Get the number of complex coefficients produced by a spherical harmonics
/// evaluation up to `max_angular`.
///
/// This counts all `(l, m)` pairs with `0 <= m <= l <= max_angular`, and if
/// `negative_m` is set, the additional pairs with `-l <= m < 0`.
pub fn spherical_harmonics_count(max_angular: usize, negative_m: bool) -> usize {
    let positive = (max_angular + 1) * (max_angular + 2) / 2;
    if negative_m && max_angular > 0 {
        // same as the number of positive m up to max_angular - 1
        positive + max_angular * (max_angular + 1) / 2
    } else {
        positive
    }
}

/// Array storing data for `0 <= l <= l_max`, `0 <= m <= l`. This type
/// implements `Index<[usize; 2]>` and `IndexMut<[usize; 2]>` to allow writing
/// code like
///
/// ```ignore
/// let mut array = LegendreArray::new(8);
/// array[[6, 3]] = 3.0;
///
/// // this is an error m > l
/// array[[6, 7]]
/// // this is an error l > l_max
/// array[[9, 7]]
/// ```
#[derive(Clone)]
struct LegendreArray {
    max_angular: usize,
    data: Vec<f64>,
}

impl LegendreArray {
    /// Create a new `LegendreArray` with the given maximal angular degree, and
    /// all elements set to zero.
    pub fn new(max_angular: usize) -> LegendreArray {
        LegendreArray {
            max_angular: max_angular,
            data: vec![0.0; spherical_harmonics_count(max_angular, false)],
        }
    }

    #[inline]
    fn linear_index(&self, index: [usize; 2]) -> usize {
        let [l, m] = index;
        debug_assert!(l <= self.max_angular && m <= l);
        return m + l * (l + 1) / 2;
    }
}

impl std::ops::Index<[usize; 2]> for LegendreArray {
    type Output = f64;
    fn index(&self, index: [usize; 2]) -> &f64 {
        &self.data[self.linear_index(index)]
    }
}

impl std::ops::IndexMut<[usize; 2]> for LegendreArray {
    fn index_mut(&mut self, index: [usize; 2]) -> &mut f64 {
        let i = self.linear_index(index);
        &mut self.data[i]
    }
}

impl std::fmt::Debug for LegendreArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LegendreArray[\n  l \\ m  ")?;
        for m in 0..(self.max_angular + 1) {
            write!(f, " {: ^12}", m)?;
        }
        writeln!(f)?;
        for l in 0..(self.max_angular + 1) {
            write!(f, "  {: <8}", l)?;
            for m in 0..=l {
                write!(f, " {:+.9}", self[[l, m]])?;
            }
            writeln!(f)?;
        }
        write!(f, "]")?;
        Ok(())
    }
}

/// Evaluate complex spherical harmonics `Y_l^m(φ, θ)` for all `l` up to a
/// maximal degree, at a single point on the sphere.
///
/// The harmonics are orthonormal over the sphere and include the
/// Condon-Shortley phase `(-1)^m`. Values for negative `m` follow from
/// `Y_l^{-m} = (-1)^m conj(Y_l^m)`.
///
/// The associated Legendre polynomials follow the recursion described in
/// <https://arxiv.org/abs/1410.1748>.
///
/// An instance carries mutable scratch space, so each thread should use its
/// own evaluator.
#[derive(Debug, Clone)]
pub struct SphericalHarmonics {
    max_angular: usize,
    /// array of normalized associated Legendre polynomials, multiplied by
    /// `sqrt(2)`
    legendre_polynomials: LegendreArray,
    /// 'A' coefficient from the arxiv paper to compute Legendre polynomials
    coefficient_a: LegendreArray,
    /// 'B' coefficient from the arxiv paper to compute Legendre polynomials
    coefficient_b: LegendreArray,
    /// `e^{i m θ}` for `0 <= m <= max_angular`
    phases: Vec<Complex64>,
}

impl SphericalHarmonics {
    /// Build a new `SphericalHarmonics` evaluator with the given `l_max`, and
    /// pre-compute all required quantities
    pub fn new(max_angular: usize) -> SphericalHarmonics {
        let mut coefficient_a = LegendreArray::new(max_angular);
        let mut coefficient_b = LegendreArray::new(max_angular);
        for l in 2..(max_angular + 1) {
            let ls = (l * l) as f64;
            let lm1s = ((l - 1) * (l - 1)) as f64;
            for m in 0..(l - 1) {
                let ms = (m * m) as f64;
                coefficient_a[[l, m]] = f64::sqrt((4.0 * ls - 1.0) / (ls - ms));
                coefficient_b[[l, m]] = -f64::sqrt((lm1s - ms) / (4.0 * lm1s - 1.0));
            }
        }

        SphericalHarmonics {
            max_angular: max_angular,
            legendre_polynomials: LegendreArray::new(max_angular),
            coefficient_a: coefficient_a,
            coefficient_b: coefficient_b,
            phases: vec![Complex64::new(1.0, 0.0); max_angular + 1],
        }
    }

    /// Get the maximal degree `l` of this evaluator
    pub fn max_angular(&self) -> usize {
        self.max_angular
    }

    /// Evaluate the Legendre polynomials at `cos(φ)`, and fill
    /// `self.legendre_polynomials` with the resulting values
    fn compute_legendre_polynomials(&mut self, cos_phi: f64, sin_phi: f64) {
        let mut value = SQRT_1_OVER_2PI;
        self.legendre_polynomials[[0, 0]] = value;

        if self.max_angular > 0 {
            self.legendre_polynomials[[1, 0]] = cos_phi * SQRT_3 * value;
            value *= -SQRT_3_OVER_2 * sin_phi;
            self.legendre_polynomials[[1, 1]] = value;

            let a = &self.coefficient_a;
            let b = &self.coefficient_b;
            let p = &mut self.legendre_polynomials;

            for l in 2..(self.max_angular + 1) {
                for m in 0..(l - 1) {
                    p[[l, m]] = a[[l, m]] * (cos_phi * p[[l - 1, m]] + b[[l, m]] * p[[l - 2, m]]);
                }

                p[[l, l - 1]] = cos_phi * f64::sqrt(2.0 * l as f64 + 1.0) * value;
                value *= -f64::sqrt(1.0 + 0.5 / l as f64) * sin_phi;
                p[[l, l]] = value;
            }
        }
    }

    /// Evaluate all spherical harmonics at the polar angle `phi` (in `[0, π]`,
    /// measured from the `+z` axis) and azimuthal angle `theta` (measured from
    /// the `+x` axis in the `xy` plane). The values can then be accessed with
    /// [`SphericalHarmonics::values`] or [`SphericalHarmonics::value`].
    #[time_graph::instrument(name = "SphericalHarmonics::compute")]
    pub fn compute(&mut self, phi: f64, theta: f64) {
        let (sin_phi, cos_phi) = f64::sin_cos(phi);
        self.compute_legendre_polynomials(cos_phi, sin_phi);

        for (m, phase) in self.phases.iter_mut().enumerate() {
            *phase = Complex64::cis(m as f64 * theta);
        }
    }

    /// Get the value of `Y_l^m` from the last call to `compute`.
    ///
    /// # Panics
    ///
    /// If `l` is larger than the maximal degree of this evaluator, or if `m`
    /// is not in `[-l, l]`.
    #[inline]
    pub fn value(&self, l: usize, m: isize) -> Complex64 {
        assert!(l <= self.max_angular, "l={} is larger than max_angular={}", l, self.max_angular);
        let m_abs = m.unsigned_abs();
        assert!(m_abs <= l, "m={} is not inside [-l, l] for l={}", m, l);

        let value = self.phases[m_abs] * (self.legendre_polynomials[[l, m_abs]] / SQRT_2);
        if m >= 0 {
            value
        } else if m_abs % 2 == 0 {
            value.conj()
        } else {
            -value.conj()
        }
    }

    /// Iterate over the values from the last call to `compute`, ordered by
    /// increasing `l`. For a given `l`, the values for `m = 0, 1, ..., l` come
    /// first, followed by `m = -1, -2, ..., -l` if `negative_m` is `true`.
    ///
    /// The iterator yields exactly `spherical_harmonics_count(max_angular,
    /// negative_m)` values, and can be re-created as many times as needed.
    pub fn values(&self, negative_m: bool) -> impl Iterator<Item = Complex64> + '_ {
        (0..=self.max_angular).flat_map(move |l| {
            let n_negative = if negative_m { l } else { 0 };
            let positive = (0..=l).map(move |m| self.value(l, m as isize));
            let negative = (1..=n_negative).map(move |m| self.value(l, -(m as isize)));
            positive.chain(negative)
        })
    }
}
