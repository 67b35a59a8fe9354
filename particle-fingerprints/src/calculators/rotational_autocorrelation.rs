use log::warn;
use num_complex::Complex64;
use num_traits::Zero;
use rayon::prelude::*;

use crate::{Error, Quaternion};

use super::CalculatorBase;

/// Largest degree for which the hyperspherical harmonics are accurate. The
/// sum in `hypersphere_harmonic` alternates in sign, and for larger `l` the
/// cancellation between terms (amplified by the factorial prefactor) loses
/// most significant digits: perfect self-correlation is off by `1e-12` at
/// `l = 40`, `1e-7` at `l = 80`, and meaningless by `l = 120`.
const MAX_L: usize = 40;

/// Map a quaternion to its pair of complex (Cayley-Klein) coordinates
/// `(xi, zeta)` on the 3-sphere, with `xi = x + i y` and `zeta = z + i w`.
pub fn quat_to_greek(quaternion: &Quaternion) -> (Complex64, Complex64) {
    let xi = Complex64::new(quaternion.x, quaternion.y);
    let zeta = Complex64::new(quaternion.z, quaternion.w);
    return (xi, zeta);
}

/// Parameters for the rotational autocorrelation calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
pub struct RotationalAutocorrelationParameters {
    /// Degree of the hyperspherical harmonics. This should be an even number,
    /// odd values give results which depend on the sign of the quaternions.
    pub l: usize,
}

/// Rotational autocorrelation of a set of orientations with respect to
/// reference orientations.
///
/// This is the rotational analog of the self intermediate scattering
/// function: for each particle, hyperspherical harmonics of degree `l` are
/// evaluated at the reference and current orientations and correlated with
/// one another. The global value is the real part of the average over all
/// particles, normalized so that identical orientations give exactly 1. For
/// a particle rotated by an angle `α` from its reference orientation, the
/// correlation is `sin((l + 1) α / 2) / ((l + 1) sin(α / 2))`.
///
/// The result is invariant under any rotation applied to both the reference
/// and current orientations.
#[derive(Debug, Clone)]
pub struct RotationalAutocorrelation {
    l: usize,
    /// `n!` for `n` in `0..=l`
    factorials: Vec<f64>,
    /// number of orientations in the last call to compute
    n_orientations: usize,
    /// per-particle correlation from the last call to compute
    values: Vec<Complex64>,
    /// global correlation from the last call to compute
    autocorrelation: f64,
}

impl CalculatorBase for RotationalAutocorrelation {
    fn name(&self) -> String {
        "rotational autocorrelation".into()
    }

    fn parameters(&self) -> String {
        let parameters = RotationalAutocorrelationParameters { l: self.l };
        serde_json::to_string(&parameters).expect("failed to serialize to JSON")
    }
}

impl RotationalAutocorrelation {
    /// Create a new `RotationalAutocorrelation` for hyperspherical harmonics
    /// of degree `l`.
    pub fn new(l: usize) -> Result<RotationalAutocorrelation, Error> {
        if l > MAX_L {
            return Err(Error::InvalidParameter(format!(
                "l must be at most {} for rotational autocorrelation, got {}",
                MAX_L, l
            )));
        }

        if l % 2 == 1 {
            warn!(
                "using an odd value of l ({}) for rotational autocorrelation, \
                the results will depend on the sign of the quaternions", l
            );
        }

        let mut factorials = Vec::with_capacity(l + 1);
        factorials.push(1.0);
        for n in 1..=l {
            factorials.push(n as f64 * factorials[n - 1]);
        }

        return Ok(RotationalAutocorrelation {
            l: l,
            factorials: factorials,
            n_orientations: 0,
            values: Vec::new(),
            autocorrelation: 0.0,
        });
    }

    /// Create a new `RotationalAutocorrelation` from parameters serialized as
    /// JSON
    pub fn from_json(parameters: &str) -> Result<RotationalAutocorrelation, Error> {
        let parameters: RotationalAutocorrelationParameters = serde_json::from_str(parameters)?;
        return RotationalAutocorrelation::new(parameters.l);
    }

    /// Get the degree of the hyperspherical harmonics
    pub fn l(&self) -> usize {
        self.l
    }

    /// Get the number of orientations used in the last call to `compute`
    pub fn n_orientations(&self) -> usize {
        self.n_orientations
    }

    /// Get the per-particle correlation from the last call to `compute`.
    /// These values are not normalized, and are equal to `l + 1` for a
    /// particle in its reference orientation.
    pub fn values(&self) -> &[Complex64] {
        &self.values
    }

    /// Get the global autocorrelation from the last call to `compute`. This
    /// is `NaN` if the last call used an empty set of orientations.
    pub fn autocorrelation(&self) -> f64 {
        self.autocorrelation
    }

    /// Evaluate the hyperspherical harmonic `U_{m1, m2}` of degree `self.l()`
    /// at the complex coordinates `(xi, zeta)`, obtained from
    /// [`quat_to_greek`].
    ///
    /// For a fixed point on the 3-sphere, the `(l + 1) x (l + 1)` matrix of
    /// these values is unitary.
    ///
    /// # Panics
    ///
    /// If `m1` or `m2` is larger than `l`.
    pub fn hypersphere_harmonic(&self, xi: Complex64, zeta: Complex64, m1: usize, m2: usize) -> Complex64 {
        let l = self.l;
        assert!(m1 <= l && m2 <= l, "m1={} and m2={} must be at most l={}", m1, m2, l);
        let factorial = &self.factorials;

        let k_min = (m1 + m2).saturating_sub(l);
        let k_max = usize::min(m1, m2);

        let mut sum = Complex64::zero();
        for k in k_min..=k_max {
            let numerator = xi.conj().powu(k as u32)
                * zeta.conj().powu((m1 - k) as u32)
                * zeta.powu((m2 - k) as u32)
                * (-xi).powu((l + k - m1 - m2) as u32);

            let denominator = factorial[k] * factorial[l + k - m1 - m2] * factorial[m1 - k] * factorial[m2 - k];
            sum += numerator / denominator;
        }

        let prefactor = f64::sqrt(factorial[m1] * factorial[l - m1]) * f64::sqrt(factorial[m2] * factorial[l - m2]);
        return prefactor * sum;
    }

    /// Correlation of all hyperspherical harmonics between two orientations,
    /// not normalized
    fn correlation(&self, reference: &Quaternion, current: &Quaternion) -> Complex64 {
        let (xi_0, zeta_0) = quat_to_greek(reference);
        let (xi, zeta) = quat_to_greek(current);

        let mut sum = Complex64::zero();
        for m1 in 0..=self.l {
            for m2 in 0..=self.l {
                let u_0 = self.hypersphere_harmonic(xi_0, zeta_0, m1, m2);
                let u = self.hypersphere_harmonic(xi, zeta, m1, m2);
                sum += u_0 * u.conj();
            }
        }
        return sum;
    }

    /// Compute the rotational autocorrelation between the `references` and
    /// the current `orientations`. Both slices must have the same length, and
    /// contain unit quaternions.
    ///
    /// If this function returns an error, the results of the previous call
    /// are left untouched.
    #[time_graph::instrument(name = "RotationalAutocorrelation::compute")]
    pub fn compute(&mut self, references: &[Quaternion], orientations: &[Quaternion]) -> Result<(), Error> {
        if references.len() != orientations.len() {
            return Err(Error::InvalidParameter(format!(
                "expected the same number of reference orientations and \
                orientations, got {} and {}", references.len(), orientations.len()
            )));
        }

        let n_orientations = orientations.len();

        let mut values = std::mem::take(&mut self.values);
        values.resize(n_orientations, Complex64::zero());
        values.par_iter_mut()
            .zip(references.par_iter().zip(orientations.par_iter()))
            .for_each(|(value, (reference, current))| {
                *value = self.correlation(reference, current);
            });
        self.values = values;

        let sum = self.values.par_iter()
            .copied()
            .reduce(Complex64::zero, |a, b| a + b);

        let dimension = (self.l + 1) as f64;
        // with no orientations, this is 0 / 0 = NaN
        self.autocorrelation = (sum / n_orientations as f64).re / dimension;
        self.n_orientations = n_orientations;

        Ok(())
    }
}
