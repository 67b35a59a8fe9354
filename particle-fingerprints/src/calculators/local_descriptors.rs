use std::f64::consts::PI;

use log::{info, warn};
use ndarray::ArrayView2;
use num_complex::Complex64;
use rayon::prelude::*;

use crate::{Error, Matrix3, Quaternion, Vector3D};
use crate::math::{SphericalHarmonics, SymmetricEigen, spherical_harmonics_count};
use crate::systems::{NeighborList, UnitCell};

use super::CalculatorBase;

/// Strategy used to build the local coordinate frame of each reference
/// particle, before projecting bonds on the spherical harmonics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrientationMode {
    /// Use the principal axes of the inertia-like tensor of the neighbor
    /// bonds, sorted by increasing moment.
    LocalNeighborhood,
    /// Use the global `x, y, z` axes.
    Global,
    /// Use the body axes given by the orientation of each reference particle.
    ParticleLocal,
}

impl OrientationMode {
    fn as_str(self) -> &'static str {
        match self {
            OrientationMode::LocalNeighborhood => "local_neighborhood",
            OrientationMode::Global => "global",
            OrientationMode::ParticleLocal => "particle_local",
        }
    }
}

impl std::fmt::Display for OrientationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrientationMode {
    type Err = Error;

    fn from_str(value: &str) -> Result<OrientationMode, Error> {
        match value {
            "local_neighborhood" => Ok(OrientationMode::LocalNeighborhood),
            "global" => Ok(OrientationMode::Global),
            "particle_local" => Ok(OrientationMode::ParticleLocal),
            _ => Err(Error::UnsupportedMode(format!(
                "'{}', expected one of 'local_neighborhood', 'global' or 'particle_local'",
                value
            ))),
        }
    }
}

/// Parameters for the local descriptors calculator.
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
pub struct LocalDescriptorsParameters {
    /// Maximal degree `l` of the spherical harmonics
    pub max_angular: usize,
    /// Should we also store the harmonics with negative `m`?
    pub negative_m: bool,
}

/// Local environment descriptors based on spherical harmonics.
///
/// For every bond `(i, j)` in a neighbor list, the displacement from
/// reference particle `i` to point `j` is expressed in a local coordinate
/// frame attached to `i` (see [`OrientationMode`]) and projected on complex
/// spherical harmonics `Y_l^m` up to `l = max_angular`. The coefficients of
/// each bond are stored in a row of [`LocalDescriptors::values`], ordered by
/// increasing `l`, then `m = 0, ..., l`, then `m = -1, ..., -l` if
/// `negative_m` is set.
///
/// The output buffer is re-used between calls to `compute`: it only grows
/// when more bonds are needed than in any previous call.
#[derive(Debug, Clone)]
pub struct LocalDescriptors {
    parameters: LocalDescriptorsParameters,
    /// number of coefficients for each bond
    sph_width: usize,
    /// number of reference particles in the last call to compute
    n_references: usize,
    /// number of bonds in the last call to compute
    n_bonds: usize,
    /// storage for the values, with space for `capacity * sph_width` entries
    values: Vec<Complex64>,
    /// number of bonds fitting in `values`
    capacity: usize,
}

impl CalculatorBase for LocalDescriptors {
    fn name(&self) -> String {
        "local descriptors".into()
    }

    fn parameters(&self) -> String {
        serde_json::to_string(&self.parameters).expect("failed to serialize to JSON")
    }
}

impl LocalDescriptors {
    /// Create a new `LocalDescriptors` calculator with the given parameters
    pub fn new(parameters: LocalDescriptorsParameters) -> LocalDescriptors {
        LocalDescriptors {
            parameters: parameters,
            sph_width: spherical_harmonics_count(parameters.max_angular, parameters.negative_m),
            n_references: 0,
            n_bonds: 0,
            values: Vec::new(),
            capacity: 0,
        }
    }

    /// Create a new `LocalDescriptors` calculator from parameters serialized
    /// as JSON
    pub fn from_json(parameters: &str) -> Result<LocalDescriptors, Error> {
        let parameters = serde_json::from_str(parameters)?;
        return Ok(LocalDescriptors::new(parameters));
    }

    /// Get the maximal degree of the spherical harmonics
    pub fn max_angular(&self) -> usize {
        self.parameters.max_angular
    }

    /// Are harmonics with negative `m` included in the output?
    pub fn negative_m(&self) -> bool {
        self.parameters.negative_m
    }

    /// Get the number of complex coefficients computed for each bond
    pub fn sph_width(&self) -> usize {
        self.sph_width
    }

    /// Get the number of reference particles used in the last call to
    /// `compute`
    pub fn n_references(&self) -> usize {
        self.n_references
    }

    /// Get the number of bonds used in the last call to `compute`
    pub fn n_bonds(&self) -> usize {
        self.n_bonds
    }

    /// Get the number of bonds the output buffer can currently hold without
    /// re-allocating
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the values from the last call to `compute`, as an array of shape
    /// `(n_bonds, sph_width)`.
    ///
    /// Rows corresponding to bonds beyond the `max_neighbors` limit of their
    /// reference particle are not written by `compute`, and contain
    /// unspecified values.
    pub fn values(&self) -> ArrayView2<'_, Complex64> {
        let shape = (self.n_bonds, self.sph_width);
        let data = &self.values[..self.n_bonds * self.sph_width];
        return ArrayView2::from_shape(shape, data).expect("invalid shape for values");
    }

    /// Make sure the output buffer can hold at least `n_bonds` bonds
    fn reserve(&mut self, n_bonds: usize) {
        if n_bonds > self.capacity {
            info!(
                "growing local descriptors storage from {} to {} bonds",
                self.capacity, n_bonds
            );
            self.values.resize(n_bonds * self.sph_width, Complex64::new(0.0, 0.0));
            self.capacity = n_bonds;
        }
    }

    /// Compute the descriptors for all bonds in `neighbors`, between
    /// `references` and `points`.
    ///
    /// At most `max_neighbors` bonds are considered for each reference
    /// particle, in the order they appear in the neighbor list. Displacements
    /// are wrapped through the `cell` with the minimum image convention.
    /// `orientations` must contain one quaternion per reference particle when
    /// using [`OrientationMode::ParticleLocal`], and is ignored otherwise.
    ///
    /// If this function returns an error, the results of the previous call
    /// are left untouched.
    #[allow(clippy::too_many_arguments)]
    #[time_graph::instrument(name = "LocalDescriptors::compute")]
    pub fn compute(
        &mut self,
        cell: &UnitCell,
        neighbors: &NeighborList,
        max_neighbors: usize,
        references: &[Vector3D],
        points: &[Vector3D],
        orientations: Option<&[Quaternion]>,
        mode: OrientationMode,
    ) -> Result<(), Error> {
        neighbors.validate(references.len(), points.len())?;

        if mode == OrientationMode::ParticleLocal {
            match orientations {
                None => {
                    return Err(Error::InvalidParameter(
                        "orientations are required for particle_local mode".into()
                    ));
                }
                Some(orientations) if orientations.len() != references.len() => {
                    return Err(Error::InvalidParameter(format!(
                        "expected {} orientations for particle_local mode, got {}",
                        references.len(), orientations.len()
                    )));
                }
                Some(_) => {}
            }
        }

        let n_bonds = neighbors.n_bonds();
        self.reserve(n_bonds);

        let sph_width = self.sph_width;
        let max_angular = self.parameters.max_angular;
        let negative_m = self.parameters.negative_m;

        // split the output in one disjoint chunk per reference particle
        let mut tasks = Vec::with_capacity(references.len());
        let mut remaining = &mut self.values[..n_bonds * sph_width];
        for reference in 0..references.len() {
            let bonds = neighbors.neighbors_of(reference);
            let (output, rest) = std::mem::take(&mut remaining).split_at_mut(bonds.len() * sph_width);
            remaining = rest;
            tasks.push((reference, bonds, output));
        }
        debug_assert!(remaining.is_empty());

        tasks.into_par_iter().for_each_init(
            || SphericalHarmonics::new(max_angular),
            |harmonics, (reference, bonds, output)| {
                let bonds = &bonds[..usize::min(bonds.len(), max_neighbors)];
                if bonds.is_empty() {
                    return;
                }

                let center = references[reference];
                let frame = match mode {
                    OrientationMode::LocalNeighborhood => {
                        let displacements = bonds.iter().map(|&(_, j)| cell.wrap(points[j] - center));
                        neighborhood_frame(displacements)
                    }
                    OrientationMode::ParticleLocal => {
                        let orientations = orientations.expect("missing orientations");
                        orientations[reference].conjugate().rotation_matrix()
                    }
                    OrientationMode::Global => Matrix3::one(),
                };

                for (&(_, neighbor), row) in bonds.iter().zip(output.chunks_exact_mut(sph_width)) {
                    let displacement = cell.wrap(points[neighbor] - center);
                    if displacement.norm2() == 0.0 {
                        warn!(
                            "zero-length bond between reference {} and point {}",
                            reference, neighbor
                        );
                    }

                    let (theta, phi) = spherical_angles(frame * displacement);
                    harmonics.compute(phi, theta);
                    for (value, harmonic) in row.iter_mut().zip(harmonics.values(negative_m)) {
                        *value = harmonic;
                    }
                }
            }
        );

        self.n_references = references.len();
        self.n_bonds = n_bonds;

        Ok(())
    }
}

/// Get the rotation to the local frame defined by the principal axes of the
/// inertia-like tensor `Σ |r|² I - r ⊗ r` of the given displacements. The rows
/// of the returned matrix are the axes, sorted by increasing moment.
fn neighborhood_frame(displacements: impl Iterator<Item = Vector3D>) -> Matrix3 {
    let mut tensor = Matrix3::zero();
    for r in displacements {
        tensor += Matrix3::one() * r.norm2() - r.tensorial(&r);
    }

    return SymmetricEigen::new(tensor).eigenvectors.transposed();
}

/// Get the spherical angles `(theta, phi)` of the `bond` vector. `theta` is the
/// azimuthal angle in `[0, 2π)` measured from the `x` axis, and `phi` the polar
/// angle in `[0, π]` measured from the `z` axis.
///
/// For degenerate bonds (with a zero length), `phi` is `0` if the `z`
/// component is positive and `π` otherwise.
pub fn spherical_angles(bond: Vector3D) -> (f64, f64) {
    let mut theta = f64::atan2(bond[1], bond[0]);
    if theta < 0.0 {
        theta += 2.0 * PI;
    }

    let mut phi = f64::acos(bond[2] / bond.norm());
    if phi.is_nan() {
        phi = if bond[2] > 0.0 { 0.0 } else { PI };
    }

    return (theta, phi);
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_relative_eq;

    use super::*;

    fn octahedron() -> (Vec<Vector3D>, Vec<Vector3D>, NeighborList) {
        let references = vec![Vector3D::zero()];
        let points = vec![
            Vector3D::new(1.0, 0.0, 0.0),
            Vector3D::new(-1.0, 0.0, 0.0),
            Vector3D::new(0.0, 2.0, 0.0),
            Vector3D::new(0.0, -2.0, 0.0),
            Vector3D::new(0.0, 0.0, 3.0),
            Vector3D::new(0.0, 0.0, -3.0),
        ];
        let neighbors = NeighborList::new((0..6).map(|j| (0, j)).collect()).unwrap();
        return (references, points, neighbors);
    }

    #[test]
    fn parameters() {
        let calculator = LocalDescriptors::from_json(r#"{"max_angular": 4, "negative_m": true}"#).unwrap();
        assert_eq!(calculator.max_angular(), 4);
        assert!(calculator.negative_m());
        assert_eq!(calculator.sph_width(), 25);
        assert_eq!(calculator.name(), "local descriptors");
        assert_eq!(calculator.parameters(), r#"{"max_angular":4,"negative_m":true}"#);

        let error = LocalDescriptors::from_json(r#"{"max_angular": 4}"#).unwrap_err();
        assert!(matches!(error, Error::Json(_)));
    }

    #[test]
    fn orientation_mode_names() {
        for &mode in &[OrientationMode::LocalNeighborhood, OrientationMode::Global, OrientationMode::ParticleLocal] {
            assert_eq!(mode.to_string().parse::<OrientationMode>().unwrap(), mode);

            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{}\"", mode));
        }

        let error = "body".parse::<OrientationMode>().unwrap_err();
        assert_eq!(
            error.to_string(),
            "unsupported orientation mode: 'body', expected one of \
            'local_neighborhood', 'global' or 'particle_local'"
        );
    }

    #[test]
    fn sph_width() {
        for max_angular in 0..10 {
            let positive = (max_angular + 1) * (max_angular + 2) / 2;

            let calculator = LocalDescriptors::new(LocalDescriptorsParameters {
                max_angular: max_angular,
                negative_m: false,
            });
            assert_eq!(calculator.sph_width(), positive);

            let calculator = LocalDescriptors::new(LocalDescriptorsParameters {
                max_angular: max_angular,
                negative_m: true,
            });
            assert_eq!(calculator.sph_width(), positive + max_angular * (max_angular + 1) / 2);
        }
    }

    #[test]
    fn angles() {
        let (theta, phi) = spherical_angles(Vector3D::new(0.0, 0.0, 2.0));
        assert_eq!((theta, phi), (0.0, 0.0));

        let (theta, phi) = spherical_angles(Vector3D::new(0.0, 0.0, -2.0));
        assert_eq!((theta, phi), (0.0, PI));

        // zero-length bonds
        let (theta, phi) = spherical_angles(Vector3D::zero());
        assert_eq!((theta, phi), (0.0, PI));

        let (theta, phi) = spherical_angles(Vector3D::new(0.0, -1.0, 0.0));
        assert_relative_eq!(theta, 3.0 * FRAC_PI_2);
        assert_relative_eq!(phi, FRAC_PI_2);

        let (theta, phi) = spherical_angles(Vector3D::new(-1.0, 1.0, f64::sqrt(2.0)));
        assert_relative_eq!(theta, 0.75 * PI);
        assert_relative_eq!(phi, 0.25 * PI);
    }

    #[test]
    fn local_neighborhood_frame() {
        let (references, points, neighbors) = octahedron();
        let mut calculator = LocalDescriptors::new(LocalDescriptorsParameters {
            max_angular: 3,
            negative_m: true,
        });

        calculator.compute(
            &UnitCell::infinite(), &neighbors, 6, &references, &points,
            None, OrientationMode::LocalNeighborhood
        ).unwrap();

        // the smallest moment is along z, then y, then x: the local frame
        // maps x => z, y => y and z => x
        let expected_angles = [
            (0.0, 0.0),
            (0.0, PI),
            (FRAC_PI_2, FRAC_PI_2),
            (3.0 * FRAC_PI_2, FRAC_PI_2),
            (0.0, FRAC_PI_2),
            (PI, FRAC_PI_2),
        ];

        let values = calculator.values();
        assert_eq!(values.shape(), [6, 16]);

        let mut harmonics = SphericalHarmonics::new(3);
        for (row, &(theta, phi)) in values.outer_iter().zip(&expected_angles) {
            harmonics.compute(phi, theta);
            for (value, expected) in row.iter().zip(harmonics.values(true)) {
                assert_relative_eq!(*value, expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn particle_local_frame() {
        let references = vec![Vector3D::zero()];
        let points = vec![Vector3D::new(1.0, 0.0, 0.0), Vector3D::new(0.0, 0.0, 1.0)];
        let neighbors = NeighborList::new(vec![(0, 0), (0, 1)]).unwrap();
        let orientations = [Quaternion::from_axis_angle(Vector3D::new(0.0, 0.0, 1.0), FRAC_PI_2)];

        let mut calculator = LocalDescriptors::new(LocalDescriptorsParameters {
            max_angular: 2,
            negative_m: false,
        });

        calculator.compute(
            &UnitCell::infinite(), &neighbors, 2, &references, &points,
            Some(&orientations), OrientationMode::ParticleLocal
        ).unwrap();

        // the particle x axis is along global y, so a bond along global x
        // is along -y in the particle frame
        let mut harmonics = SphericalHarmonics::new(2);
        harmonics.compute(FRAC_PI_2, 3.0 * FRAC_PI_2);
        for (value, expected) in calculator.values().row(0).iter().zip(harmonics.values(false)) {
            assert_relative_eq!(*value, expected, epsilon = 1e-12);
        }

        harmonics.compute(0.0, 0.0);
        for (value, expected) in calculator.values().row(1).iter().zip(harmonics.values(false)) {
            assert_relative_eq!(*value, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn max_neighbors() {
        let (references, points, neighbors) = octahedron();
        let mut calculator = LocalDescriptors::new(LocalDescriptorsParameters {
            max_angular: 1,
            negative_m: false,
        });

        calculator.compute(
            &UnitCell::infinite(), &neighbors, 2, &references, &points,
            None, OrientationMode::Global
        ).unwrap();

        assert_eq!(calculator.n_bonds(), 6);
        let values = calculator.values();
        // first bonds are written
        assert_relative_eq!(values[[0, 0]].re, 0.5 / f64::sqrt(PI), epsilon = 1e-14);
        assert_relative_eq!(values[[1, 0]].re, 0.5 / f64::sqrt(PI), epsilon = 1e-14);
        // the others are left with the initial zeros
        for value in values.slice(ndarray::s![2.., ..]) {
            assert_eq!(*value, Complex64::new(0.0, 0.0));
        }
    }

    #[test]
    fn errors_keep_state() {
        let (references, points, neighbors) = octahedron();
        let mut calculator = LocalDescriptors::new(LocalDescriptorsParameters {
            max_angular: 2,
            negative_m: true,
        });

        calculator.compute(
            &UnitCell::infinite(), &neighbors, 6, &references, &points,
            None, OrientationMode::Global
        ).unwrap();
        let before = calculator.values().to_owned();

        let error = calculator.compute(
            &UnitCell::infinite(), &neighbors, 6, &references, &points,
            None, OrientationMode::ParticleLocal
        ).unwrap_err();
        assert_eq!(error.to_string(), "invalid parameter: orientations are required for particle_local mode");

        let orientations = [Quaternion::identity(); 2];
        let error = calculator.compute(
            &UnitCell::infinite(), &neighbors, 6, &references, &points,
            Some(&orientations), OrientationMode::ParticleLocal
        ).unwrap_err();
        assert_eq!(error.to_string(), "invalid parameter: expected 1 orientations for particle_local mode, got 2");

        // neighbor list does not match the points
        let error = calculator.compute(
            &UnitCell::infinite(), &neighbors, 6, &references, &points[..3],
            None, OrientationMode::Global
        ).unwrap_err();
        assert!(matches!(error, Error::InvalidParameter(_)));

        assert_eq!(calculator.n_bonds(), 6);
        assert_eq!(calculator.n_references(), 1);
        assert_eq!(calculator.values(), before);
    }

    #[test]
    fn buffer_reuse() {
        let (references, points, neighbors) = octahedron();
        let mut calculator = LocalDescriptors::new(LocalDescriptorsParameters {
            max_angular: 2,
            negative_m: false,
        });
        assert_eq!(calculator.capacity(), 0);
        assert_eq!(calculator.values().shape(), [0, 6]);

        calculator.compute(
            &UnitCell::infinite(), &neighbors, 6, &references, &points,
            None, OrientationMode::Global
        ).unwrap();
        assert_eq!(calculator.capacity(), 6);
        let pointer = calculator.values().as_ptr();

        let smaller = NeighborList::new(vec![(0, 2), (0, 4)]).unwrap();
        calculator.compute(
            &UnitCell::infinite(), &smaller, 6, &references, &points,
            None, OrientationMode::Global
        ).unwrap();

        assert_eq!(calculator.capacity(), 6);
        assert_eq!(calculator.n_bonds(), 2);
        assert_eq!(calculator.values().shape(), [2, 6]);
        assert_eq!(calculator.values().as_ptr(), pointer);
    }
}
