#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use particle_fingerprints::{Quaternion, Vector3D};

/// Get `n` positions uniformly distributed in a cube of side `length`
pub fn random_positions(n: usize, length: f64, seed: u64) -> Vec<Vector3D> {
    let mut rng = StdRng::seed_from_u64(seed);
    return (0..n).map(|_| Vector3D::new(
        rng.gen_range(0.0..length),
        rng.gen_range(0.0..length),
        rng.gen_range(0.0..length),
    )).collect();
}

/// Get `n` random unit quaternions
pub fn random_quaternions(n: usize, seed: u64) -> Vec<Quaternion> {
    let mut rng = StdRng::seed_from_u64(seed);
    return (0..n).map(|_| {
        let axis = Vector3D::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let angle = rng.gen_range(0.0..std::f64::consts::TAU);
        Quaternion::from_axis_angle(axis, angle)
    }).collect();
}
