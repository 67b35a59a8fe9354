#![allow(clippy::needless_return)]
use particle_fingerprints::{LocalDescriptors, LocalDescriptorsParameters, OrientationMode};
use particle_fingerprints::{NeighborList, Quaternion, UnitCell, Vector3D};

use criterion::{BenchmarkGroup, Criterion, measurement::WallTime, SamplingMode};
use criterion::{criterion_group, criterion_main};

/// Simple cubic lattice with `n` sites per side, slightly shifted
fn lattice(n: usize, spacing: f64) -> Vec<Vector3D> {
    let mut positions = Vec::with_capacity(n * n * n);
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                let shift = 0.05 * f64::sin((i * n * n + j * n + k) as f64);
                positions.push(Vector3D::new(
                    i as f64 * spacing + shift,
                    j as f64 * spacing - shift,
                    k as f64 * spacing + 0.5 * shift,
                ));
            }
        }
    }
    return positions;
}

fn run_local_descriptors(mut group: BenchmarkGroup<WallTime>, mode: OrientationMode) {
    let n = 12;
    let spacing = 1.1;
    let cell = UnitCell::cubic(n as f64 * spacing);
    let positions = lattice(n, spacing);
    let orientations = (0..positions.len())
        .map(|i| Quaternion::from_axis_angle(Vector3D::new(1.0, 0.5, -0.3), 0.01 * i as f64))
        .collect::<Vec<_>>();

    let neighbors = NeighborList::from_cutoff(&cell, &positions, &positions, 2.0, true)
        .expect("failed to build neighbor list");

    for &max_angular in &[4, 8, 12] {
        let mut calculator = LocalDescriptors::new(LocalDescriptorsParameters {
            max_angular: max_angular,
            negative_m: true,
        });

        group.bench_function(format!("l_max = {}", max_angular), |b| b.iter_custom(|repeat| {
            let start = std::time::Instant::now();
            for _ in 0..repeat {
                calculator.compute(
                    &cell, &neighbors, 32, &positions, &positions, Some(&orientations), mode
                ).expect("failed to compute local descriptors");
            }
            start.elapsed() / positions.len() as u32
        }));
    }
}

fn local_descriptors(c: &mut Criterion) {
    for &mode in &[OrientationMode::Global, OrientationMode::LocalNeighborhood, OrientationMode::ParticleLocal] {
        let mut group = c.benchmark_group(format!("local descriptors, {} (per reference)", mode));
        group.noise_threshold(0.05);
        group.sample_size(10);
        group.sampling_mode(SamplingMode::Flat);

        run_local_descriptors(group, mode);
    }
}

criterion_group!(benches, local_descriptors);
criterion_main!(benches);
