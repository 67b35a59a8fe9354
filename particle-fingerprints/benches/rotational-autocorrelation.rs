use particle_fingerprints::{Quaternion, RotationalAutocorrelation, Vector3D};

use criterion::{Criterion, criterion_group, criterion_main};

fn rotational_autocorrelation(c: &mut Criterion) {
    let mut group = c.benchmark_group("rotational autocorrelation (per orientation)");
    group.noise_threshold(0.05);

    let n_orientations = 1000;
    let references = (0..n_orientations)
        .map(|i| Quaternion::from_axis_angle(Vector3D::new(0.2, 1.0, -0.4), 0.003 * i as f64))
        .collect::<Vec<_>>();
    let orientations = (0..n_orientations)
        .map(|i| Quaternion::from_axis_angle(Vector3D::new(-1.0, 0.1, 0.6), 0.005 * i as f64))
        .collect::<Vec<_>>();

    for &l in &[2, 4, 8, 12] {
        let mut calculator = RotationalAutocorrelation::new(l).expect("invalid l");

        group.bench_function(format!("l = {}", l), |b| b.iter_custom(|repeat| {
            let start = std::time::Instant::now();
            for _ in 0..repeat {
                calculator.compute(&references, &orientations).expect("failed to compute");
            }
            start.elapsed() / n_orientations as u32
        }));
    }
}

criterion_group!(benches, rotational_autocorrelation);
criterion_main!(benches);
