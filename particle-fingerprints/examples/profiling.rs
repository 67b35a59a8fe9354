use particle_fingerprints::{LocalDescriptors, NeighborList, OrientationMode};
use particle_fingerprints::{Quaternion, RotationalAutocorrelation, UnitCell, Vector3D};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mode = match std::env::args().nth(1) {
        Some(mode) => mode.parse::<OrientationMode>()?,
        None => OrientationMode::LocalNeighborhood,
    };

    // enable collection of profiling data
    time_graph::enable_data_collection(true);
    // clear any existing collected data
    time_graph::clear_collected_data();

    time_graph::spanned!("Full calculation", {
        compute_descriptors(mode)?;
        compute_autocorrelation()?;
    });

    // get the call graph and display it
    let graph = time_graph::get_full_graph();
    // (this requires the "table" feature for the time_graph crate)
    println!("{}", graph.as_short_table());

    Ok(())
}

/// Slightly distorted simple cubic lattice with `n` sites per side
fn lattice(n: usize, spacing: f64) -> Vec<Vector3D> {
    let mut positions = Vec::with_capacity(n * n * n);
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                let shift = 0.05 * f64::cos((i + 3 * j + 7 * k) as f64);
                positions.push(Vector3D::new(
                    i as f64 * spacing + shift,
                    j as f64 * spacing,
                    k as f64 * spacing - shift,
                ));
            }
        }
    }
    return positions;
}

fn compute_descriptors(mode: OrientationMode) -> Result<(), Box<dyn std::error::Error>> {
    let n = 16;
    let spacing = 1.2;
    let cell = UnitCell::cubic(n as f64 * spacing);
    let positions = lattice(n, spacing);
    let orientations = vec![Quaternion::identity(); positions.len()];

    let neighbors = NeighborList::from_cutoff(&cell, &positions, &positions, 2.0, true)?;

    let mut calculator = LocalDescriptors::from_json(r#"{
        "max_angular": 8,
        "negative_m": true
    }"#)?;
    calculator.compute(&cell, &neighbors, 18, &positions, &positions, Some(&orientations), mode)?;

    println!(
        "computed {} descriptors for {} bonds",
        calculator.values().len(), calculator.n_bonds()
    );
    Ok(())
}

fn compute_autocorrelation() -> Result<(), Box<dyn std::error::Error>> {
    let references = vec![Quaternion::identity(); 5000];
    let orientations = (0..references.len())
        .map(|i| Quaternion::from_axis_angle(Vector3D::new(0.0, 0.0, 1.0), 1e-3 * i as f64))
        .collect::<Vec<_>>();

    let mut calculator = RotationalAutocorrelation::new(6)?;
    calculator.compute(&references, &orientations)?;

    println!("rotational autocorrelation: {}", calculator.autocorrelation());
    Ok(())
}
