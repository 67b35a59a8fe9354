use std::collections::BTreeSet;

use log::warn;
use ndarray::Array3;

use crate::{Error, Vector3D};
use super::UnitCell;

/// Maximal number of cells, we need to use this to prevent having too many
/// cells with a small unit cell and a small cutoff
const MAX_NUMBER_OF_CELLS: f64 = 1e5;

/// A list of bonds between reference particles and neighbor points.
///
/// Each bond is a `(reference, neighbor)` pair of indexes. Bonds are grouped
/// contiguously by reference index, in ascending order, so all bonds of a
/// given reference particle can be found with a binary search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeighborList {
    bonds: Vec<(usize, usize)>,
}

impl NeighborList {
    /// Create a new neighbor list from the given `bonds`. The bonds must be
    /// sorted by reference index (the first element of each pair).
    pub fn new(bonds: Vec<(usize, usize)>) -> Result<NeighborList, Error> {
        for (position, window) in bonds.windows(2).enumerate() {
            if window[0].0 > window[1].0 {
                return Err(Error::InvalidParameter(format!(
                    "bonds must be sorted by reference index, but bond {} has \
                    reference {} after reference {}",
                    position + 1, window[1].0, window[0].0
                )));
            }
        }

        return Ok(NeighborList { bonds: bonds });
    }

    /// Create a neighbor list containing all `(i, j)` bonds such that the
    /// distance between `references[i]` and `points[j]` is below `cutoff`,
    /// using the minimum image convention for periodic cells.
    ///
    /// If `exclude_self` is `true`, bonds with `i == j` are not included. This
    /// is useful when `references` and `points` are the same set of particles.
    ///
    /// For periodic cells, the `cutoff` must be smaller than half the
    /// smallest distance between two faces of the cell, so each pair of
    /// particles is at most a single time within the cutoff.
    #[time_graph::instrument(name = "NeighborList::from_cutoff")]
    pub fn from_cutoff(
        cell: &UnitCell,
        references: &[Vector3D],
        points: &[Vector3D],
        cutoff: f64,
        exclude_self: bool,
    ) -> Result<NeighborList, Error> {
        if !(cutoff.is_finite() && cutoff > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "cutoff must be a positive number, got {}", cutoff
            )));
        }

        if !cell.is_infinite() {
            let distances = cell.distances_between_faces();
            let smallest = f64::min(distances[0], f64::min(distances[1], distances[2]));
            if cutoff >= 0.5 * smallest {
                return Err(Error::InvalidParameter(format!(
                    "cutoff ({}) must be smaller than half of the smallest \
                    distance between faces of the cell ({})",
                    cutoff, smallest
                )));
            }
        }

        let mut cell_list = CellList::new(*cell, cutoff, references.iter().chain(points));
        for (index, &position) in points.iter().enumerate() {
            cell_list.add_point(index, position);
        }

        let cutoff2 = cutoff * cutoff;
        let mut bonds = Vec::new();
        let mut candidates = Vec::new();
        for (i, &reference) in references.iter().enumerate() {
            candidates.clear();
            cell_list.candidates(reference, &mut candidates);
            candidates.sort_unstable();

            for &j in &candidates {
                if exclude_self && i == j {
                    continue;
                }

                let vector = cell.wrap(points[j] - reference);
                let distance2 = vector.norm2();
                if distance2 < cutoff2 {
                    if distance2 < 1e-3 && i != j {
                        warn!(
                            "particles {} and {} are very close to one another ({})",
                            i, j, distance2.sqrt()
                        );
                    }
                    bonds.push((i, j));
                }
            }
        }

        return Ok(NeighborList { bonds: bonds });
    }

    /// Check that this neighbor list is consistent with `n_references`
    /// reference particles and `n_points` neighbor points.
    pub fn validate(&self, n_references: usize, n_points: usize) -> Result<(), Error> {
        for &(i, j) in &self.bonds {
            if i >= n_references {
                return Err(Error::InvalidParameter(format!(
                    "neighbor list contains reference index {}, but there are \
                    only {} reference particles", i, n_references
                )));
            }

            if j >= n_points {
                return Err(Error::InvalidParameter(format!(
                    "neighbor list contains point index {}, but there are only \
                    {} points", j, n_points
                )));
            }
        }
        Ok(())
    }

    /// Get all the bonds in this neighbor list
    pub fn bonds(&self) -> &[(usize, usize)] {
        &self.bonds
    }

    /// Get the number of bonds in this neighbor list
    pub fn n_bonds(&self) -> usize {
        self.bonds.len()
    }

    /// Get the index of the first bond with a reference index greater or
    /// equal to `reference`. If `reference` has bonds, this is the index of
    /// its first bond. If there are no such bonds, this returns
    /// `self.n_bonds()`.
    pub fn find_first_index(&self, reference: usize) -> usize {
        self.bonds.partition_point(|&(i, _)| i < reference)
    }

    /// Get the bonds with the given `reference` particle
    pub fn neighbors_of(&self, reference: usize) -> &[(usize, usize)] {
        let start = self.find_first_index(reference);
        let count = self.bonds[start..].iter()
            .take_while(|&&(i, _)| i == reference)
            .count();
        &self.bonds[start..start + count]
    }
}

/// The cell list is used to sort points inside bins/cells.
///
/// Candidate neighbors of a position are then found by looking through all
/// neighboring cells (the number of cells to search depends on the cutoff and
/// the size of the cells).
#[derive(Debug, Clone)]
struct CellList {
    /// How many cells do we need to look at when searching neighbors to include
    /// all neighbors below cutoff
    n_search: [i32; 3],
    /// the cells themselves, containing indexes of points
    cells: Array3<Vec<usize>>,
    /// Unit cell defining periodic boundary conditions
    unit_cell: UnitCell,
    /// For infinite cells, lower corner of the bounding box of all positions
    origin: Vector3D,
    /// For infinite cells, size of the bounding box of all positions
    extent: Vector3D,
}

impl CellList {
    /// Create a new `CellList` for the given unit cell and cutoff. `positions`
    /// is used to determine the bounding box of the system for infinite cells.
    fn new<'a>(unit_cell: UnitCell, cutoff: f64, positions: impl Iterator<Item = &'a Vector3D>) -> CellList {
        let mut origin = Vector3D::zero();
        let mut extent = Vector3D::new(1.0, 1.0, 1.0);

        let lengths = if unit_cell.is_infinite() {
            let mut min = Vector3D::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
            let mut max = -min;
            for position in positions {
                for xyz in 0..3 {
                    min[xyz] = f64::min(min[xyz], position[xyz]);
                    max[xyz] = f64::max(max[xyz], position[xyz]);
                }
            }

            if min[0].is_finite() {
                origin = min;
                for xyz in 0..3 {
                    extent[xyz] = f64::max(max[xyz] - min[xyz], cutoff);
                }
            }
            extent
        } else {
            unit_cell.distances_between_faces()
        };

        let mut n_cells = [
            f64::clamp(f64::trunc(lengths[0] / cutoff), 1.0, f64::INFINITY),
            f64::clamp(f64::trunc(lengths[1] / cutoff), 1.0, f64::INFINITY),
            f64::clamp(f64::trunc(lengths[2] / cutoff), 1.0, f64::INFINITY),
        ];

        // limit memory consumption by ensuring we have less than
        // `MAX_NUMBER_OF_CELLS` cells to look though
        let n_cells_total = n_cells[0] * n_cells[1] * n_cells[2];
        if n_cells_total > MAX_NUMBER_OF_CELLS {
            // set the total number of cells close to MAX_NUMBER_OF_CELLS,
            // while keeping roughly the ratio of cells in each direction
            let ratio_x_y = n_cells[0] / n_cells[1];
            let ratio_y_z = n_cells[1] / n_cells[2];

            n_cells[2] = f64::max(1.0, f64::trunc(f64::cbrt(MAX_NUMBER_OF_CELLS / (ratio_x_y * ratio_y_z * ratio_y_z))));
            n_cells[1] = f64::max(1.0, f64::trunc(ratio_y_z * n_cells[2]));
            n_cells[0] = f64::max(1.0, f64::trunc(ratio_x_y * n_cells[1]));
        }

        // number of cells to search in each direction to make sure all possible
        // pairs below the cutoff are accounted for.
        let mut n_search = [
            f64::ceil(cutoff * n_cells[0] / lengths[0]) as i32,
            f64::ceil(cutoff * n_cells[1] / lengths[1]) as i32,
            f64::ceil(cutoff * n_cells[2] / lengths[2]) as i32,
        ];

        let n_cells = [
            n_cells[0] as usize,
            n_cells[1] as usize,
            n_cells[2] as usize,
        ];

        for xyz in 0..3 {
            if n_search[xyz] < 1 {
                n_search[xyz] = 1;
            }

            // don't look for neighboring cells if we have only one cell and no
            // periodic boundary condition
            if n_cells[xyz] == 1 && unit_cell.is_infinite() {
                n_search[xyz] = 0;
            }
        }

        CellList {
            n_search: n_search,
            cells: Array3::from_elem(n_cells, Vec::new()),
            unit_cell: unit_cell,
            origin: origin,
            extent: extent,
        }
    }

    fn n_cells(&self) -> [usize; 3] {
        let shape = self.cells.shape();
        [shape[0], shape[1], shape[2]]
    }

    /// Get the (possibly out of bounds) index of the cell containing
    /// `position`
    fn raw_cell_index(&self, position: Vector3D) -> [i32; 3] {
        let fractional = if self.unit_cell.is_infinite() {
            let relative = position - self.origin;
            Vector3D::new(
                relative[0] / self.extent[0],
                relative[1] / self.extent[1],
                relative[2] / self.extent[2],
            )
        } else {
            // reduce to [0, 1) so points far outside the cell still give
            // small cell indexes
            let fractional = self.unit_cell.fractional(position);
            Vector3D::new(
                fractional[0] - f64::floor(fractional[0]),
                fractional[1] - f64::floor(fractional[1]),
                fractional[2] - f64::floor(fractional[2]),
            )
        };

        let n_cells = self.n_cells();
        return [
            f64::floor(fractional[0] * n_cells[0] as f64) as i32,
            f64::floor(fractional[1] * n_cells[1] as f64) as i32,
            f64::floor(fractional[2] * n_cells[2] as f64) as i32,
        ];
    }

    /// Bring a raw cell index inside the cell list, wrapping it for periodic
    /// cells. Returns `None` if the index is outside of an infinite cell.
    fn cell_index(&self, raw: [i32; 3]) -> Option<[usize; 3]> {
        let n_cells = self.n_cells();
        if self.unit_cell.is_infinite() {
            let mut index = [0; 3];
            for xyz in 0..3 {
                if raw[xyz] < 0 || raw[xyz] as usize >= n_cells[xyz] {
                    return None;
                }
                index[xyz] = raw[xyz] as usize;
            }
            Some(index)
        } else {
            let (_, index) = divmod_vec(raw, n_cells);
            Some(index)
        }
    }

    /// Add a single point to the cell list at the given `position`. The point
    /// is uniquely identified by its `index`.
    fn add_point(&mut self, index: usize, position: Vector3D) {
        let mut raw = self.raw_cell_index(position);
        if self.unit_cell.is_infinite() {
            // points on the upper boundary of the bounding box
            let n_cells = self.n_cells();
            for xyz in 0..3 {
                raw[xyz] = raw[xyz].clamp(0, n_cells[xyz] as i32 - 1);
            }
        }

        if let Some(cell_index) = self.cell_index(raw) {
            self.cells[cell_index].push(index);
        }
    }

    /// Collect the indexes of all points in cells close to `position` inside
    /// `candidates`. Some candidates might be further than the cutoff, so
    /// additional filtering is required later.
    fn candidates(&self, position: Vector3D, candidates: &mut Vec<usize>) {
        let mut center = self.raw_cell_index(position);
        if self.unit_cell.is_infinite() {
            let n_cells = self.n_cells();
            for xyz in 0..3 {
                center[xyz] = center[xyz].clamp(0, n_cells[xyz] as i32 - 1);
            }
        }

        // with few cells, different shifts can wrap around to the same cell,
        // which should only be visited once
        let mut visited = BTreeSet::new();
        for delta_x in -self.n_search[0]..=self.n_search[0] {
            for delta_y in -self.n_search[1]..=self.n_search[1] {
                for delta_z in -self.n_search[2]..=self.n_search[2] {
                    let raw = [center[0] + delta_x, center[1] + delta_y, center[2] + delta_z];
                    if let Some(cell_index) = self.cell_index(raw) {
                        if visited.insert(cell_index) {
                            candidates.extend_from_slice(&self.cells[cell_index]);
                        }
                    }
                }
            }
        }
    }
}

/// Function to compute both quotient and remainder of the division of a by b.
/// This function follows Python convention, making sure the remainder have the
/// same sign as `b`.
fn divmod(a: i32, b: usize) -> (i32, usize) {
    debug_assert!(b < (i32::MAX as usize));
    let b = b as i32;
    let mut quotient = a / b;
    let mut remainder = a % b;
    if remainder < 0 {
        remainder += b;
        quotient -= 1;
    }
    return (quotient, remainder as usize);
}

/// Apply the [`divmod`] function to three components at the time
fn divmod_vec(a: [i32; 3], b: [usize; 3]) -> ([i32; 3], [usize; 3]) {
    let (qx, rx) = divmod(a[0], b[0]);
    let (qy, ry) = divmod(a[1], b[1]);
    let (qz, rz) = divmod(a[2], b[2]);
    return ([qx, qy, qz], [rx, ry, rz]);
}
