//! Geometric context of a particle snapshot: the periodic box containing the
//! particles, and the list of bonds between reference particles and their
//! neighbors.

mod cell;
pub use self::cell::{UnitCell, CellShape};

mod neighbors;
pub use self::neighbors::NeighborList;
