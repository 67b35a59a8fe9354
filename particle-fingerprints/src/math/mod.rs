mod eigen;
pub use self::eigen::SymmetricEigen;

mod spherical_harmonics;
pub use self::spherical_harmonics::{SphericalHarmonics, spherical_harmonics_count};
