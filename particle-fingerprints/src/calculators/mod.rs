/// Common interface of all calculators in this crate.
///
/// Each calculator is built from a set of parameters, and keeps the results
/// of the last call to its `compute` function until the next one.
pub trait CalculatorBase {
    /// Get the name of this calculator
    fn name(&self) -> String;

    /// Get the parameters used to create this calculator as a JSON string
    fn parameters(&self) -> String;
}

mod local_descriptors;
pub use self::local_descriptors::{LocalDescriptors, LocalDescriptorsParameters};
pub use self::local_descriptors::{OrientationMode, spherical_angles};

mod rotational_autocorrelation;
pub use self::rotational_autocorrelation::{RotationalAutocorrelation, RotationalAutocorrelationParameters};
pub use self::rotational_autocorrelation::quat_to_greek;
