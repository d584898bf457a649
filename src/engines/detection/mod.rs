pub mod detector;
pub mod profile;

pub use detector::{collect_parameters, ExitDetector, EXIT_METHOD_NAME, RECOGNIZED_PARAMETERS};
pub use profile::{ExitMechanism, ExitProfile, COMBINATION_KEY, COMBINATION_VARIABLE};
