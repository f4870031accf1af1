pub mod errors;
pub mod logging;

pub use errors::{OverlayError, OverlayResult};
pub use logging::init_logging;
