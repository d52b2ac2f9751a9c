//! Shared CLI utilities.

mod logging;

pub use logging::initialize_logging;
