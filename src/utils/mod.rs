//! Logging setup and audio parameter helpers

pub mod logging;
pub mod smoother;

pub use logging::init_logger;
pub use smoother::{SmoothedParam, DEFAULT_SMOOTH_TIME_MS};
