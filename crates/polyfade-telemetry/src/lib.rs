//! Structured logging and session statistics.

pub mod error;
pub mod logging;
pub mod stats;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use stats::SessionStats;
