//! Multi-window spike detection.
//!
//! Compares the current price against several rolling time windows and
//! reports the largest percentage dislocation, with a coefficient-of-
//! variation filter to suppress signals during excessively noisy markets.

pub mod config;
pub mod detector;

pub use config::DetectorConfig;
pub use detector::{SpikeDetector, SpikeStats};
