//! Detector configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Configuration for multi-window spike detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Rolling window lengths to examine, in seconds.
    /// Listed order is significant: on equal-magnitude spikes the first
    /// listed window wins.
    #[serde(default = "default_windows_seconds")]
    pub windows_seconds: Vec<i64>,

    /// Spike magnitude (percent) required to act on a signal.
    #[serde(default = "default_spike_threshold_pct")]
    pub spike_threshold_pct: Decimal,

    /// Minimum absolute spike strength (percent) for fade entries.
    #[serde(default = "default_min_spike_strength")]
    pub min_spike_strength: Decimal,

    /// Whether the volatility filter is applied.
    #[serde(default = "default_use_volatility_filter")]
    pub use_volatility_filter: bool,

    /// Maximum coefficient of variation (percent) before signals are vetoed.
    #[serde(default = "default_max_volatility_cv")]
    pub max_volatility_cv: Decimal,
}

fn default_windows_seconds() -> Vec<i64> {
    vec![600, 1800, 3600]
}

fn default_spike_threshold_pct() -> Decimal {
    Decimal::from(8)
}

fn default_min_spike_strength() -> Decimal {
    Decimal::from(5)
}

fn default_use_volatility_filter() -> bool {
    true
}

fn default_max_volatility_cv() -> Decimal {
    Decimal::from(10)
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            windows_seconds: default_windows_seconds(),
            spike_threshold_pct: default_spike_threshold_pct(),
            min_spike_strength: default_min_spike_strength(),
            use_volatility_filter: default_use_volatility_filter(),
            max_volatility_cv: default_max_volatility_cv(),
        }
    }
}
