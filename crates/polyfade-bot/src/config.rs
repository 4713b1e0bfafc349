//! Application configuration.

use crate::error::{AppError, AppResult};
use polyfade_detector::DetectorConfig;
use polyfade_position::RebuyPolicy;
use polyfade_risk::{RiskConfig, SessionLimits};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Rebuy strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebuyStrategy {
    /// Re-enter after a short delay at the then-current price.
    #[default]
    Immediate,
    /// Set a buy target below the exit price and wait.
    WaitForDrop,
}

/// Rebuy policy settings, flattened for config files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuySettings {
    /// Which strategy applies after an exit.
    #[serde(default)]
    pub strategy: RebuyStrategy,
    /// Immediate strategy: seconds to wait before re-entry.
    #[serde(default = "default_rebuy_delay_seconds")]
    pub delay_seconds: u64,
    /// Wait-for-drop strategy: required drop below the exit price (percent).
    #[serde(default = "default_rebuy_drop_pct")]
    pub drop_pct: Decimal,
}

fn default_rebuy_delay_seconds() -> u64 {
    2
}

fn default_rebuy_drop_pct() -> Decimal {
    Decimal::new(1, 1) // 0.1
}

impl Default for RebuySettings {
    fn default() -> Self {
        Self {
            strategy: RebuyStrategy::default(),
            delay_seconds: default_rebuy_delay_seconds(),
            drop_pct: default_rebuy_drop_pct(),
        }
    }
}

impl RebuySettings {
    /// The policy value the position crate consumes.
    #[must_use]
    pub fn policy(&self) -> RebuyPolicy {
        match self.strategy {
            RebuyStrategy::Immediate => RebuyPolicy::Immediate {
                delay_seconds: self.delay_seconds,
            },
            RebuyStrategy::WaitForDrop => RebuyPolicy::WaitForDrop {
                drop_pct: self.drop_pct,
            },
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Outcome token to trade.
    pub token_id: String,

    /// Paper-trading mode: simulated fills, no venue calls.
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,

    /// Notional committed per entry.
    #[serde(default = "default_trade_size_usd")]
    pub default_trade_size_usd: Decimal,

    /// Venue minimum order notional.
    #[serde(default = "default_min_trade_usd")]
    pub min_trade_usd: Decimal,

    /// Upper bound on per-trade notional.
    #[serde(default = "default_max_trade_usd")]
    pub max_trade_usd: Decimal,

    /// Bounded price history capacity (samples).
    #[serde(default = "default_price_history_size")]
    pub price_history_size: usize,

    /// Seconds between signals before a new entry is considered.
    #[serde(default = "default_cooldown_seconds")]
    pub cooldown_seconds: i64,

    /// Minimum seconds between an exit and the next entry.
    #[serde(default = "default_settlement_delay_seconds")]
    pub settlement_delay_seconds: f64,

    /// Soft settlement-confirmation timeout (seconds).
    #[serde(default = "default_settlement_timeout_seconds")]
    pub settlement_timeout_seconds: f64,

    /// Control loop interval (seconds).
    #[serde(default = "default_control_interval_seconds")]
    pub control_interval_seconds: u64,

    /// Backup price source poll cadence (seconds).
    #[serde(default = "default_rest_poll_interval_seconds")]
    pub rest_poll_interval_seconds: u64,

    /// Status log cadence, in control loop iterations.
    #[serde(default = "default_status_log_iterations")]
    pub status_log_iterations: u64,

    /// State snapshot file path.
    #[serde(default = "default_state_file")]
    pub state_file: String,

    /// Spike detection settings.
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Risk exit thresholds.
    #[serde(default)]
    pub risk: RiskConfig,

    /// Session policy limits.
    #[serde(default)]
    pub limits: SessionLimits,

    /// Rebuy policy.
    #[serde(default)]
    pub rebuy: RebuySettings,
}

fn default_dry_run() -> bool {
    true
}

fn default_trade_size_usd() -> Decimal {
    Decimal::from(2)
}

fn default_min_trade_usd() -> Decimal {
    Decimal::ONE
}

fn default_max_trade_usd() -> Decimal {
    Decimal::from(100)
}

fn default_price_history_size() -> usize {
    3600
}

fn default_cooldown_seconds() -> i64 {
    120
}

fn default_settlement_delay_seconds() -> f64 {
    2.0
}

fn default_settlement_timeout_seconds() -> f64 {
    90.0
}

fn default_control_interval_seconds() -> u64 {
    1
}

fn default_rest_poll_interval_seconds() -> u64 {
    30
}

fn default_status_log_iterations() -> u64 {
    30
}

fn default_state_file() -> String {
    "data/position.json".to_string()
}

impl AppConfig {
    /// Minimal config for a token, defaults everywhere else.
    #[must_use]
    pub fn for_token(token_id: impl Into<String>) -> Self {
        Self {
            token_id: token_id.into(),
            dry_run: default_dry_run(),
            default_trade_size_usd: default_trade_size_usd(),
            min_trade_usd: default_min_trade_usd(),
            max_trade_usd: default_max_trade_usd(),
            price_history_size: default_price_history_size(),
            cooldown_seconds: default_cooldown_seconds(),
            settlement_delay_seconds: default_settlement_delay_seconds(),
            settlement_timeout_seconds: default_settlement_timeout_seconds(),
            control_interval_seconds: default_control_interval_seconds(),
            rest_poll_interval_seconds: default_rest_poll_interval_seconds(),
            status_log_iterations: default_status_log_iterations(),
            state_file: default_state_file(),
            detector: DetectorConfig::default(),
            risk: RiskConfig::default(),
            limits: SessionLimits::default(),
            rebuy: RebuySettings::default(),
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> AppResult<()> {
        if self.token_id.is_empty() {
            return Err(AppError::Config("token_id must be set".into()));
        }
        let pct_open = |v: Decimal| v > Decimal::ZERO && v < Decimal::from(100);
        if !pct_open(self.detector.spike_threshold_pct) {
            return Err(AppError::Config(
                "spike_threshold_pct must be in (0, 100)".into(),
            ));
        }
        if !pct_open(self.risk.take_profit_pct) || !pct_open(self.risk.stop_loss_pct) {
            return Err(AppError::Config(
                "take_profit_pct and stop_loss_pct must be in (0, 100)".into(),
            ));
        }
        if self.price_history_size < 5 {
            return Err(AppError::Config("price_history_size must be >= 5".into()));
        }
        if self.risk.max_hold_seconds <= 0 {
            return Err(AppError::Config("max_hold_seconds must be > 0".into()));
        }
        if self.default_trade_size_usd < self.min_trade_usd
            || self.default_trade_size_usd > self.max_trade_usd
        {
            return Err(AppError::Config(format!(
                "default_trade_size_usd must be between {} and {}",
                self.min_trade_usd, self.max_trade_usd
            )));
        }
        Ok(())
    }
}
