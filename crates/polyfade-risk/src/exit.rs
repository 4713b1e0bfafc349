//! Take-profit / stop-loss / max-hold exit evaluation.

use chrono::{DateTime, Utc};
use polyfade_core::Price;
use polyfade_position::Position;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Risk exit thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// P&L percent at which to take profit.
    #[serde(default = "default_take_profit_pct")]
    pub take_profit_pct: Decimal,

    /// Loss percent at which to stop out.
    #[serde(default = "default_stop_loss_pct")]
    pub stop_loss_pct: Decimal,

    /// Maximum seconds a position may be held.
    #[serde(default = "default_max_hold_seconds")]
    pub max_hold_seconds: i64,
}

fn default_take_profit_pct() -> Decimal {
    Decimal::from(3)
}

fn default_stop_loss_pct() -> Decimal {
    Decimal::new(25, 1) // 2.5
}

fn default_max_hold_seconds() -> i64 {
    3600
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            take_profit_pct: default_take_profit_pct(),
            stop_loss_pct: default_stop_loss_pct(),
            max_hold_seconds: default_max_hold_seconds(),
        }
    }
}

/// Why a risk exit fired. At most one reason per evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ExitReason {
    /// Held past the maximum hold time.
    TimeExit {
        /// How long the position was held.
        held_seconds: i64,
    },
    /// Take-profit threshold reached.
    TakeProfit {
        /// P&L percent at evaluation.
        pnl_pct: Decimal,
    },
    /// Stop-loss threshold breached.
    StopLoss {
        /// P&L percent at evaluation (negative).
        pnl_pct: Decimal,
    },
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TimeExit { held_seconds } => write!(f, "time_exit_{held_seconds}s"),
            Self::TakeProfit { pnl_pct } => write!(f, "take_profit_+{pnl_pct:.2}%"),
            Self::StopLoss { pnl_pct } => write!(f, "stop_loss_{pnl_pct:.2}%"),
        }
    }
}

/// Stateless evaluator for risk-based exits.
///
/// Check order is significant and first-match-wins: hold time, then
/// take-profit, then stop-loss.
#[derive(Debug, Clone)]
pub struct ExitEvaluator {
    config: RiskConfig,
}

impl ExitEvaluator {
    #[must_use]
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Evaluate an open position at `current_price`.
    ///
    /// Returns the single matching exit reason, or None to keep holding.
    #[must_use]
    pub fn check(
        &self,
        position: &Position,
        current_price: Price,
        now: DateTime<Utc>,
    ) -> Option<ExitReason> {
        let held = position.held_seconds(now);
        if held >= self.config.max_hold_seconds {
            return Some(ExitReason::TimeExit { held_seconds: held });
        }

        let pnl = position.pnl(current_price)?;

        if pnl.pct >= self.config.take_profit_pct {
            return Some(ExitReason::TakeProfit { pnl_pct: pnl.pct });
        }
        if pnl.pct <= -self.config.stop_loss_pct {
            return Some(ExitReason::StopLoss { pnl_pct: pnl.pct });
        }

        None
    }
}
