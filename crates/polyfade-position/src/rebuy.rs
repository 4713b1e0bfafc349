//! Re-entry policy applied after an exit.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What happens immediately after a position is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "strategy")]
pub enum RebuyPolicy {
    /// Wait `delay_seconds`, then buy again at the then-current price.
    Immediate {
        /// Seconds to wait before re-entering.
        delay_seconds: u64,
    },
    /// Set a buy target `drop_pct` percent below the exit price and wait
    /// for the market to come to it.
    WaitForDrop {
        /// Required drop below the exit price, in percent.
        drop_pct: Decimal,
    },
}

impl RebuyPolicy {
    /// Whether this policy re-enters without waiting for a price move.
    #[must_use]
    pub fn is_immediate(&self) -> bool {
        matches!(self, Self::Immediate { .. })
    }
}
