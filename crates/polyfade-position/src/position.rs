//! The single open market exposure.

use chrono::{DateTime, Utc};
use polyfade_core::{OrderId, OrderSide, Price, Usd};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Unrealized P&L at a given price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionPnl {
    /// Percentage P&L relative to entry.
    pub pct: Decimal,
    /// Dollar P&L on the position notional.
    pub usd: Usd,
    /// Price the P&L was evaluated at.
    pub current_price: Price,
    /// Entry price.
    pub entry_price: Price,
}

/// The single open position. At most one exists system-wide at any time.
///
/// Created on a successful entry fill; `pending_settlement` is the only
/// field mutated afterwards (flipped false once the entry trade settles);
/// dropped entirely on a successful exit fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Entry side: Buy = long, Sell = short.
    pub side: OrderSide,
    /// Average entry price.
    pub entry_price: Price,
    /// When the position was opened.
    pub entry_time: DateTime<Utc>,
    /// Notional committed at entry.
    pub amount_usd: Usd,
    /// Exchange order id of the entry fill, if known.
    pub entry_order_id: Option<OrderId>,
    /// True until the entry trade is confirmed settled on-chain.
    #[serde(default)]
    pub pending_settlement: bool,
    /// Shares the entry notional should have bought at the entry price.
    #[serde(default)]
    pub expected_shares: Decimal,
}

impl Position {
    /// Create a position from an entry fill.
    #[must_use]
    pub fn open(
        side: OrderSide,
        entry_price: Price,
        entry_time: DateTime<Utc>,
        amount_usd: Usd,
        entry_order_id: Option<OrderId>,
    ) -> Self {
        let expected_shares = amount_usd.shares_at(entry_price).unwrap_or(Decimal::ZERO);
        Self {
            side,
            entry_price,
            entry_time,
            amount_usd,
            entry_order_id,
            pending_settlement: true,
            expected_shares,
        }
    }

    /// Check if this is a long position.
    #[must_use]
    pub fn is_long(&self) -> bool {
        self.side == OrderSide::Buy
    }

    /// Seconds the position has been held as of `now`.
    #[must_use]
    pub fn held_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.entry_time).num_seconds().max(0)
    }

    /// Unrealized P&L at `current_price`.
    ///
    /// Long: `(current - entry) / entry`; short: `(entry - current) / entry`.
    /// Returns None if the entry price is zero.
    #[must_use]
    pub fn pnl(&self, current_price: Price) -> Option<PositionPnl> {
        if self.entry_price.is_zero() {
            return None;
        }

        let pct = match self.side {
            OrderSide::Buy => current_price.pct_from(self.entry_price)?,
            OrderSide::Sell => {
                (self.entry_price.inner() - current_price.inner()) / self.entry_price.inner()
                    * Decimal::from(100)
            }
        };

        let usd = Usd::new(self.amount_usd.inner() * pct / Decimal::from(100));

        Some(PositionPnl {
            pct,
            usd,
            current_price,
            entry_price: self.entry_price,
        })
    }
}
