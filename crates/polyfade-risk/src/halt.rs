//! Trading halt latch and session limits.
//!
//! Once tripped the latch stays tripped until process restart or an
//! explicit operator reset; no new entries are attempted while halted.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::RwLock;
use polyfade_core::Usd;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Reason the halt latch tripped.
#[derive(Debug, Clone, PartialEq)]
pub enum HaltReason {
    /// Session realized loss limit breached.
    SessionLossLimit {
        /// Realized P&L at the time of the breach.
        realized_pnl: Usd,
        /// Configured limit.
        limit: Usd,
    },
    /// Maximum trades for the session reached.
    MaxTrades {
        /// Trades completed.
        count: u64,
    },
    /// Manual trigger by operator.
    Manual {
        /// Human-readable message.
        message: String,
    },
}

impl std::fmt::Display for HaltReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SessionLossLimit {
                realized_pnl,
                limit,
            } => write!(f, "Session loss limit: ${realized_pnl} <= -${limit}"),
            Self::MaxTrades { count } => write!(f, "Max trades reached: {count}"),
            Self::Manual { message } => write!(f, "Manual: {message}"),
        }
    }
}

/// Session policy limits. Zero disables a limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLimits {
    /// Halt once realized session loss reaches this many dollars.
    #[serde(default)]
    pub session_loss_limit_usd: Decimal,

    /// Halt once this many round-trip trades have completed.
    #[serde(default)]
    pub max_trades_per_session: u64,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            session_loss_limit_usd: Decimal::ZERO,
            max_trades_per_session: 0,
        }
    }
}

impl SessionLimits {
    /// Check the limits against session counters.
    ///
    /// Returns the breach reason if one applies.
    #[must_use]
    pub fn breach(&self, realized_pnl: Usd, total_trades: u64) -> Option<HaltReason> {
        if self.session_loss_limit_usd > Decimal::ZERO
            && realized_pnl.inner() <= -self.session_loss_limit_usd
        {
            return Some(HaltReason::SessionLossLimit {
                realized_pnl,
                limit: Usd::new(self.session_loss_limit_usd),
            });
        }
        if self.max_trades_per_session > 0 && total_trades >= self.max_trades_per_session {
            return Some(HaltReason::MaxTrades {
                count: total_trades,
            });
        }
        None
    }
}

/// Trading halt latch.
///
/// Thread-safe: share via `Arc<TradingHaltLatch>`. Trips once; later
/// triggers keep the original reason.
pub struct TradingHaltLatch {
    halted: AtomicBool,
    halted_at: AtomicU64,
    reason: RwLock<Option<HaltReason>>,
}

impl Default for TradingHaltLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl TradingHaltLatch {
    #[must_use]
    pub fn new() -> Self {
        Self {
            halted: AtomicBool::new(false),
            halted_at: AtomicU64::new(0),
            reason: RwLock::new(None),
        }
    }

    /// Whether trading is currently halted.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    /// Trip the latch. No-op if already tripped.
    pub fn trip(&self, reason: HaltReason) {
        if self
            .halted
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.halted_at
                .store(Utc::now().timestamp_millis() as u64, Ordering::SeqCst);
            {
                let mut guard = self.reason.write();
                *guard = Some(reason.clone());
            }
            error!(reason = %reason, "TRADING HALTED");
        } else {
            warn!(new_reason = %reason, "Halt latch already tripped, keeping original reason");
        }
    }

    /// The reason the latch tripped, if halted.
    #[must_use]
    pub fn reason(&self) -> Option<HaltReason> {
        if self.is_halted() {
            self.reason.read().clone()
        } else {
            None
        }
    }

    /// Timestamp (Unix ms) of the trip, if halted.
    #[must_use]
    pub fn halted_at(&self) -> Option<u64> {
        if self.is_halted() {
            let ts = self.halted_at.load(Ordering::SeqCst);
            if ts > 0 {
                return Some(ts);
            }
        }
        None
    }

    /// Operator reset. Never performed automatically.
    pub fn reset(&self) {
        if self.is_halted() {
            let reason = self.reason.read().clone();
            info!(previous_reason = ?reason, "Halt latch manually reset");

            self.halted.store(false, Ordering::SeqCst);
            self.halted_at.store(0, Ordering::SeqCst);
            {
                let mut guard = self.reason.write();
                *guard = None;
            }
        }
    }
}
