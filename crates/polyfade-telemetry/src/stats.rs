//! Session statistics.
//!
//! Counters accumulated over the life of the process and reported by the
//! control loop's periodic status line.

use polyfade_core::Usd;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

/// Snapshot of session counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionStats {
    /// Realized P&L in USD over completed round trips.
    pub realized_pnl: Decimal,
    /// Completed round-trip trades.
    pub total_trades: u64,
    /// Round trips closed at a profit.
    pub winning_trades: u64,
    /// Round trips closed flat or at a loss.
    pub losing_trades: u64,
    /// Spikes that crossed the acting threshold.
    pub spikes_detected: u64,
    /// Targets created.
    pub targets_set: u64,
    /// Targets that triggered.
    pub targets_hit: u64,
    /// Price samples observed.
    pub prices_seen: u64,
}

impl SessionStats {
    /// Record a completed round trip.
    pub fn record_round_trip(&mut self, pnl: Usd) {
        self.realized_pnl += pnl.inner();
        self.total_trades += 1;
        if pnl.is_positive() {
            self.winning_trades += 1;
        } else {
            self.losing_trades += 1;
        }
    }

    /// Win rate in [0, 1], None before any trade completes.
    #[must_use]
    pub fn win_rate(&self) -> Option<Decimal> {
        if self.total_trades == 0 {
            return None;
        }
        Some(Decimal::from(self.winning_trades) / Decimal::from(self.total_trades))
    }

    /// Emit the periodic status line.
    pub fn log_summary(&self) {
        info!(
            realized_pnl = %self.realized_pnl,
            total_trades = self.total_trades,
            winning_trades = self.winning_trades,
            spikes_detected = self.spikes_detected,
            targets_set = self.targets_set,
            targets_hit = self.targets_hit,
            prices_seen = self.prices_seen,
            "Session stats"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_record_round_trip() {
        let mut stats = SessionStats::default();
        stats.record_round_trip(Usd::new(dec!(0.50)));
        stats.record_round_trip(Usd::new(dec!(-0.20)));
        stats.record_round_trip(Usd::new(dec!(0.10)));

        assert_eq!(stats.total_trades, 3);
        assert_eq!(stats.winning_trades, 2);
        assert_eq!(stats.losing_trades, 1);
        assert_eq!(stats.realized_pnl, dec!(0.40));
    }

    #[test]
    fn test_zero_pnl_counts_as_loss() {
        let mut stats = SessionStats::default();
        stats.record_round_trip(Usd::ZERO);
        assert_eq!(stats.winning_trades, 0);
        assert_eq!(stats.losing_trades, 1);
    }

    #[test]
    fn test_win_rate() {
        let mut stats = SessionStats::default();
        assert!(stats.win_rate().is_none());

        stats.record_round_trip(Usd::new(dec!(1)));
        stats.record_round_trip(Usd::new(dec!(-1)));
        assert_eq!(stats.win_rate().unwrap(), dec!(0.5));
    }
}
