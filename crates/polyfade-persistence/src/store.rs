//! JSON state snapshot store.

use std::fs;
use std::path::{Path, PathBuf};

use polyfade_core::TokenId;
use polyfade_position::{Position, TradeTarget};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::PersistenceResult;

/// Persisted engine state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotState {
    /// The open position, if any.
    pub open_position: Option<Position>,
    /// Realized session P&L in USD.
    pub realized_pnl: Decimal,
    /// Completed round-trip trades.
    pub total_trades: u64,
    /// Round trips closed at a profit.
    pub winning_trades: u64,
    /// Whether the priority first buy has ever completed.
    #[serde(default)]
    pub initial_inventory_acquired: bool,
    /// Token the state belongs to.
    pub instrument_id: TokenId,
    /// The live (non-triggered) target, if any.
    #[serde(default)]
    pub current_target: Option<TradeTarget>,
}

impl BotState {
    /// Fresh state for a token: flat, zeroed counters.
    #[must_use]
    pub fn fresh(instrument_id: TokenId) -> Self {
        Self {
            open_position: None,
            realized_pnl: Decimal::ZERO,
            total_trades: 0,
            winning_trades: 0,
            initial_inventory_acquired: false,
            instrument_id,
            current_target: None,
        }
    }
}

/// Outcome of a state load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// A valid state for the configured token was restored.
    Restored(BotState),
    /// No usable prior state; start flat.
    Fresh,
}

/// Reads and writes the state snapshot file.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the snapshot. Uses a temp-file-and-rename so a crash mid-write
    /// cannot leave a truncated snapshot behind.
    pub fn save(&self, state: &BotState) -> PersistenceResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Load the snapshot for `instrument_id`.
    ///
    /// Missing file, unparseable content, and an instrument mismatch all
    /// degrade to `Fresh`; only the missing-file case is silent. I/O errors
    /// other than not-found are surfaced to the caller.
    pub fn load(&self, instrument_id: &TokenId) -> PersistenceResult<LoadOutcome> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No prior state file, starting fresh");
                return Ok(LoadOutcome::Fresh);
            }
            Err(e) => return Err(e.into()),
        };

        let state: BotState = match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "State file is corrupt, starting fresh"
                );
                return Ok(LoadOutcome::Fresh);
            }
        };

        if &state.instrument_id != instrument_id {
            warn!(
                saved = %state.instrument_id.short(),
                configured = %instrument_id.short(),
                "State file belongs to a different token, discarding"
            );
            return Ok(LoadOutcome::Fresh);
        }

        info!(
            total_trades = state.total_trades,
            realized_pnl = %state.realized_pnl,
            has_position = state.open_position.is_some(),
            "Restored prior state"
        );
        Ok(LoadOutcome::Restored(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use polyfade_core::{OrderId, OrderSide, Price, Usd};
    use polyfade_position::{TargetReason, TradeTarget};
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn token() -> TokenId {
        TokenId::new("token-abc")
    }

    fn populated_state() -> BotState {
        let position = Position::open(
            OrderSide::Buy,
            Price::new(dec!(0.50)),
            Utc::now(),
            Usd::new(dec!(2.00)),
            Some(OrderId::new("ord-1")),
        );
        let target =
            TradeTarget::sell_above(Price::new(dec!(0.50)), dec!(3), TargetReason::AfterBuy);

        BotState {
            open_position: Some(position),
            realized_pnl: dec!(1.25),
            total_trades: 7,
            winning_trades: 5,
            initial_inventory_acquired: true,
            instrument_id: token(),
            current_target: Some(target),
        }
    }

    #[test]
    fn test_round_trip_field_for_field() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        let state = populated_state();

        store.save(&state).unwrap();
        match store.load(&token()).unwrap() {
            LoadOutcome::Restored(loaded) => assert_eq!(loaded, state),
            LoadOutcome::Fresh => panic!("expected restored state"),
        }
    }

    #[test]
    fn test_missing_file_is_fresh() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("missing.json"));
        assert_eq!(store.load(&token()).unwrap(), LoadOutcome::Fresh);
    }

    #[test]
    fn test_corrupt_file_is_fresh() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not valid json").unwrap();

        let store = StateStore::new(path);
        assert_eq!(store.load(&token()).unwrap(), LoadOutcome::Fresh);
    }

    #[test]
    fn test_instrument_mismatch_discards_state() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        store.save(&populated_state()).unwrap();

        let other = TokenId::new("different-token");
        assert_eq!(store.load(&other).unwrap(), LoadOutcome::Fresh);
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("nested/dir/state.json"));
        store.save(&BotState::fresh(token())).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_fresh_state_shape() {
        let state = BotState::fresh(token());
        assert!(state.open_position.is_none());
        assert!(state.current_target.is_none());
        assert!(!state.initial_inventory_acquired);
        assert_eq!(state.total_trades, 0);
        assert_eq!(state.realized_pnl, Decimal::ZERO);
    }
}
