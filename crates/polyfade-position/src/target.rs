//! Saved trade targets ("train of trade").
//!
//! Targets are saved to state and compared against incoming prices rather
//! than recomputed each tick. Exactly one live (non-triggered) target
//! exists at a time; superseded and triggered targets are archived and
//! never mutated again.

use chrono::{DateTime, Utc};
use polyfade_core::Price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Action to take when a target triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetAction {
    Buy,
    Sell,
}

impl std::fmt::Display for TargetAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Trigger condition relative to the target price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetCondition {
    /// Triggers when current price <= target (buy targets).
    #[serde(rename = "<=")]
    AtOrBelow,
    /// Triggers when current price >= target (sell targets).
    #[serde(rename = ">=")]
    AtOrAbove,
}

/// Why a target was set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetReason {
    /// First target set at engine start.
    InitialTarget,
    /// Sell target set after an entry fill.
    AfterBuy,
    /// Buy target set after an exit fill.
    AfterSell,
    /// Buy target set by the wait-for-drop rebuy policy.
    RebuyDrop,
}

/// A saved target price plus the action to take when it is crossed.
///
/// `triggered` is monotonic: false until the target fires, then true
/// forever. Triggered targets are archived, never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeTarget {
    /// Generated identifier, for logs and activity feeds.
    pub target_id: String,
    /// The price to watch for.
    pub price: Price,
    /// Action to execute on trigger.
    pub action: TargetAction,
    /// Trigger comparison.
    pub condition: TargetCondition,
    /// When the target was set.
    pub set_at: DateTime<Utc>,
    /// Price at the moment the target was set.
    pub base_price: Price,
    /// Why the target was set.
    pub reason: TargetReason,
    /// Whether this target has fired.
    pub triggered: bool,
}

impl TradeTarget {
    /// Create a live (untriggered) target.
    #[must_use]
    pub fn new(
        price: Price,
        action: TargetAction,
        condition: TargetCondition,
        base_price: Price,
        reason: TargetReason,
    ) -> Self {
        Self {
            target_id: format!("tgt_{}", &Uuid::new_v4().simple().to_string()[..8]),
            price,
            action,
            condition,
            set_at: Utc::now(),
            base_price,
            reason,
            triggered: false,
        }
    }

    /// Buy target at `drop_pct` percent below `base_price`.
    #[must_use]
    pub fn buy_below(base_price: Price, drop_pct: Decimal, reason: TargetReason) -> Self {
        let price = base_price * (Decimal::ONE - drop_pct / Decimal::from(100));
        Self::new(
            price,
            TargetAction::Buy,
            TargetCondition::AtOrBelow,
            base_price,
            reason,
        )
    }

    /// Sell target at `gain_pct` percent above `base_price`.
    #[must_use]
    pub fn sell_above(base_price: Price, gain_pct: Decimal, reason: TargetReason) -> Self {
        let price = base_price * (Decimal::ONE + gain_pct / Decimal::from(100));
        Self::new(
            price,
            TargetAction::Sell,
            TargetCondition::AtOrAbove,
            base_price,
            reason,
        )
    }

    /// Whether `current_price` satisfies the trigger condition.
    #[must_use]
    pub fn is_satisfied_by(&self, current_price: Price) -> bool {
        match self.condition {
            TargetCondition::AtOrBelow => current_price <= self.price,
            TargetCondition::AtOrAbove => current_price >= self.price,
        }
    }

    /// Percentage distance from `current_price` to the target.
    #[must_use]
    pub fn distance_pct(&self, current_price: Price) -> Decimal {
        if current_price.is_zero() {
            return Decimal::ZERO;
        }
        (self.price.inner() - current_price.inner()) / current_price.inner() * Decimal::from(100)
    }
}

/// Holds the single live target and the archive of triggered ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetTracker {
    current: Option<TradeTarget>,
    #[serde(default)]
    archive: Vec<TradeTarget>,
    #[serde(default)]
    targets_set: u64,
    #[serde(default)]
    targets_hit: u64,
}

impl TargetTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The live (non-triggered) target, if any.
    #[must_use]
    pub fn current(&self) -> Option<&TradeTarget> {
        self.current.as_ref()
    }

    /// Replace the live target. A superseded live target is archived as-is.
    pub fn set(&mut self, target: TradeTarget) {
        info!(
            target_id = %target.target_id,
            action = %target.action,
            price = %target.price,
            base_price = %target.base_price,
            reason = ?target.reason,
            "Target set"
        );
        if let Some(old) = self.current.take() {
            self.archive.push(old);
        }
        self.current = Some(target);
        self.targets_set += 1;
    }

    /// Check the live target against `current_price`.
    ///
    /// If satisfied, the target is marked triggered, archived, and returned;
    /// the tracker is left with no live target.
    pub fn check(&mut self, current_price: Price) -> Option<TradeTarget> {
        let satisfied = self
            .current
            .as_ref()
            .is_some_and(|t| t.is_satisfied_by(current_price));
        if !satisfied {
            return None;
        }

        let mut target = self.current.take()?;
        target.triggered = true;
        self.targets_hit += 1;
        info!(
            target_id = %target.target_id,
            action = %target.action,
            target_price = %target.price,
            current_price = %current_price,
            "Target hit"
        );
        self.archive.push(target.clone());
        Some(target)
    }

    /// Drop the live target without archiving a trigger (operator reset).
    pub fn clear(&mut self) {
        if let Some(old) = self.current.take() {
            self.archive.push(old);
        }
    }

    /// Restore a persisted live target (state load path).
    pub fn restore(&mut self, target: Option<TradeTarget>) {
        self.current = target.filter(|t| !t.triggered);
    }

    #[must_use]
    pub fn targets_set(&self) -> u64 {
        self.targets_set
    }

    #[must_use]
    pub fn targets_hit(&self) -> u64 {
        self.targets_hit
    }

    /// Archived (triggered or superseded) targets, oldest first.
    #[must_use]
    pub fn archive(&self) -> &[TradeTarget] {
        &self.archive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_buy_below_construction() {
        let target = TradeTarget::buy_below(
            Price::new(dec!(1.00)),
            dec!(10),
            TargetReason::RebuyDrop,
        );
        assert_eq!(target.price, Price::new(dec!(0.90)));
        assert_eq!(target.action, TargetAction::Buy);
        assert_eq!(target.condition, TargetCondition::AtOrBelow);
        assert!(!target.triggered);
    }

    #[test]
    fn test_sell_above_construction() {
        let target = TradeTarget::sell_above(
            Price::new(dec!(0.50)),
            dec!(3),
            TargetReason::AfterBuy,
        );
        assert_eq!(target.price, Price::new(dec!(0.515)));
        assert_eq!(target.condition, TargetCondition::AtOrAbove);
    }

    #[test]
    fn test_trigger_conditions() {
        let buy = TradeTarget::buy_below(Price::new(dec!(1.00)), dec!(10), TargetReason::AfterSell);
        assert!(buy.is_satisfied_by(Price::new(dec!(0.90))));
        assert!(buy.is_satisfied_by(Price::new(dec!(0.89))));
        assert!(!buy.is_satisfied_by(Price::new(dec!(0.91))));

        let sell = TradeTarget::sell_above(Price::new(dec!(0.50)), dec!(3), TargetReason::AfterBuy);
        assert!(sell.is_satisfied_by(Price::new(dec!(0.515))));
        assert!(sell.is_satisfied_by(Price::new(dec!(0.60))));
        assert!(!sell.is_satisfied_by(Price::new(dec!(0.51))));
    }

    #[test]
    fn test_tracker_check_archives_triggered_target() {
        let mut tracker = TargetTracker::new();
        tracker.set(TradeTarget::sell_above(
            Price::new(dec!(0.50)),
            dec!(3),
            TargetReason::AfterBuy,
        ));

        // Below target: no trigger, target stays live.
        assert!(tracker.check(Price::new(dec!(0.51))).is_none());
        assert!(tracker.current().is_some());

        // At target: triggers once, archived, no live target remains.
        let hit = tracker.check(Price::new(dec!(0.52))).unwrap();
        assert!(hit.triggered);
        assert!(tracker.current().is_none());
        assert_eq!(tracker.targets_hit(), 1);
        assert_eq!(tracker.archive().len(), 1);

        // A second check with no live target is a no-op.
        assert!(tracker.check(Price::new(dec!(0.60))).is_none());
        assert_eq!(tracker.targets_hit(), 1);
    }

    #[test]
    fn test_tracker_supersede_archives_old() {
        let mut tracker = TargetTracker::new();
        tracker.set(TradeTarget::buy_below(
            Price::new(dec!(0.60)),
            dec!(5),
            TargetReason::InitialTarget,
        ));
        tracker.set(TradeTarget::buy_below(
            Price::new(dec!(0.55)),
            dec!(5),
            TargetReason::AfterSell,
        ));

        assert_eq!(tracker.targets_set(), 2);
        assert_eq!(tracker.archive().len(), 1);
        assert!(!tracker.archive()[0].triggered);
    }

    #[test]
    fn test_restore_drops_triggered_targets() {
        let mut tracker = TargetTracker::new();
        let mut target =
            TradeTarget::buy_below(Price::new(dec!(0.60)), dec!(5), TargetReason::AfterSell);
        target.triggered = true;
        tracker.restore(Some(target));
        assert!(tracker.current().is_none());
    }

    #[test]
    fn test_distance_pct() {
        let target = TradeTarget::buy_below(Price::new(dec!(1.00)), dec!(10), TargetReason::AfterSell);
        // Target 0.90, current 1.00 -> -10%
        assert_eq!(target.distance_pct(Price::new(dec!(1.00))), dec!(-10));
    }
}
