//! Pending settlement state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use polyfade_core::OrderId;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

/// Terminal status of a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementStatus {
    /// Not yet resolved.
    Pending,
    /// Confirmed settled by a push event.
    Confirmed,
    /// Assumed settled because the fallback timeout elapsed.
    TimeoutAssumed,
    /// The trade failed; tokens will not arrive.
    Failed,
}

impl SettlementStatus {
    /// Whether this status counts as settled for trading purposes.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Confirmed | Self::TimeoutAssumed)
    }
}

/// One tracked order awaiting settlement.
#[derive(Debug, Clone)]
pub struct PendingSettlement {
    /// Order being tracked.
    pub order_id: OrderId,
    /// When tracking started.
    pub created_at: DateTime<Utc>,
    /// Whether the confirmed transition has happened. Monotonic.
    pub confirmed: bool,
    /// Resolution status.
    pub status: SettlementStatus,
    /// When the order was confirmed, if it was.
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl PendingSettlement {
    fn new(order_id: OrderId) -> Self {
        Self {
            order_id,
            created_at: Utc::now(),
            confirmed: false,
            status: SettlementStatus::Pending,
            confirmed_at: None,
        }
    }
}

struct Entry {
    settlement: PendingSettlement,
    notify: Arc<Notify>,
}

/// Tracks submitted orders until their trades settle.
///
/// Thread-safe: share via `Arc<SettlementTracker>`. The confirmed
/// transition happens exactly once per order; push confirmation and the
/// fallback timer race, and whichever fires second is a no-op.
#[derive(Default)]
pub struct SettlementTracker {
    entries: Mutex<HashMap<OrderId, Entry>>,
}

impl SettlementTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking an order. Re-registering an existing order is a no-op.
    pub fn register(&self, order_id: OrderId) {
        let mut entries = self.entries.lock();
        entries.entry(order_id.clone()).or_insert_with(|| {
            debug!(order_id = %order_id.short(), "Registered pending settlement");
            Entry {
                settlement: PendingSettlement::new(order_id.clone()),
                notify: Arc::new(Notify::new()),
            }
        });
    }

    /// Apply a resolution to an order.
    ///
    /// The false→true confirmed transition happens at most once; calling
    /// again with any status after resolution is a no-op. Unknown orders
    /// are registered implicitly so late confirmations are not lost.
    pub fn confirm(&self, order_id: &OrderId, status: SettlementStatus) {
        let notify = {
            let mut entries = self.entries.lock();
            let entry = entries.entry(order_id.clone()).or_insert_with(|| Entry {
                settlement: PendingSettlement::new(order_id.clone()),
                notify: Arc::new(Notify::new()),
            });

            if entry.settlement.status != SettlementStatus::Pending {
                debug!(
                    order_id = %order_id.short(),
                    status = ?entry.settlement.status,
                    "Settlement already resolved, ignoring"
                );
                return;
            }

            entry.settlement.status = status;
            if status.is_settled() {
                entry.settlement.confirmed = true;
                entry.settlement.confirmed_at = Some(Utc::now());
            }
            entry.notify.clone()
        };

        match status {
            SettlementStatus::Confirmed => {
                info!(order_id = %order_id.short(), "Settlement confirmed")
            }
            SettlementStatus::TimeoutAssumed => warn!(
                order_id = %order_id.short(),
                reason = "timeout_assumed",
                "Settlement assumed after fallback timeout without on-chain verification"
            ),
            SettlementStatus::Failed => {
                warn!(order_id = %order_id.short(), "Trade FAILED, tokens will not settle")
            }
            SettlementStatus::Pending => {}
        }

        notify.notify_waiters();
    }

    /// Spawn the soft fallback timer for an order.
    ///
    /// After `timeout` the order is treated as settled unless a push event
    /// resolved it first. Liveness guarantee only: nothing is re-checked
    /// on-chain.
    pub fn start_fallback_timer(self: &Arc<Self>, order_id: OrderId, timeout: Duration) {
        let tracker = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            tracker.confirm(&order_id, SettlementStatus::TimeoutAssumed);
        });
    }

    /// Whether the order has settled (confirmed or assumed).
    #[must_use]
    pub fn is_settled(&self, order_id: &OrderId) -> bool {
        self.entries
            .lock()
            .get(order_id)
            .map(|e| e.settlement.confirmed)
            .unwrap_or(false)
    }

    /// Snapshot of the tracked entry, if any.
    #[must_use]
    pub fn get(&self, order_id: &OrderId) -> Option<PendingSettlement> {
        self.entries
            .lock()
            .get(order_id)
            .map(|e| e.settlement.clone())
    }

    /// Wait until the order resolves or `timeout` elapses.
    ///
    /// Returns whether the order is settled afterwards.
    pub async fn wait_for_settlement(&self, order_id: &OrderId, timeout: Duration) -> bool {
        let notify = {
            let entries = self.entries.lock();
            match entries.get(order_id) {
                Some(entry) if entry.settlement.status != SettlementStatus::Pending => {
                    return entry.settlement.confirmed;
                }
                Some(entry) => entry.notify.clone(),
                None => return false,
            }
        };

        let _ = tokio::time::timeout(timeout, notify.notified()).await;
        self.is_settled(order_id)
    }

    /// Drop a resolved order from tracking.
    pub fn cleanup(&self, order_id: &OrderId) {
        self.entries.lock().remove(order_id);
    }

    /// Number of orders currently tracked.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.entries.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: &str) -> OrderId {
        OrderId::new(id)
    }

    #[test]
    fn test_register_and_is_settled() {
        let tracker = SettlementTracker::new();
        tracker.register(order("a"));

        assert!(!tracker.is_settled(&order("a")));
        assert!(!tracker.is_settled(&order("unknown")));
        assert_eq!(tracker.tracked_count(), 1);
    }

    #[test]
    fn test_confirm_flips_once() {
        let tracker = SettlementTracker::new();
        tracker.register(order("a"));

        tracker.confirm(&order("a"), SettlementStatus::Confirmed);
        assert!(tracker.is_settled(&order("a")));

        let snap = tracker.get(&order("a")).unwrap();
        assert!(snap.confirmed);
        assert_eq!(snap.status, SettlementStatus::Confirmed);
        assert!(snap.confirmed_at.is_some());
    }

    #[test]
    fn test_confirm_idempotent() {
        let tracker = SettlementTracker::new();
        tracker.register(order("a"));

        tracker.confirm(&order("a"), SettlementStatus::Confirmed);
        let first = tracker.get(&order("a")).unwrap();

        tracker.confirm(&order("a"), SettlementStatus::Confirmed);
        let second = tracker.get(&order("a")).unwrap();
        assert_eq!(first.confirmed_at, second.confirmed_at);
    }

    #[test]
    fn test_confirm_after_timeout_is_noop() {
        let tracker = SettlementTracker::new();
        tracker.register(order("a"));

        // Fallback fired first.
        tracker.confirm(&order("a"), SettlementStatus::TimeoutAssumed);
        assert!(tracker.is_settled(&order("a")));

        // Late push confirmation must not change the recorded status.
        tracker.confirm(&order("a"), SettlementStatus::Confirmed);
        let snap = tracker.get(&order("a")).unwrap();
        assert_eq!(snap.status, SettlementStatus::TimeoutAssumed);
    }

    #[test]
    fn test_failed_is_not_settled() {
        let tracker = SettlementTracker::new();
        tracker.register(order("a"));

        tracker.confirm(&order("a"), SettlementStatus::Failed);
        assert!(!tracker.is_settled(&order("a")));

        // Failure is terminal: a later timeout cannot resurrect it.
        tracker.confirm(&order("a"), SettlementStatus::TimeoutAssumed);
        assert!(!tracker.is_settled(&order("a")));
    }

    #[test]
    fn test_confirm_unknown_order_registers_it() {
        let tracker = SettlementTracker::new();
        tracker.confirm(&order("late"), SettlementStatus::Confirmed);
        assert!(tracker.is_settled(&order("late")));
    }

    #[test]
    fn test_cleanup() {
        let tracker = SettlementTracker::new();
        tracker.register(order("a"));
        tracker.cleanup(&order("a"));
        assert_eq!(tracker.tracked_count(), 0);
    }

    #[tokio::test]
    async fn test_fallback_timer_assumes_settlement() {
        let tracker = Arc::new(SettlementTracker::new());
        tracker.register(order("a"));
        tracker.start_fallback_timer(order("a"), Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(50)).await;
        let snap = tracker.get(&order("a")).unwrap();
        assert!(snap.confirmed);
        assert_eq!(snap.status, SettlementStatus::TimeoutAssumed);
    }

    #[tokio::test]
    async fn test_push_beats_fallback_timer() {
        let tracker = Arc::new(SettlementTracker::new());
        tracker.register(order("a"));
        tracker.start_fallback_timer(order("a"), Duration::from_millis(50));

        tracker.confirm(&order("a"), SettlementStatus::Confirmed);

        tokio::time::sleep(Duration::from_millis(80)).await;
        let snap = tracker.get(&order("a")).unwrap();
        assert_eq!(snap.status, SettlementStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_wait_for_settlement_signalled() {
        let tracker = Arc::new(SettlementTracker::new());
        tracker.register(order("a"));

        let waiter = Arc::clone(&tracker);
        let handle = tokio::spawn(async move {
            waiter
                .wait_for_settlement(&order("a"), Duration::from_secs(1))
                .await
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        tracker.confirm(&order("a"), SettlementStatus::Confirmed);

        assert!(handle.await.unwrap());
    }

    #[tokio::test]
    async fn test_wait_for_settlement_times_out() {
        let tracker = SettlementTracker::new();
        tracker.register(order("a"));

        let settled = tracker
            .wait_for_settlement(&order("a"), Duration::from_millis(20))
            .await;
        assert!(!settled);
    }
}
