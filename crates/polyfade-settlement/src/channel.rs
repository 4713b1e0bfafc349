//! Settlement channel contract.
//!
//! The authenticated transport that delivers trade-status pushes lives
//! outside this repository; the engine only needs a way to receive
//! `(order_id, status)` events.

use polyfade_core::OrderId;

/// Raw settlement push from the venue's user channel.
#[derive(Debug, Clone)]
pub struct SettlementEvent {
    /// Order the event refers to.
    pub order_id: OrderId,
    /// Venue status string (e.g. "CONFIRMED", "MINED", "FAILED").
    pub status: String,
}

impl SettlementEvent {
    /// Whether the venue status is the terminal settled state.
    #[must_use]
    pub fn is_terminal_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("CONFIRMED")
    }

    /// Whether the venue status is a terminal failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.status.eq_ignore_ascii_case("FAILED")
    }
}

/// Push source of settlement events.
///
/// Implementations forward venue pushes into the channel handed to
/// `subscribe`; the engine consumes them alongside price ticks.
pub trait SettlementChannel: Send + Sync {
    /// Start forwarding settlement events into `tx`.
    fn subscribe(&self, tx: tokio::sync::mpsc::Sender<SettlementEvent>);
}
