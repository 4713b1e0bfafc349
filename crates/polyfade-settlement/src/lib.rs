//! Order settlement confirmation tracking.
//!
//! Newly filled orders are not immediately transactable: the matched trade
//! still has to settle on-chain. The tracker records each submitted order
//! and flips it to settled on whichever comes first — a push confirmation
//! from the authenticated user channel, or a soft fallback timeout that
//! assumes success.

pub mod channel;
pub mod tracker;

pub use channel::{SettlementChannel, SettlementEvent};
pub use tracker::{PendingSettlement, SettlementStatus, SettlementTracker};
