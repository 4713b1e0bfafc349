//! Position and trade target tracking.
//!
//! Holds the single open position, the saved "train of trade" targets that
//! drive the buy → sell → buy cycle, and the rebuy policy applied after an
//! exit.

pub mod position;
pub mod rebuy;
pub mod target;

pub use position::{Position, PositionPnl};
pub use rebuy::RebuyPolicy;
pub use target::{TargetAction, TargetCondition, TargetReason, TargetTracker, TradeTarget};
