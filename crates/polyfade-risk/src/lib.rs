//! Risk exit evaluation and policy halt.
//!
//! `ExitEvaluator` decides when an open position must be closed;
//! `TradingHaltLatch` stops all further entries once a session limit is
//! breached.

pub mod exit;
pub mod halt;

pub use exit::{ExitEvaluator, ExitReason, RiskConfig};
pub use halt::{HaltReason, SessionLimits, TradingHaltLatch};
