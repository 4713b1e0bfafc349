//! Spike-fade / train-of-trade decision engine.
//!
//! Watches a streaming price feed for one outcome token, detects transient
//! dislocations across multiple time windows, and drives a single-position
//! state machine with take-profit/stop-loss/time exits, saved trade
//! targets, a configurable rebuy policy, and settlement-aware exit guards.

pub mod config;
pub mod engine;
pub mod error;

pub use config::{AppConfig, RebuySettings, RebuyStrategy};
pub use engine::{
    spawn_price_feed_bridge, spawn_settlement_bridge, Engine, EngineEvent, EngineStatus,
};
pub use error::{AppError, AppResult};
