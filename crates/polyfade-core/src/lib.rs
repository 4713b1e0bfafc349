//! Core domain types for the polyfade trading engine.
//!
//! This crate provides fundamental types used throughout the system:
//! - `Price`, `Usd`: Precision-safe numeric types
//! - `TokenId`, `OrderId`: Market and order identifiers
//! - `OrderSide`: Trading enums

pub mod decimal;
pub mod error;
pub mod order;

pub use decimal::{Price, Usd};
pub use error::{CoreError, Result};
pub use order::{OrderId, OrderSide, TokenId};
