//! Order execution boundary.
//!
//! The venue client's response shapes are normalized here into a fixed
//! tagged result type so the engine never branches on SDK specifics.
//! A retrying wrapper applies the bounded-backoff policy for transient
//! failures, and a dry-run executor simulates fills for paper trading
//! and tests.

pub mod dry_run;
pub mod executor;
pub mod retry;

pub use dry_run::DryRunExecutor;
pub use executor::{
    BoxFuture, FailureKind, OrderExecutor, OrderFailure, OrderFill, OrderOutcome, OrderRequest,
};
pub use retry::{RetryConfig, RetryingExecutor};
