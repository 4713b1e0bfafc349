//! Bounded retry with exponential backoff for order submission.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::warn;

use crate::executor::{BoxFuture, OrderExecutor, OrderOutcome, OrderRequest};
use polyfade_core::TokenId;

/// Retry policy parameters.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum submission attempts, including the first.
    pub max_attempts: u32,
    /// Base backoff before the second attempt.
    pub base_backoff: Duration,
    /// Backoff multiplier per attempt.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_backoff: Duration::from_millis(200),
            multiplier: 1.5,
        }
    }
}

impl RetryConfig {
    /// Backoff before attempt `attempt` (1-based), with a small
    /// deterministic stagger so concurrent retries do not align.
    fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.powi(attempt as i32);
        let base_ms = self.base_backoff.as_millis() as f64 * factor;
        let stagger = 1.0 + (attempt % 3) as f64 * 0.05;
        Duration::from_millis((base_ms * stagger) as u64)
    }
}

/// Wraps an executor with the bounded-retry policy.
///
/// Non-retryable failures (balance/allowance, pre-check rejections) are
/// returned immediately; retryable ones are re-attempted with exponential
/// backoff until the attempt budget is exhausted.
pub struct RetryingExecutor {
    inner: Arc<dyn OrderExecutor>,
    config: RetryConfig,
}

impl RetryingExecutor {
    #[must_use]
    pub fn new(inner: Arc<dyn OrderExecutor>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    #[must_use]
    pub fn with_defaults(inner: Arc<dyn OrderExecutor>) -> Self {
        Self::new(inner, RetryConfig::default())
    }

    async fn submit_with_retries(&self, request: OrderRequest) -> OrderOutcome {
        let mut last_failure = None;

        for attempt in 1..=self.config.max_attempts {
            match self.inner.place_market_order(request.clone()).await {
                OrderOutcome::Filled(fill) => return OrderOutcome::Filled(fill),
                OrderOutcome::Failed(failure) => {
                    if !failure.kind.is_retryable() {
                        warn!(
                            kind = %failure.kind,
                            detail = %failure.detail,
                            "Order failed, not retryable"
                        );
                        return OrderOutcome::Failed(failure);
                    }

                    warn!(
                        attempt,
                        max_attempts = self.config.max_attempts,
                        kind = %failure.kind,
                        detail = %failure.detail,
                        "Order attempt failed"
                    );
                    last_failure = Some(failure);

                    if attempt < self.config.max_attempts {
                        tokio::time::sleep(self.config.backoff_for(attempt)).await;
                    }
                }
            }
        }

        // max_attempts >= 1, so a failure was recorded.
        OrderOutcome::Failed(last_failure.unwrap_or_else(|| {
            crate::executor::OrderFailure::new(
                crate::executor::FailureKind::Transient,
                "no attempts made",
            )
        }))
    }
}

impl OrderExecutor for RetryingExecutor {
    fn place_market_order(&self, request: OrderRequest) -> BoxFuture<'_, OrderOutcome> {
        Box::pin(self.submit_with_retries(request))
    }

    fn token_balance(&self, token_id: &TokenId) -> BoxFuture<'_, Decimal> {
        self.inner.token_balance(token_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{FailureKind, OrderFailure, OrderFill};
    use parking_lot::Mutex;
    use polyfade_core::{OrderId, OrderSide, Usd};
    use rust_decimal_macros::dec;

    /// Scripted executor: pops one outcome per call.
    struct ScriptedExecutor {
        outcomes: Mutex<Vec<OrderOutcome>>,
        calls: Mutex<u32>,
    }

    impl ScriptedExecutor {
        fn new(mut outcomes: Vec<OrderOutcome>) -> Self {
            outcomes.reverse();
            Self {
                outcomes: Mutex::new(outcomes),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock()
        }
    }

    impl OrderExecutor for ScriptedExecutor {
        fn place_market_order(&self, _request: OrderRequest) -> BoxFuture<'_, OrderOutcome> {
            *self.calls.lock() += 1;
            let outcome = self.outcomes.lock().pop().unwrap_or_else(|| {
                OrderOutcome::Failed(OrderFailure::new(FailureKind::Transient, "exhausted"))
            });
            Box::pin(async move { outcome })
        }

        fn token_balance(&self, _token_id: &TokenId) -> BoxFuture<'_, Decimal> {
            Box::pin(async { Decimal::ZERO })
        }
    }

    fn request() -> OrderRequest {
        OrderRequest::new(TokenId::new("tok"), OrderSide::Buy, Usd::new(dec!(2)))
    }

    fn filled() -> OrderOutcome {
        OrderOutcome::Filled(OrderFill {
            order_id: OrderId::new("ord"),
            fill_price: None,
            filled_shares: None,
        })
    }

    fn fast_config() -> RetryConfig {
        RetryConfig {
            max_attempts: 4,
            base_backoff: Duration::from_millis(1),
            multiplier: 1.0,
        }
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let inner = Arc::new(ScriptedExecutor::new(vec![filled()]));
        let retrying = RetryingExecutor::new(inner.clone(), fast_config());

        let outcome = retrying.place_market_order(request()).await;
        assert!(outcome.is_filled());
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let inner = Arc::new(ScriptedExecutor::new(vec![
            OrderOutcome::Failed(OrderFailure::new(FailureKind::NoMatch, "no match")),
            OrderOutcome::Failed(OrderFailure::new(FailureKind::Transient, "timeout")),
            filled(),
        ]));
        let retrying = RetryingExecutor::new(inner.clone(), fast_config());

        let outcome = retrying.place_market_order(request()).await;
        assert!(outcome.is_filled());
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test]
    async fn test_balance_error_not_retried() {
        let inner = Arc::new(ScriptedExecutor::new(vec![OrderOutcome::Failed(
            OrderFailure::new(FailureKind::InsufficientBalance, "insufficient balance"),
        )]));
        let retrying = RetryingExecutor::new(inner.clone(), fast_config());

        let outcome = retrying.place_market_order(request()).await;
        match outcome {
            OrderOutcome::Failed(f) => assert_eq!(f.kind, FailureKind::InsufficientBalance),
            _ => panic!("expected failure"),
        }
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test]
    async fn test_exhausts_attempt_budget() {
        let inner = Arc::new(ScriptedExecutor::new(vec![]));
        let retrying = RetryingExecutor::new(inner.clone(), fast_config());

        let outcome = retrying.place_market_order(request()).await;
        assert!(!outcome.is_filled());
        assert_eq!(inner.calls(), 4);
    }

    #[test]
    fn test_backoff_grows() {
        let config = RetryConfig::default();
        assert!(config.backoff_for(2) > config.backoff_for(1));
        assert!(config.backoff_for(3) > config.backoff_for(2));
    }
}
