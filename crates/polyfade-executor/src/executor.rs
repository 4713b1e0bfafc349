//! Executor trait and normalized order results.

use std::pin::Pin;

use polyfade_core::{OrderId, OrderSide, Price, TokenId, Usd};
use rust_decimal::Decimal;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// A market order to submit.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    /// Outcome token to trade.
    pub token_id: TokenId,
    /// Buy or sell.
    pub side: OrderSide,
    /// Notional to commit.
    pub amount_usd: Usd,
}

impl OrderRequest {
    #[must_use]
    pub fn new(token_id: TokenId, side: OrderSide, amount_usd: Usd) -> Self {
        Self {
            token_id,
            side,
            amount_usd,
        }
    }
}

/// A successful fill, normalized from the venue response.
#[derive(Debug, Clone)]
pub struct OrderFill {
    /// Venue-assigned order id.
    pub order_id: OrderId,
    /// Average fill price reported by the venue, if present.
    pub fill_price: Option<Price>,
    /// Filled share quantity, if reported.
    pub filled_shares: Option<Decimal>,
}

/// Classification of an order failure. Decides retryability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Insufficient balance or allowance. Will not fix itself.
    InsufficientBalance,
    /// Pre-submission orderbook health check failed (spread/depth).
    OrderbookUnhealthy,
    /// No resting orders matched. Often transient.
    NoMatch,
    /// Transport or venue error with no specific classification.
    Transient,
    /// The venue rejected the order for a non-transient reason.
    Rejected,
}

impl FailureKind {
    /// Whether a retry can plausibly succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NoMatch | Self::Transient)
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientBalance => write!(f, "insufficient_balance"),
            Self::OrderbookUnhealthy => write!(f, "orderbook_unhealthy"),
            Self::NoMatch => write!(f, "no_match"),
            Self::Transient => write!(f, "transient"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// A failed order, normalized from the venue response or transport error.
#[derive(Debug, Clone)]
pub struct OrderFailure {
    /// Failure classification.
    pub kind: FailureKind,
    /// Venue/transport detail for logging.
    pub detail: String,
}

impl OrderFailure {
    #[must_use]
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Classify a raw venue error message the way the venue phrases them.
    #[must_use]
    pub fn classify(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        let lower = detail.to_lowercase();
        let kind = if lower.contains("balance") || lower.contains("allowance") {
            FailureKind::InsufficientBalance
        } else if lower.contains("no match") {
            FailureKind::NoMatch
        } else {
            FailureKind::Transient
        };
        Self { kind, detail }
    }
}

impl std::fmt::Display for OrderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

/// Tagged outcome of an order submission.
#[derive(Debug, Clone)]
pub enum OrderOutcome {
    /// The order filled.
    Filled(OrderFill),
    /// The order did not fill.
    Failed(OrderFailure),
}

impl OrderOutcome {
    #[must_use]
    pub fn is_filled(&self) -> bool {
        matches!(self, Self::Filled(_))
    }
}

/// Venue order execution boundary.
///
/// Implementations submit a single attempt and normalize the response;
/// retry policy lives in `RetryingExecutor`, not here.
pub trait OrderExecutor: Send + Sync {
    /// Submit a market order once.
    fn place_market_order(&self, request: OrderRequest) -> BoxFuture<'_, OrderOutcome>;

    /// Current transactable outcome-token balance (shares).
    ///
    /// Used by the exit guard: a sell is deferred while this is zero.
    fn token_balance(&self, token_id: &TokenId) -> BoxFuture<'_, Decimal>;
}
