//! Simulated executor for paper trading and tests.

use chrono::Utc;
use parking_lot::Mutex;
use polyfade_core::{OrderId, OrderSide, Price, TokenId};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::executor::{BoxFuture, OrderExecutor, OrderFill, OrderOutcome, OrderRequest};

/// Fills every order at the last marked price without touching any venue.
///
/// Maintains a simulated share balance so the engine's exit guard behaves
/// the same way it does live.
pub struct DryRunExecutor {
    mark_price: Mutex<Price>,
    share_balance: Mutex<Decimal>,
}

impl DryRunExecutor {
    #[must_use]
    pub fn new(initial_price: Price) -> Self {
        Self {
            mark_price: Mutex::new(initial_price),
            share_balance: Mutex::new(Decimal::ZERO),
        }
    }

    /// Update the price simulated fills execute at.
    pub fn set_mark_price(&self, price: Price) {
        *self.mark_price.lock() = price;
    }

    /// Current simulated share balance.
    #[must_use]
    pub fn share_balance(&self) -> Decimal {
        *self.share_balance.lock()
    }

    /// Seed the simulated balance (restored positions).
    pub fn set_share_balance(&self, shares: Decimal) {
        *self.share_balance.lock() = shares;
    }
}

impl OrderExecutor for DryRunExecutor {
    fn place_market_order(&self, request: OrderRequest) -> BoxFuture<'_, OrderOutcome> {
        Box::pin(async move {
            let price = *self.mark_price.lock();
            let shares = request
                .amount_usd
                .shares_at(price)
                .unwrap_or(Decimal::ZERO);

            {
                let mut balance = self.share_balance.lock();
                match request.side {
                    OrderSide::Buy => *balance += shares,
                    OrderSide::Sell => *balance = (*balance - shares).max(Decimal::ZERO),
                }
            }

            let order_id = OrderId::new(format!(
                "dry_{}_{}",
                Utc::now().format("%Y%m%d_%H%M%S"),
                &Uuid::new_v4().simple().to_string()[..8]
            ));

            info!(
                side = %request.side,
                amount_usd = %request.amount_usd,
                price = %price,
                order_id = %order_id.short(),
                "DRY-RUN fill"
            );

            OrderOutcome::Filled(OrderFill {
                order_id,
                fill_price: Some(price),
                filled_shares: Some(shares),
            })
        })
    }

    fn token_balance(&self, _token_id: &TokenId) -> BoxFuture<'_, Decimal> {
        Box::pin(async { *self.share_balance.lock() })
    }
}
