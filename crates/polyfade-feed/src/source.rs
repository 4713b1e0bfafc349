//! Feed and backup-source contracts.
//!
//! Trait-based abstractions over the transport layer so the engine can be
//! driven by a live stream, a polling client, or a test fixture. The
//! transports themselves live outside this repository.

use std::pin::Pin;

use polyfade_core::Price;

use crate::error::FeedResult;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Streaming price feed.
///
/// Implementations push each trade/price event into the channel handed to
/// `subscribe`; the engine consumes them as ticks. `disconnect` must stop
/// the stream promptly so shutdown does not hang on a live socket.
pub trait PriceFeed: Send + Sync {
    /// Start streaming prices into `tx`.
    fn subscribe(&self, tx: tokio::sync::mpsc::Sender<Price>) -> BoxFuture<'_, FeedResult<()>>;

    /// Whether the underlying connection is currently alive.
    fn is_connected(&self) -> bool;

    /// Tear down the stream.
    fn disconnect(&self) -> BoxFuture<'_, FeedResult<()>>;
}

/// Synchronous backup price source, polled periodically by the control loop
/// when the stream is quiet.
pub trait PriceSource: Send + Sync {
    /// Fetch the current price.
    fn get_price(&self) -> BoxFuture<'_, FeedResult<Price>>;
}
