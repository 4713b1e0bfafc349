//! Price history buffer and feed contracts for the polyfade engine.
//!
//! The engine consumes prices from two places: an asynchronous streaming
//! feed (`PriceFeed`) and a synchronous backup source polled by the control
//! loop (`PriceSource`). Both land in the same bounded `PriceHistory`.

pub mod error;
pub mod history;
pub mod source;

pub use error::{FeedError, FeedResult};
pub use history::{PriceHistory, PriceSample};
pub use source::{PriceFeed, PriceSource};
