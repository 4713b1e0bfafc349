//! Bounded, time-ordered price history.
//!
//! Backing store for multi-window spike detection: a fixed-capacity
//! ring of `(timestamp, price)` samples, oldest evicted first.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use polyfade_core::Price;
use serde::{Deserialize, Serialize};

/// A single observed price at a point in time. Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSample {
    /// When the price was observed.
    pub timestamp: DateTime<Utc>,
    /// The observed price.
    pub price: Price,
}

impl PriceSample {
    pub fn new(timestamp: DateTime<Utc>, price: Price) -> Self {
        Self { timestamp, price }
    }

    /// Sample stamped with the current time.
    pub fn now(price: Price) -> Self {
        Self::new(Utc::now(), price)
    }
}

/// Bounded, time-ascending sequence of price samples.
///
/// Invariants:
/// - samples are stored in insertion order, which is time-ascending
///   because each push is stamped at or after the previous one
/// - length never exceeds the configured capacity; the oldest sample
///   is evicted on overflow
#[derive(Debug, Clone)]
pub struct PriceHistory {
    samples: VecDeque<PriceSample>,
    capacity: usize,
}

impl PriceHistory {
    /// Create a history bounded to `capacity` samples.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest if at capacity. O(1) amortized.
    pub fn push(&mut self, sample: PriceSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Number of samples currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Configured maximum size.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples with `timestamp >= now - window_seconds` and a positive price.
    ///
    /// Re-evaluated on each call; callers may restart the scan freely.
    pub fn window(
        &self,
        window_seconds: i64,
        now: DateTime<Utc>,
    ) -> impl Iterator<Item = &PriceSample> {
        let cutoff = now - Duration::seconds(window_seconds);
        self.samples
            .iter()
            .filter(move |s| s.timestamp >= cutoff && s.price.is_positive())
    }

    /// The last `k` samples, oldest first.
    pub fn recent(&self, k: usize) -> impl Iterator<Item = &PriceSample> {
        let skip = self.samples.len().saturating_sub(k);
        self.samples.iter().skip(skip)
    }

    /// Most recent sample, if any.
    #[must_use]
    pub fn last(&self) -> Option<&PriceSample> {
        self.samples.back()
    }

    /// Iterate all samples, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &PriceSample> {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_at(now: DateTime<Utc>, secs_ago: i64, price: &str) -> PriceSample {
        PriceSample::new(
            now - Duration::seconds(secs_ago),
            Price::new(price.parse().unwrap()),
        )
    }

    #[test]
    fn test_push_and_len() {
        let mut history = PriceHistory::new(10);
        assert!(history.is_empty());

        history.push(PriceSample::now(Price::new(dec!(0.50))));
        assert_eq!(history.len(), 1);
        assert_eq!(history.last().unwrap().price, Price::new(dec!(0.50)));
    }

    #[test]
    fn test_eviction_at_capacity() {
        let mut history = PriceHistory::new(3);
        let now = Utc::now();

        for i in 0..5 {
            history.push(sample_at(now, 5 - i, "0.50"));
        }

        // Capacity 3: the two oldest samples were evicted.
        assert_eq!(history.len(), 3);
        let oldest = history.iter().next().unwrap();
        assert_eq!(oldest.timestamp, now - Duration::seconds(3));
    }

    #[test]
    fn test_window_filters_by_cutoff() {
        let mut history = PriceHistory::new(100);
        let now = Utc::now();

        history.push(sample_at(now, 120, "0.40"));
        history.push(sample_at(now, 50, "0.50"));
        history.push(sample_at(now, 10, "0.55"));

        let in_window: Vec<_> = history.window(60, now).collect();
        assert_eq!(in_window.len(), 2);
        assert_eq!(in_window[0].price, Price::new(dec!(0.50)));
    }

    #[test]
    fn test_window_excludes_nonpositive_prices() {
        let mut history = PriceHistory::new(100);
        let now = Utc::now();

        history.push(sample_at(now, 30, "0"));
        history.push(sample_at(now, 20, "0.50"));

        let in_window: Vec<_> = history.window(60, now).collect();
        assert_eq!(in_window.len(), 1);
    }

    #[test]
    fn test_window_is_restartable() {
        let mut history = PriceHistory::new(100);
        let now = Utc::now();
        history.push(sample_at(now, 10, "0.50"));

        assert_eq!(history.window(60, now).count(), 1);
        // A second evaluation sees the same samples.
        assert_eq!(history.window(60, now).count(), 1);
    }

    #[test]
    fn test_recent_takes_last_k() {
        let mut history = PriceHistory::new(100);
        let now = Utc::now();
        for i in 0..10 {
            history.push(sample_at(now, 10 - i, "0.50"));
        }

        assert_eq!(history.recent(3).count(), 3);
        let first_of_recent = history.recent(3).next().unwrap();
        assert_eq!(first_of_recent.timestamp, now - Duration::seconds(3));

        // Asking for more than we have returns everything.
        assert_eq!(history.recent(50).count(), 10);
    }
}
