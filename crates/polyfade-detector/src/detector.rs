//! Spike detector implementation.
//!
//! For each configured window the detector compares the current price
//! against the oldest in-window sample (directional move) and against the
//! in-window peak-to-trough range (cumulative move), then reports the
//! single largest-magnitude result across all windows.

use chrono::{DateTime, Utc};
use polyfade_core::Price;
use polyfade_feed::PriceHistory;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::DetectorConfig;

/// Minimum total history before any spike is reported.
const MIN_HISTORY_SAMPLES: usize = 5;

/// Minimum samples a window needs to be evaluated.
const MIN_WINDOW_SAMPLES: usize = 3;

/// Sample count cap for the volatility estimate.
const VOLATILITY_LOOKBACK: usize = 100;

/// Ephemeral per-evaluation statistics. Recomputed on demand, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct SpikeStats {
    /// Largest signed percentage move found across all windows.
    pub spike_pct: Decimal,
    /// Window (seconds) that produced the winning move, if any.
    pub window_seconds: Option<i64>,
    /// Coefficient of variation (percent) over the recent sample tail.
    pub volatility_cv: Decimal,
    /// Whether the volatility filter vetoed this evaluation.
    pub volatility_filtered: bool,
    /// Human-readable veto reason when filtered.
    pub volatility_reason: Option<String>,
    /// Total samples in the history at evaluation time.
    pub history_count: usize,
}

impl SpikeStats {
    fn empty(history_count: usize) -> Self {
        Self {
            spike_pct: Decimal::ZERO,
            window_seconds: None,
            volatility_cv: Decimal::ZERO,
            volatility_filtered: false,
            volatility_reason: None,
            history_count,
        }
    }
}

/// Multi-window spike detector.
///
/// Stateless: every evaluation reads the shared price history and returns
/// fresh statistics.
#[derive(Debug, Clone)]
pub struct SpikeDetector {
    config: DetectorConfig,
}

impl SpikeDetector {
    /// Create a new detector with configuration.
    #[must_use]
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Get current configuration.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Compute the largest spike across all configured windows.
    ///
    /// Returns `(max_spike_pct, stats)`. The spike is signed: positive for
    /// an upward move, negative for a downward move. Cumulative
    /// peak-to-trough moves are reported as positive magnitudes.
    ///
    /// With fewer than 5 samples total the result is `(0, empty stats)`.
    pub fn compute(
        &self,
        current_price: Price,
        history: &PriceHistory,
        now: DateTime<Utc>,
    ) -> (Decimal, SpikeStats) {
        let history_count = history.len();
        if history_count < MIN_HISTORY_SAMPLES {
            return (Decimal::ZERO, SpikeStats::empty(history_count));
        }

        let mut max_spike = Decimal::ZERO;
        let mut best_window: Option<i64> = None;

        for &window_sec in &self.config.windows_seconds {
            let window_prices: Vec<Price> =
                history.window(window_sec, now).map(|s| s.price).collect();

            if window_prices.len() < MIN_WINDOW_SAMPLES {
                continue;
            }

            // Oldest in-window price is the baseline.
            let baseline = window_prices[0];
            if let Some(change_pct) = current_price.pct_from(baseline) {
                if change_pct.abs() > max_spike.abs() {
                    max_spike = change_pct;
                    best_window = Some(window_sec);
                }
            }

            // Peak-to-trough magnitude within the window.
            let min_p = window_prices.iter().copied().min().unwrap_or(baseline);
            let max_p = window_prices.iter().copied().max().unwrap_or(baseline);
            if min_p.is_positive() {
                let cumulative =
                    (max_p.inner() - min_p.inner()) / min_p.inner() * Decimal::from(100);
                if cumulative.abs() > max_spike.abs() {
                    max_spike = cumulative;
                    best_window = Some(window_sec);
                }
            }
        }

        let volatility_cv = self.volatility_cv(history);

        let mut stats = SpikeStats {
            spike_pct: max_spike,
            window_seconds: best_window,
            volatility_cv,
            volatility_filtered: false,
            volatility_reason: None,
            history_count,
        };

        if self.config.use_volatility_filter && volatility_cv > self.config.max_volatility_cv {
            stats.volatility_filtered = true;
            stats.volatility_reason = Some(format!(
                "CV={:.2}% > {}%",
                volatility_cv, self.config.max_volatility_cv
            ));
            debug!(
                volatility_cv = %volatility_cv,
                max_volatility_cv = %self.config.max_volatility_cv,
                "Volatility filter active"
            );
        }

        (max_spike, stats)
    }

    /// Coefficient of variation (stdev/mean, percent) over the last
    /// `VOLATILITY_LOOKBACK` positive-price samples. Zero with fewer than
    /// two usable samples.
    fn volatility_cv(&self, history: &PriceHistory) -> Decimal {
        let prices: Vec<f64> = history
            .recent(VOLATILITY_LOOKBACK)
            .filter(|s| s.price.is_positive())
            .map(|s| s.price.to_f64())
            .collect();

        if prices.len() < 2 {
            return Decimal::ZERO;
        }

        let n = prices.len() as f64;
        let mean = prices.iter().sum::<f64>() / n;
        if mean <= 0.0 {
            return Decimal::ZERO;
        }

        // Sample standard deviation (n - 1 denominator).
        let variance = prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / (n - 1.0);
        let cv = variance.sqrt() / mean * 100.0;

        Decimal::from_f64(cv).unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use polyfade_feed::PriceSample;
    use rust_decimal_macros::dec;

    fn detector() -> SpikeDetector {
        SpikeDetector::new(DetectorConfig {
            windows_seconds: vec![60, 120, 300],
            use_volatility_filter: false,
            ..Default::default()
        })
    }

    fn history_from(now: DateTime<Utc>, series: &[(i64, &str)]) -> PriceHistory {
        let mut history = PriceHistory::new(3600);
        for (secs_ago, price) in series {
            history.push(PriceSample::new(
                now - Duration::seconds(*secs_ago),
                Price::new(price.parse().unwrap()),
            ));
        }
        history
    }

    #[test]
    fn test_insufficient_history() {
        let now = Utc::now();
        let history = history_from(now, &[(30, "0.50"), (20, "0.50"), (10, "0.50")]);

        let (spike, stats) = detector().compute(Price::new(dec!(0.50)), &history, now);
        assert_eq!(spike, Decimal::ZERO);
        assert_eq!(stats.window_seconds, None);
        assert_eq!(stats.history_count, 3);
    }

    #[test]
    fn test_flat_series_is_zero() {
        let now = Utc::now();
        let series: Vec<(i64, &str)> = (1..=10).map(|i| (i * 5, "0.50")).collect();
        let history = history_from(now, &series);

        let (spike, stats) = detector().compute(Price::new(dec!(0.50)), &history, now);
        assert_eq!(spike, Decimal::ZERO);
        assert!(!stats.volatility_filtered);
    }

    #[test]
    fn test_five_percent_spike() {
        let now = Utc::now();
        // N equal samples at 0.50, then the current price at 0.525 (+5%).
        let series: Vec<(i64, &str)> = (1..=10).map(|i| (i * 5, "0.50")).collect();
        let history = history_from(now, &series);

        let (spike, stats) = detector().compute(Price::new(dec!(0.525)), &history, now);
        assert_eq!(spike, dec!(5));
        assert_eq!(stats.window_seconds, Some(60));
    }

    #[test]
    fn test_downward_spike_is_negative() {
        let now = Utc::now();
        let series: Vec<(i64, &str)> = (1..=10).map(|i| (i * 5, "0.50")).collect();
        let history = history_from(now, &series);

        let (spike, _) = detector().compute(Price::new(dec!(0.475)), &history, now);
        assert_eq!(spike, dec!(-5));
    }

    #[test]
    fn test_cumulative_peak_to_trough_wins() {
        let now = Utc::now();
        // Price ran up then came back: directional change is ~0 but the
        // in-window range is large.
        let history = history_from(
            now,
            &[
                (50, "0.50"),
                (40, "0.55"),
                (30, "0.60"),
                (20, "0.55"),
                (10, "0.50"),
            ],
        );

        let (spike, stats) = detector().compute(Price::new(dec!(0.50)), &history, now);
        // (0.60 - 0.50) / 0.50 * 100 = 20%
        assert_eq!(spike, dec!(20));
        assert_eq!(stats.window_seconds, Some(60));
    }

    #[test]
    fn test_tie_break_prefers_first_window() {
        let now = Utc::now();
        // All samples inside the smallest window, so every window sees the
        // identical series and produces the identical spike.
        let series: Vec<(i64, &str)> = vec![
            (50, "0.50"),
            (40, "0.50"),
            (30, "0.50"),
            (20, "0.50"),
            (10, "0.50"),
        ];
        let history = history_from(now, &series);

        let (spike, stats) = detector().compute(Price::new(dec!(0.55)), &history, now);
        assert_eq!(spike, dec!(10));
        assert_eq!(stats.window_seconds, Some(60));
    }

    #[test]
    fn test_window_skipped_below_three_samples() {
        let now = Utc::now();
        // Five samples total (enough history) but only two inside the 60s
        // and 120s windows; the move only registers in the 300s window.
        let history = history_from(
            now,
            &[
                (280, "0.50"),
                (250, "0.50"),
                (200, "0.50"),
                (40, "0.50"),
                (10, "0.55"),
            ],
        );

        let (spike, stats) = detector().compute(Price::new(dec!(0.55)), &history, now);
        assert_eq!(spike, dec!(10));
        assert_eq!(stats.window_seconds, Some(300));
    }

    #[test]
    fn test_volatility_filter_flags_noisy_series() {
        let now = Utc::now();
        let detector = SpikeDetector::new(DetectorConfig {
            windows_seconds: vec![60],
            use_volatility_filter: true,
            max_volatility_cv: dec!(1.0),
            ..Default::default()
        });

        // Alternating 0.40 / 0.60 is far noisier than CV 1%.
        let series: Vec<(i64, &str)> = (1..=10)
            .map(|i| (i * 5, if i % 2 == 0 { "0.40" } else { "0.60" }))
            .collect();
        let history = history_from(now, &series);

        let (_, stats) = detector.compute(Price::new(dec!(0.50)), &history, now);
        assert!(stats.volatility_filtered);
        assert!(stats.volatility_reason.is_some());
        assert!(stats.volatility_cv > dec!(1.0));
    }

    #[test]
    fn test_volatility_cv_zero_with_single_sample() {
        let now = Utc::now();
        let history = history_from(now, &[(10, "0.50")]);
        let cv = detector().volatility_cv(&history);
        assert_eq!(cv, Decimal::ZERO);
    }

    #[test]
    fn test_scenario_series_detects_spike() {
        // Price series [0.50 x3, 0.51, 0.52, 0.53, 0.52, 0.51, 0.50]
        // sampled 5s apart: the peak-to-trough move at the 0.53 sample is
        // (0.53 - 0.50) / 0.50 = +6%, above a 3% threshold.
        let now = Utc::now();
        let series = [
            "0.50", "0.50", "0.50", "0.51", "0.52", "0.53", "0.52", "0.51", "0.50",
        ];
        let mut history = PriceHistory::new(3600);
        for (i, p) in series.iter().enumerate() {
            history.push(PriceSample::new(
                now - Duration::seconds((series.len() - i) as i64 * 5),
                Price::new(p.parse().unwrap()),
            ));
        }

        let detector = SpikeDetector::new(DetectorConfig {
            windows_seconds: vec![60, 120, 300],
            spike_threshold_pct: dec!(3.0),
            use_volatility_filter: false,
            ..Default::default()
        });

        let (spike, stats) = detector.compute(Price::new(dec!(0.53)), &history, now);
        assert!(spike >= dec!(3.0), "spike was {spike}");
        assert_eq!(stats.window_seconds, Some(60));
    }
}
