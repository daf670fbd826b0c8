//! Indicator engine.
//!
//! Every indicator implements `Indicator`: bar history in, one value per bar
//! out. All of them are defined from the very first bar (rolling statistics
//! use a minimum of one observation, recursive averages are seeded with the
//! first value), so the output never has leading gaps.
//!
//! Multi-series indicators (Bollinger) are exposed as separate named
//! instances per band, keeping the single-series trait unchanged.
//!
//! # Look-ahead contamination guard
//! No value at bar t may depend on bars after t. `tests/lookahead_test.rs`
//! checks every indicator against a truncated series.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod series;
pub mod sma;
pub mod window;

pub use bollinger::{Bollinger, BollingerBand, RollingStd};
pub use ema::{ema_of_series, Ema};
pub use macd::{Macd, MacdSignal};
pub use rsi::Rsi;
pub use series::{compute_indicators, IndicatorRow, IndicatorSeries, IndicatorValues};
pub use sma::{rolling_mean, Sma};
pub use window::WindowPlan;

use crate::domain::Bar;

/// Trait for indicators.
///
/// `compute` returns a `Vec<f64>` of the same length as `bars`.
pub trait Indicator: Send + Sync {
    /// Payload column name (e.g. "MA20", "RSI").
    fn name(&self) -> &str;

    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Close prices of `bars`, in order.
pub(crate) fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|bar| bar.close).collect()
}

/// Create daily bars from close prices for testing.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar::from_close(base + chrono::Duration::days(i as i64), close))
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
