//! Relative Strength Index (RSI).
//!
//! Per-bar change split into gain and loss, each smoothed with the recursive
//! EMA at the RSI span. RSI = 100 - 100 / (1 + avg_gain / (avg_loss + ε)).
//! The first bar has no change and reports the neutral 50; smoothing is seeded
//! at the second bar's change.

use super::ema::ema_of_series;
use super::{closes, Indicator};
use crate::domain::Bar;

/// Keeps the ratio finite on loss-free stretches.
pub const RSI_EPSILON: f64 = 1e-8;

/// Value before any change is observed.
pub const NEUTRAL_RSI: f64 = 50.0;

#[derive(Debug, Clone)]
pub struct Rsi {
    span: usize,
}

impl Rsi {
    pub fn new(span: usize) -> Self {
        Self { span: span.max(1) }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        "RSI"
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes = closes(bars);
        if closes.is_empty() {
            return Vec::new();
        }

        let mut gains = Vec::with_capacity(closes.len());
        let mut losses = Vec::with_capacity(closes.len());
        gains.push(f64::NAN);
        losses.push(f64::NAN);
        for pair in closes.windows(2) {
            let change = pair[1] - pair[0];
            gains.push(if change.is_nan() { f64::NAN } else { change.max(0.0) });
            losses.push(if change.is_nan() { f64::NAN } else { (-change).max(0.0) });
        }

        let avg_gain = ema_of_series(&gains, self.span);
        let avg_loss = ema_of_series(&losses, self.span);

        avg_gain
            .iter()
            .zip(&avg_loss)
            .map(|(&gain, &loss)| compute_rsi(gain, loss))
            .collect()
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_gain.is_nan() || avg_loss.is_nan() {
        return NEUTRAL_RSI;
    }
    let rs = avg_gain / (avg_loss + RSI_EPSILON);
    100.0 - 100.0 / (1.0 + rs)
}
