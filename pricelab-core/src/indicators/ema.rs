//! Exponential Moving Average (EMA).
//!
//! Recursive, no bias adjustment: EMA[0] = close[0],
//! EMA[t] = k * close[t] + (1 - k) * EMA[t-1], k = 2 / (span + 1).
//! Defined from the first bar.

use super::{closes, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Ema {
    span: usize,
    name: String,
}

impl Ema {
    pub fn new(span: usize, name: impl Into<String>) -> Self {
        Self {
            span: span.max(1),
            name: name.into(),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        ema_of_series(&closes(bars), self.span)
    }
}

/// Recursive EMA of an arbitrary series, seeded with its first finite value.
///
/// Used directly by composed indicators (MACD signal, RSI). A `NaN` input
/// repeats the previous average; positions before the seed are `NaN`.
pub fn ema_of_series(values: &[f64], span: usize) -> Vec<f64> {
    let k = 2.0 / (span.max(1) as f64 + 1.0);
    let mut prev: Option<f64> = None;

    values
        .iter()
        .map(|&value| {
            let next = match (prev, value.is_finite()) {
                (None, true) => Some(value),
                (Some(p), true) => Some(k * value + (1.0 - k) * p),
                (p, false) => p,
            };
            prev = next;
            next.unwrap_or(f64::NAN)
        })
        .collect()
}
