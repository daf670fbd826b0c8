//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a trailing window, minimum one
//! observation: before the window fills, the mean covers every bar so far.
//! Missing (`NaN`) closes are skipped, not propagated.

use super::{closes, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Sma {
    window: usize,
    name: String,
}

impl Sma {
    /// A window of 0 is evaluated as 1.
    pub fn new(window: usize, name: impl Into<String>) -> Self {
        Self {
            window: window.max(1),
            name: name.into(),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        rolling_mean(&closes(bars), self.window)
    }
}

/// Trailing mean over at most `window` values, ignoring `NaN`s.
///
/// Each window is summed from scratch, so an outlier stops affecting the
/// mean once it leaves the window. A position whose window holds no finite
/// value is `NaN`.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let (sum, count) = values[start..=i]
                .iter()
                .filter(|v| v.is_finite())
                .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
            if count == 0 {
                f64::NAN
            } else {
                sum / count as f64
            }
        })
        .collect()
}
