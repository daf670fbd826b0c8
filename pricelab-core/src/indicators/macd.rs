//! MACD line and its signal line.
//!
//! MACD = EMA(close, fast) - EMA(close, slow); signal = EMA(MACD, signal span).
//! Both defined from the first bar.

use super::ema::ema_of_series;
use super::{closes, Indicator};
use crate::domain::Bar;

pub const FAST_SPAN: usize = 12;
pub const SLOW_SPAN: usize = 26;
pub const SIGNAL_SPAN: usize = 9;

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
}

impl Macd {
    pub fn new(fast: usize, slow: usize) -> Self {
        Self { fast, slow }
    }

    /// MACD from already computed fast and slow EMAs.
    pub fn from_emas(fast: &[f64], slow: &[f64]) -> Vec<f64> {
        fast.iter().zip(slow).map(|(f, s)| f - s).collect()
    }
}

impl Default for Macd {
    fn default() -> Self {
        Self::new(FAST_SPAN, SLOW_SPAN)
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        "MACD"
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes = closes(bars);
        Self::from_emas(
            &ema_of_series(&closes, self.fast),
            &ema_of_series(&closes, self.slow),
        )
    }
}

#[derive(Debug, Clone)]
pub struct MacdSignal {
    macd: Macd,
    span: usize,
}

impl MacdSignal {
    pub fn new(macd: Macd, span: usize) -> Self {
        Self { macd, span }
    }

    pub fn standard() -> Self {
        Self::new(Macd::default(), SIGNAL_SPAN)
    }
}

impl Indicator for MacdSignal {
    fn name(&self) -> &str {
        "MACD_Signal"
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        ema_of_series(&self.macd.compute(bars), self.span)
    }
}
