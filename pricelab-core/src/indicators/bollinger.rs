//! Bollinger Bands: moving average +/- standard deviation multiplier.
//!
//! Three bands (separate Indicator instances):
//! - Middle: rolling mean(close, window)
//! - Upper: middle + mult * stddev(close, window)
//! - Lower: middle - mult * stddev(close, window)
//!
//! Uses population stddev (divide by N) with a minimum of one observation,
//! so a single-bar window has zero width.

use super::sma::rolling_mean;
use super::{closes, Indicator};
use crate::domain::Bar;

/// Which band of the Bollinger Bands to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    window: usize,
    multiplier: f64,
    band: BollingerBand,
    name: &'static str,
}

impl Bollinger {
    pub fn upper(window: usize, multiplier: f64) -> Self {
        Self::band(BollingerBand::Upper, window, multiplier)
    }

    pub fn middle(window: usize) -> Self {
        Self::band(BollingerBand::Middle, window, 0.0)
    }

    pub fn lower(window: usize, multiplier: f64) -> Self {
        Self::band(BollingerBand::Lower, window, multiplier)
    }

    fn band(band: BollingerBand, window: usize, multiplier: f64) -> Self {
        let name = match band {
            BollingerBand::Upper => "BB_Upper",
            BollingerBand::Middle => "BB_Middle",
            BollingerBand::Lower => "BB_Lower",
        };
        Self {
            window: window.max(1),
            multiplier,
            band,
            name,
        }
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        self.name
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes = closes(bars);
        let middle = rolling_mean(&closes, self.window);
        let sign = match self.band {
            BollingerBand::Middle => return middle,
            BollingerBand::Upper => 1.0,
            BollingerBand::Lower => -1.0,
        };
        let std = rolling_std(&closes, self.window);
        middle
            .iter()
            .zip(&std)
            .map(|(m, s)| m + sign * self.multiplier * s)
            .collect()
    }
}

/// Rolling population standard deviation of close (the `BB_Std` column).
#[derive(Debug, Clone)]
pub struct RollingStd {
    window: usize,
}

impl RollingStd {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
        }
    }
}

impl Indicator for RollingStd {
    fn name(&self) -> &str {
        "BB_Std"
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        rolling_std(&closes(bars), self.window)
    }
}

/// Trailing population standard deviation over at most `window` values,
/// ignoring `NaN`s.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let finite: Vec<f64> = values[start..=i]
                .iter()
                .copied()
                .filter(|v| v.is_finite())
                .collect();
            if finite.is_empty() {
                return f64::NAN;
            }
            let n = finite.len() as f64;
            let mean = finite.iter().sum::<f64>() / n;
            let variance = finite.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
            variance.sqrt()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn bollinger_middle_is_rolling_mean() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let result = Bollinger::middle(3).compute(&bars);

        assert_approx(result[0], 10.0, DEFAULT_EPSILON);
        assert_approx(result[1], 10.5, DEFAULT_EPSILON);
        // mean(10,11,12) = 11.0
        assert_approx(result[2], 11.0, DEFAULT_EPSILON);
        // mean(11,12,13) = 12.0
        assert_approx(result[3], 12.0, DEFAULT_EPSILON);
    }

    #[test]
    fn population_std_known_values() {
        // Window (2, 4, 4, 4, 5, 5, 7, 9): mean 5, population std 2
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let result = rolling_std(&values, 8);
        assert_approx(result[7], 2.0, DEFAULT_EPSILON);
        // (10, 12): population std 1, sample std would be sqrt(2)
        assert_approx(rolling_std(&[10.0, 12.0], 2)[1], 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn first_bar_has_zero_width() {
        let bars = make_bars(&[42.0, 50.0]);
        assert_eq!(RollingStd::new(20).compute(&bars)[0], 0.0);
        assert_eq!(Bollinger::upper(20, 2.0).compute(&bars)[0], 42.0);
        assert_eq!(Bollinger::lower(20, 2.0).compute(&bars)[0], 42.0);
    }

    #[test]
    fn bollinger_bands_symmetric() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let upper = Bollinger::upper(3, 2.0).compute(&bars);
        let middle = Bollinger::middle(3).compute(&bars);
        let lower = Bollinger::lower(3, 2.0).compute(&bars);

        for i in 0..5 {
            let half_width = upper[i] - middle[i];
            assert_approx(middle[i] - lower[i], half_width, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn bands_are_two_std_from_middle() {
        let bars = make_bars(&[10.0, 12.0, 11.0, 15.0, 9.0]);
        let middle = Bollinger::middle(4).compute(&bars);
        let std = RollingStd::new(4).compute(&bars);
        let upper = Bollinger::upper(4, 2.0).compute(&bars);
        for i in 0..5 {
            assert_approx(upper[i], middle[i] + 2.0 * std[i], DEFAULT_EPSILON);
        }
    }

    #[test]
    fn bollinger_constant_price_zero_width() {
        let bars = make_bars(&[100.0, 100.0, 100.0, 100.0]);
        let upper = Bollinger::upper(3, 2.0).compute(&bars);
        let lower = Bollinger::lower(3, 2.0).compute(&bars);
        assert_approx(upper[3], 100.0, DEFAULT_EPSILON);
        assert_approx(lower[3], 100.0, DEFAULT_EPSILON);
    }
}
