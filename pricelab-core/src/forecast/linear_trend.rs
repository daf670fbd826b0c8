//! Linear trend model.
//!
//! Ordinary least squares fit of close on calendar days since the first
//! observation. Uncertainty comes from the residuals: the population standard
//! deviation, widened by `sqrt(h + 1)` at the h-th future step and scaled by
//! the z-score of the configured interval width.

use chrono::NaiveDate;

use super::{TrendEstimate, TrendModel, TrendModelError};

/// Default uncertainty interval width.
pub const DEFAULT_INTERVAL_WIDTH: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTrendModel {
    interval_width: f64,
}

impl Default for LinearTrendModel {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL_WIDTH)
    }
}

impl LinearTrendModel {
    pub fn new(interval_width: f64) -> Self {
        Self { interval_width }
    }

    pub fn interval_width(&self) -> f64 {
        self.interval_width
    }
}

/// Two-sided z-score for an interval width (approximate).
pub fn z_score(interval_width: f64) -> f64 {
    match interval_width {
        x if x >= 0.99 => 2.576,
        x if x >= 0.95 => 1.96,
        x if x >= 0.90 => 1.645,
        x if x >= 0.80 => 1.282,
        _ => 1.96,
    }
}

/// Fitted line `y = intercept + slope * t`, t in days.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Fit {
    intercept: f64,
    slope: f64,
    residual_std: f64,
}

impl Fit {
    fn at(&self, t: f64) -> f64 {
        self.intercept + self.slope * t
    }
}

fn fit(points: &[(f64, f64)]) -> Result<Fit, TrendModelError> {
    if points.len() < 2 {
        return Err(TrendModelError::Degenerate(format!(
            "need at least 2 observations, have {}",
            points.len()
        )));
    }
    if points.iter().any(|(_, y)| !y.is_finite()) {
        return Err(TrendModelError::Degenerate("non-finite observation".into()));
    }

    let n = points.len() as f64;
    let mean_t = points.iter().map(|(t, _)| t).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    // Centered sums
    let s_tt: f64 = points.iter().map(|(t, _)| (t - mean_t).powi(2)).sum();
    let s_ty: f64 = points
        .iter()
        .map(|(t, y)| (t - mean_t) * (y - mean_y))
        .sum();

    if s_tt.abs() < 1e-10 {
        return Err(TrendModelError::Degenerate(
            "all observations fall on one day".into(),
        ));
    }

    let slope = s_ty / s_tt;
    let intercept = mean_y - slope * mean_t;

    let residuals: Vec<f64> = points
        .iter()
        .map(|(t, y)| y - (intercept + slope * t))
        .collect();
    let mean_r = residuals.iter().sum::<f64>() / n;
    let variance = residuals.iter().map(|r| (r - mean_r).powi(2)).sum::<f64>() / n;

    Ok(Fit {
        intercept,
        slope,
        residual_std: variance.sqrt(),
    })
}

impl TrendModel for LinearTrendModel {
    fn name(&self) -> &str {
        "linear_trend"
    }

    fn fit_predict(
        &self,
        history: &[(NaiveDate, f64)],
        future_dates: &[NaiveDate],
    ) -> Result<Vec<TrendEstimate>, TrendModelError> {
        let Some(&(origin, _)) = history.first() else {
            return Err(TrendModelError::Degenerate("empty history".into()));
        };
        let days = |date: NaiveDate| (date - origin).num_days() as f64;

        let points: Vec<(f64, f64)> = history.iter().map(|&(d, y)| (days(d), y)).collect();
        let line = fit(&points)?;
        let z = z_score(self.interval_width);

        let band = |t: f64, std_error: f64| {
            let estimate = line.at(t);
            TrendEstimate {
                estimate,
                lower: estimate - z * std_error,
                upper: estimate + z * std_error,
            }
        };

        let in_sample = points.iter().map(|&(t, _)| band(t, line.residual_std));
        let future = future_dates.iter().enumerate().map(|(h, &date)| {
            band(days(date), line.residual_std * ((h + 1) as f64).sqrt())
        });

        Ok(in_sample.chain(future).collect())
    }
}
