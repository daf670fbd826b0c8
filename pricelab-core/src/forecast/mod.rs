//! Forecast adapter: project closing prices forward through a trend model.
//!
//! The adapter only shapes the input (date/close pairs), chooses the future
//! dates, and trims the model output to the future tail. Fitting is the
//! model's business.

pub mod linear_trend;

pub use linear_trend::LinearTrendModel;

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::bar::serialize_naive_date;
use crate::domain::NormalizedSeries;
use crate::error::PipelineError;

/// Default number of future calendar days.
pub const DEFAULT_HORIZON: usize = 30;

/// Fewest bars a forecast is attempted on.
pub const DEFAULT_MIN_HISTORY: usize = 20;

/// Failures a trend model may report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrendModelError {
    #[error("degenerate input: {0}")]
    Degenerate(String),

    #[error("model failed: {0}")]
    Failed(String),
}

impl From<TrendModelError> for PipelineError {
    fn from(error: TrendModelError) -> Self {
        Self::ComputationDegenerate(error.to_string())
    }
}

/// One model estimate with its uncertainty band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendEstimate {
    pub estimate: f64,
    pub lower: f64,
    pub upper: f64,
}

/// External trend-modeling capability.
pub trait TrendModel: Send + Sync {
    fn name(&self) -> &str;

    /// Fit on `history` and return one estimate per history point followed by
    /// one per entry of `future_dates`.
    fn fit_predict(
        &self,
        history: &[(NaiveDate, f64)],
        future_dates: &[NaiveDate],
    ) -> Result<Vec<TrendEstimate>, TrendModelError>;
}

/// One projected point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    #[serde(serialize_with = "serialize_naive_date")]
    pub date: NaiveDate,
    pub predicted: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Why no forecast was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoForecastReason {
    ModelUnavailable,
    InsufficientHistory { required: usize, actual: usize },
    ModelFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForecastOutcome {
    Forecast(Vec<ForecastPoint>),
    NoForecast(NoForecastReason),
}

impl ForecastOutcome {
    pub fn points(&self) -> Option<&[ForecastPoint]> {
        match self {
            Self::Forecast(points) => Some(points),
            Self::NoForecast(_) => None,
        }
    }

    /// Points, or the pipeline error describing the missing forecast.
    pub fn into_result(self) -> Result<Vec<ForecastPoint>, PipelineError> {
        match self {
            Self::Forecast(points) => Ok(points),
            Self::NoForecast(NoForecastReason::InsufficientHistory { required, actual }) => {
                Err(PipelineError::InsufficientHistory { required, actual })
            }
            Self::NoForecast(NoForecastReason::ModelUnavailable) => Err(
                PipelineError::ComputationDegenerate("no trend model configured".into()),
            ),
            Self::NoForecast(NoForecastReason::ModelFailed(message)) => {
                Err(PipelineError::ComputationDegenerate(message))
            }
        }
    }
}

/// Guards and shapes calls into an optional trend model.
#[derive(Clone)]
pub struct ForecastAdapter {
    model: Option<Arc<dyn TrendModel>>,
    min_history: usize,
}

impl ForecastAdapter {
    pub fn new(model: Option<Arc<dyn TrendModel>>) -> Self {
        Self {
            model,
            min_history: DEFAULT_MIN_HISTORY,
        }
    }

    /// An adapter with no model; every call is `ModelUnavailable`.
    pub fn unavailable() -> Self {
        Self::new(None)
    }

    pub fn with_min_history(mut self, min_history: usize) -> Self {
        self.min_history = min_history;
        self
    }

    pub fn is_available(&self) -> bool {
        self.model.is_some()
    }

    /// Project `series` forward `horizon` calendar days past its last bar.
    pub fn forecast(&self, series: &NormalizedSeries, horizon: usize) -> ForecastOutcome {
        let Some(model) = self.model.as_ref() else {
            return ForecastOutcome::NoForecast(NoForecastReason::ModelUnavailable);
        };
        if series.len() < self.min_history {
            return ForecastOutcome::NoForecast(NoForecastReason::InsufficientHistory {
                required: self.min_history,
                actual: series.len(),
            });
        }
        let Some(last) = series.last_date() else {
            return ForecastOutcome::NoForecast(NoForecastReason::InsufficientHistory {
                required: self.min_history,
                actual: 0,
            });
        };

        let future_dates = match future_dates(last.date(), horizon) {
            Some(dates) => dates,
            None => {
                return ForecastOutcome::NoForecast(NoForecastReason::ModelFailed(
                    "forecast horizon runs past the calendar".into(),
                ))
            }
        };
        let history: Vec<(NaiveDate, f64)> = series
            .bars()
            .iter()
            .map(|bar| (bar.day(), bar.close))
            .collect();

        let estimates = match model.fit_predict(&history, &future_dates) {
            Ok(estimates) => estimates,
            Err(error) => {
                warn!(model = model.name(), %error, "trend model failed");
                return ForecastOutcome::NoForecast(NoForecastReason::ModelFailed(
                    error.to_string(),
                ));
            }
        };
        if estimates.len() < horizon {
            return ForecastOutcome::NoForecast(NoForecastReason::ModelFailed(format!(
                "model returned {} estimates for a horizon of {horizon}",
                estimates.len()
            )));
        }

        let tail = &estimates[estimates.len() - horizon..];
        let points: Vec<ForecastPoint> = future_dates
            .into_iter()
            .zip(tail)
            .map(|(date, estimate)| ForecastPoint {
                date,
                predicted: estimate.estimate,
                lower_bound: estimate.lower,
                upper_bound: estimate.upper,
            })
            .collect();

        debug!(model = model.name(), points = points.len(), "forecast produced");
        ForecastOutcome::Forecast(points)
    }
}

/// The `horizon` calendar days after `last`.
fn future_dates(last: NaiveDate, horizon: usize) -> Option<Vec<NaiveDate>> {
    (1..=horizon)
        .map(|step| {
            i64::try_from(step)
                .ok()
                .and_then(Duration::try_days)
                .and_then(|offset| last.checked_add_signed(offset))
        })
        .collect()
}
