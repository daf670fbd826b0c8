//! Acquisition controller: sanitized symbol, bounded retries with exponential
//! backoff, post-fetch validation, normalization.
//!
//! `try_acquire` returns an explicit result so callers and tests can see why
//! acquisition failed. `acquire` is the boundary used by the service layer: it
//! never fails and degrades every error to the empty series.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use super::normalize::{missing_required_columns, normalize, RequiredColumn};
use super::provider::{UpstreamError, UpstreamSource};
use crate::domain::{Interval, NormalizedSeries, Period, Symbol};
use crate::error::PipelineError;

/// Attempt budget and backoff unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Pause after the failed attempt with 0-based index `attempt`:
    /// `backoff_unit * 2^attempt`, saturating.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.backoff_unit.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }
}

/// Blocking pause between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Sleeps on the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Never sleeps. For offline sources and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _duration: Duration) {}
}

/// Why one attempt did not produce a usable table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptFailure {
    #[error("upstream returned no data")]
    Empty,

    #[error("network error: {0}")]
    Network(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("response is missing required columns: {}", join_columns(.0))]
    MissingColumns(Vec<RequiredColumn>),
}

fn join_columns(columns: &[RequiredColumn]) -> String {
    columns
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<UpstreamError> for AttemptFailure {
    fn from(error: UpstreamError) -> Self {
        match error {
            UpstreamError::Network(message) => Self::Network(message),
            UpstreamError::Other(message) => Self::Upstream(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquisitionError {
    #[error("invalid symbol: '{input}'")]
    InvalidSymbol { input: String },

    #[error("no usable data after {attempts} attempt(s){}", describe_last(.last_failure))]
    Exhausted {
        attempts: u32,
        last_failure: Option<AttemptFailure>,
    },
}

fn describe_last(failure: &Option<AttemptFailure>) -> String {
    failure
        .as_ref()
        .map(|failure| format!(": {failure}"))
        .unwrap_or_default()
}

impl From<AcquisitionError> for PipelineError {
    fn from(error: AcquisitionError) -> Self {
        match error {
            AcquisitionError::InvalidSymbol { input } => Self::InvalidSymbol { input },
            AcquisitionError::Exhausted { attempts, .. } => Self::UpstreamUnavailable { attempts },
        }
    }
}

/// Fetches one ticker's history through an upstream source.
///
/// Holds no per-request state; one controller may serve concurrent callers.
#[derive(Clone)]
pub struct AcquisitionController {
    source: Arc<dyn UpstreamSource>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl AcquisitionController {
    pub fn new(source: Arc<dyn UpstreamSource>, policy: RetryPolicy) -> Self {
        Self::with_sleeper(source, policy, Arc::new(ThreadSleeper))
    }

    pub fn with_sleeper(
        source: Arc<dyn UpstreamSource>,
        policy: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            source,
            policy,
            sleeper,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Fetch and normalize, reporting why acquisition failed.
    ///
    /// A usable response whose rows are all dropped is `Ok` with an empty
    /// series; it is not retried.
    pub fn try_acquire(
        &self,
        ticker: &str,
        period: Period,
        interval: Interval,
    ) -> Result<NormalizedSeries, AcquisitionError> {
        let symbol = Symbol::sanitize(ticker).map_err(|_| AcquisitionError::InvalidSymbol {
            input: ticker.to_owned(),
        })?;

        let max_retries = self.policy.max_retries;
        let mut last_failure = None;

        for attempt in 0..max_retries {
            match self.attempt(&symbol, period, interval) {
                Ok(series) => {
                    debug!(
                        symbol = %symbol,
                        attempt,
                        rows = series.len(),
                        source = self.source.name(),
                        "acquired series"
                    );
                    return Ok(series);
                }
                Err(failure) => {
                    debug!(symbol = %symbol, attempt, error = %failure, "attempt failed");
                    last_failure = Some(failure);
                }
            }

            if attempt + 1 < max_retries {
                let delay = self.policy.delay_for_attempt(attempt);
                debug!(symbol = %symbol, attempt, delay_ms = delay.as_millis() as u64, "backing off");
                self.sleeper.sleep(delay);
            }
        }

        let error = AcquisitionError::Exhausted {
            attempts: max_retries,
            last_failure,
        };
        warn!(symbol = %symbol, error = %error, "acquisition exhausted");
        Err(error)
    }

    /// Fetch and normalize; any failure becomes the empty series.
    pub fn acquire(&self, ticker: &str, period: Period, interval: Interval) -> NormalizedSeries {
        self.try_acquire(ticker, period, interval)
            .unwrap_or_else(|_| NormalizedSeries::empty())
    }

    fn attempt(
        &self,
        symbol: &Symbol,
        period: Period,
        interval: Interval,
    ) -> Result<NormalizedSeries, AttemptFailure> {
        let table = self
            .source
            .history(symbol, period, interval)?
            .filter(|table| !table.is_empty())
            .ok_or(AttemptFailure::Empty)?;

        let missing = missing_required_columns(&table);
        if !missing.is_empty() {
            return Err(AttemptFailure::MissingColumns(missing));
        }

        Ok(normalize(&table))
    }
}
