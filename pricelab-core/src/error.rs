//! Pipeline error taxonomy.
//!
//! Most of these never cross a public boundary: acquisition degrades to an
//! empty series and the indicator engine absorbs numeric edge cases. They
//! exist so internals and tests can tell the failure kinds apart.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Empty or unparseable ticker, rejected before any upstream call.
    #[error("invalid symbol: '{input}'")]
    InvalidSymbol { input: String },

    /// Retries exhausted, or the upstream response stayed malformed.
    #[error("upstream unavailable after {attempts} attempt(s)")]
    UpstreamUnavailable { attempts: u32 },

    /// Not enough bars to attempt a forecast.
    #[error("insufficient history: need {required} bars, have {actual}")]
    InsufficientHistory { required: usize, actual: usize },

    /// Numeric guard tripped inside a computation.
    #[error("degenerate computation: {0}")]
    ComputationDegenerate(String),
}
