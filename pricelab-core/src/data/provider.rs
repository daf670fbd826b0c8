//! Upstream source trait and the raw table it returns.
//!
//! The UpstreamSource trait abstracts over data sources (Yahoo Finance, the
//! synthetic generator, scripted replays) so the acquisition loop can be
//! driven against a mock in tests.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::domain::{Interval, Period, Symbol};

/// One raw timestamp as the upstream reported it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTimestamp {
    /// Epoch seconds. `utc_offset_seconds` is set when the exchange timezone
    /// is known, which makes the value timezone-aware.
    Unix {
        seconds: i64,
        utc_offset_seconds: Option<i32>,
    },
    /// Free-form text, parsed by the normalizer.
    Text(String),
    Missing,
}

impl RawTimestamp {
    pub fn utc(seconds: i64) -> Self {
        Self::Unix {
            seconds,
            utc_offset_seconds: None,
        }
    }
}

/// One raw cell, numeric or malformed.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Missing,
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Option<f64>> for RawValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Missing, Self::Number)
    }
}

/// Columns an upstream table may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RawField {
    Open,
    High,
    Low,
    Close,
    Volume,
    Dividends,
    Splits,
}

impl RawField {
    pub const ALL: [RawField; 7] = [
        Self::Open,
        Self::High,
        Self::Low,
        Self::Close,
        Self::Volume,
        Self::Dividends,
        Self::Splits,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::High => "High",
            Self::Low => "Low",
            Self::Close => "Close",
            Self::Volume => "Volume",
            Self::Dividends => "Dividends",
            Self::Splits => "Stock Splits",
        }
    }
}

/// Column-oriented upstream response, before any validation.
///
/// A column may be shorter than the timestamp vector; missing tail cells read
/// as missing values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub timestamps: Option<Vec<RawTimestamp>>,
    pub columns: BTreeMap<RawField, Vec<RawValue>>,
}

impl RawTable {
    pub fn new(timestamps: Vec<RawTimestamp>) -> Self {
        Self {
            timestamps: Some(timestamps),
            columns: BTreeMap::new(),
        }
    }

    /// Builder-style column insert.
    pub fn with_column(mut self, field: RawField, values: Vec<RawValue>) -> Self {
        self.columns.insert(field, values);
        self
    }

    pub fn column(&self, field: RawField) -> Option<&[RawValue]> {
        self.columns.get(&field).map(Vec::as_slice)
    }

    /// Number of rows, as given by the timestamp vector.
    pub fn row_count(&self) -> usize {
        self.timestamps.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }
}

/// Failures an upstream call may raise.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    #[error("network error: {0}")]
    Network(String),

    #[error("upstream error: {0}")]
    Other(String),
}

/// A remote (or simulated) history source.
///
/// `Ok(None)` is the upstream's "nothing for this request" answer; the
/// acquisition loop treats it like an empty table.
pub trait UpstreamSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    fn history(
        &self,
        symbol: &Symbol,
        period: Period,
        interval: Interval,
    ) -> Result<Option<RawTable>, UpstreamError>;
}
