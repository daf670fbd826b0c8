//! Bar: one cleaned observation of an instrument, and the ordered series of them.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};

/// Calendar-date format used in every external payload.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Normalized OHLCV bar.
///
/// `date` is timezone-naive. Every numeric field except `close` may be `NaN`
/// when the upstream value was absent or malformed. Serializes with the
/// payload keys consumers already know (`Date`, `Close`, `Stock Splits`, ...);
/// `NaN` becomes `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    #[serde(rename = "Date", serialize_with = "serialize_calendar_date")]
    pub date: NaiveDateTime,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Volume")]
    pub volume: f64,
    #[serde(rename = "Dividends")]
    pub dividends: f64,
    #[serde(rename = "Stock Splits")]
    pub splits: f64,
}

impl Bar {
    /// A bar carrying only a close; every other field is absent.
    pub fn from_close(date: NaiveDateTime, close: f64) -> Self {
        Self {
            date,
            open: f64::NAN,
            high: f64::NAN,
            low: f64::NAN,
            close,
            volume: f64::NAN,
            dividends: f64::NAN,
            splits: f64::NAN,
        }
    }

    /// Calendar day of this bar.
    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }

    /// A bar is usable only with a finite close.
    pub fn has_valid_close(&self) -> bool {
        self.close.is_finite()
    }
}

/// Serialize a timestamp as its calendar date (`YYYY-MM-DD`).
pub fn serialize_calendar_date<S: Serializer>(
    date: &NaiveDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&date.format(DATE_FORMAT))
}

/// Serialize a calendar date as `YYYY-MM-DD`.
pub fn serialize_naive_date<S: Serializer>(
    date: &NaiveDate,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&date.format(DATE_FORMAT))
}

/// Ordered, cleaned bar series.
///
/// Invariants, held by construction:
/// - every bar has a finite close
/// - dates are non-decreasing (stable order for equal dates)
///
/// The series may be empty. It is built fresh per request and never shared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedSeries {
    bars: Vec<Bar>,
}

impl NormalizedSeries {
    /// Build a series, dropping bars without a valid close and sorting by date.
    pub fn from_bars(bars: Vec<Bar>) -> Self {
        let mut bars: Vec<Bar> = bars.into_iter().filter(Bar::has_valid_close).collect();
        bars.sort_by_key(|bar| bar.date);
        Self { bars }
    }

    /// The canonical empty series.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }

    /// Date of the last (latest) bar.
    pub fn last_date(&self) -> Option<NaiveDateTime> {
        self.bars.last().map(|bar| bar.date)
    }
}
