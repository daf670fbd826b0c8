//! Series normalizer: raw upstream table → `NormalizedSeries`.
//!
//! Best-effort throughout. Timestamps that cannot be parsed and cells that
//! are not numeric become missing markers; rows missing a date or a close are
//! dropped. Nothing here returns an error.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

use super::provider::{RawField, RawTable, RawTimestamp, RawValue};
use crate::domain::{Bar, NormalizedSeries};

/// Naive formats tried, in order, after RFC 3339.
const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Aware formats tried after RFC 3339 (`+HHMM` style offsets).
const AWARE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%z"];

/// Columns the pipeline cannot do without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredColumn {
    Timestamp,
    Close,
}

impl std::fmt::Display for RequiredColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timestamp => f.write_str("Date"),
            Self::Close => f.write_str("Close"),
        }
    }
}

/// Required columns absent from `table`.
pub fn missing_required_columns(table: &RawTable) -> Vec<RequiredColumn> {
    let mut missing = Vec::new();
    if table.timestamps.is_none() {
        missing.push(RequiredColumn::Timestamp);
    }
    if table.column(RawField::Close).is_none() {
        missing.push(RequiredColumn::Close);
    }
    missing
}

/// Clean `table` into a series.
pub fn normalize(table: &RawTable) -> NormalizedSeries {
    let Some(timestamps) = table.timestamps.as_deref() else {
        return NormalizedSeries::empty();
    };

    let bars = timestamps
        .iter()
        .enumerate()
        .filter_map(|(row, raw)| {
            let date = parse_timestamp(raw)?;
            let cell = |field| coerce_cell(table, field, row);
            Some(Bar {
                date,
                open: cell(RawField::Open),
                high: cell(RawField::High),
                low: cell(RawField::Low),
                close: cell(RawField::Close),
                volume: cell(RawField::Volume),
                dividends: cell(RawField::Dividends),
                splits: cell(RawField::Splits),
            })
        })
        .collect();

    NormalizedSeries::from_bars(bars)
}

fn coerce_cell(table: &RawTable, field: RawField, row: usize) -> f64 {
    table
        .column(field)
        .and_then(|values| values.get(row))
        .map_or(f64::NAN, coerce_value)
}

/// Numeric coercion of one cell; anything non-numeric is `NaN`.
pub fn coerce_value(value: &RawValue) -> f64 {
    match value {
        RawValue::Number(number) => *number,
        RawValue::Text(text) => text.trim().parse::<f64>().unwrap_or(f64::NAN),
        RawValue::Missing => f64::NAN,
    }
}

/// Parse one raw timestamp into a timezone-naive value.
pub fn parse_timestamp(raw: &RawTimestamp) -> Option<NaiveDateTime> {
    match raw {
        RawTimestamp::Unix {
            seconds,
            utc_offset_seconds: None,
        } => DateTime::from_timestamp(*seconds, 0).map(|utc| utc.naive_utc()),
        RawTimestamp::Unix {
            seconds,
            utc_offset_seconds: Some(offset),
        } => {
            let local = seconds
                .checked_add(i64::from(*offset))
                .and_then(|local| DateTime::from_timestamp(local, 0))?
                .naive_utc();
            Some(strip_timezone(local, *offset))
        }
        RawTimestamp::Text(text) => parse_text(text.trim()),
        RawTimestamp::Missing => None,
    }
}

fn parse_text(text: &str) -> Option<NaiveDateTime> {
    if text.is_empty() {
        return None;
    }

    let aware = DateTime::parse_from_rfc3339(text).ok().or_else(|| {
        AWARE_FORMATS
            .iter()
            .find_map(|format| DateTime::parse_from_str(text, format).ok())
    });
    if let Some(aware) = aware {
        return Some(strip_timezone(
            aware.naive_local(),
            aware.offset().local_minus_utc(),
        ));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Convert a local wall-clock value at `offset_seconds` to naive UTC. If the
/// conversion overflows, the wall-clock value is kept with its zone dropped.
fn strip_timezone(local: NaiveDateTime, offset_seconds: i32) -> NaiveDateTime {
    local
        .checked_sub_signed(Duration::seconds(i64::from(offset_seconds)))
        .unwrap_or(local)
}
