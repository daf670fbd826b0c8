//! Yahoo Finance upstream source.
//!
//! Fetches one chart from Yahoo's v8 chart API per call. Retrying is the
//! acquisition controller's job; this type performs exactly one request and
//! classifies the outcome.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes, so quote cells are read as loose JSON values and coerced later.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

use super::provider::{RawField, RawTable, RawTimestamp, RawValue, UpstreamError, UpstreamSource};
use crate::domain::{Interval, Period, Symbol};

pub const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
    events: Option<ChartEvents>,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    gmtoffset: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Option<Vec<Value>>,
    high: Option<Vec<Value>>,
    low: Option<Vec<Value>>,
    close: Option<Vec<Value>>,
    volume: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ChartEvents {
    dividends: Option<HashMap<String, DividendEvent>>,
    splits: Option<HashMap<String, SplitEvent>>,
}

#[derive(Debug, Deserialize)]
struct DividendEvent {
    amount: f64,
    date: i64,
}

#[derive(Debug, Deserialize)]
struct SplitEvent {
    date: i64,
    numerator: f64,
    denominator: f64,
}

/// Yahoo Finance chart source.
pub struct YahooSource {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooSource {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, UpstreamError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| UpstreamError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }

    /// Build the chart API URL for a symbol, period and interval.
    fn chart_url(&self, symbol: &Symbol, period: Period, interval: Interval) -> String {
        format!(
            "{}/v8/finance/chart/{symbol}?range={period}&interval={interval}\
             &includeAdjustedClose=true&events=div%2Csplits",
            self.base_url
        )
    }
}

impl UpstreamSource for YahooSource {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn history(
        &self,
        symbol: &Symbol,
        period: Period,
        interval: Interval,
    ) -> Result<Option<RawTable>, UpstreamError> {
        let url = self.chart_url(symbol, period, interval);
        trace!(%url, "requesting chart");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(UpstreamError::Network(format!("HTTP {status} for {symbol}")));
        }
        if !status.is_success() {
            return Err(UpstreamError::Other(format!("HTTP {status} for {symbol}")));
        }

        let chart: ChartResponse = resp.json().map_err(|e| {
            UpstreamError::Other(format!("failed to parse response for {symbol}: {e}"))
        })?;

        parse_response(chart)
    }
}

/// Turn a decoded chart into a raw table. `Ok(None)` means "no data".
fn parse_response(resp: ChartResponse) -> Result<Option<RawTable>, UpstreamError> {
    if let Some(err) = resp.chart.error {
        if err.code == "Not Found" {
            return Ok(None);
        }
        return Err(UpstreamError::Other(format!(
            "{}: {}",
            err.code,
            err.description.unwrap_or_default()
        )));
    }

    let Some(data) = resp.chart.result.and_then(|result| result.into_iter().next()) else {
        return Ok(None);
    };
    let Some(timestamps) = data.timestamp else {
        return Ok(None);
    };

    let offset = data.meta.and_then(|meta| meta.gmtoffset);
    let raw_timestamps = timestamps
        .iter()
        .map(|&seconds| RawTimestamp::Unix {
            seconds,
            utc_offset_seconds: offset,
        })
        .collect();
    let mut table = RawTable::new(raw_timestamps);

    // No quote block leaves the table without a close column; the
    // acquisition loop reports that as missing columns.
    if let Some(quote) = data.indicators.quote.into_iter().next() {
        let columns = [
            (RawField::Open, quote.open),
            (RawField::High, quote.high),
            (RawField::Low, quote.low),
            (RawField::Close, quote.close),
            (RawField::Volume, quote.volume),
        ];
        for (field, values) in columns {
            if let Some(values) = values {
                table = table.with_column(field, values.into_iter().map(json_cell).collect());
            }
        }
    }

    let (dividends, splits) = data
        .events
        .map(|events| {
            let dividends: HashMap<i64, f64> = events
                .dividends
                .unwrap_or_default()
                .into_values()
                .map(|event| (event.date, event.amount))
                .collect();
            let splits: HashMap<i64, f64> = events
                .splits
                .unwrap_or_default()
                .into_values()
                .filter(|event| event.denominator != 0.0)
                .map(|event| (event.date, event.numerator / event.denominator))
                .collect();
            (dividends, splits)
        })
        .unwrap_or_default();

    let event_column = |by_date: &HashMap<i64, f64>| -> Vec<RawValue> {
        timestamps
            .iter()
            .map(|ts| RawValue::Number(by_date.get(ts).copied().unwrap_or(0.0)))
            .collect()
    };
    let dividend_column = event_column(&dividends);
    let split_column = event_column(&splits);

    Ok(Some(
        table
            .with_column(RawField::Dividends, dividend_column)
            .with_column(RawField::Splits, split_column),
    ))
}

fn json_cell(value: Value) -> RawValue {
    match value {
        Value::Number(number) => number.as_f64().map_or(RawValue::Missing, RawValue::Number),
        Value::String(text) => RawValue::Text(text),
        _ => RawValue::Missing,
    }
}
