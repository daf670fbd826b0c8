//! Indicator series: the normalized bars extended with every derived column.

use std::collections::HashMap;

use serde::Serialize;

use super::{
    Bollinger, Ema, Indicator, Macd, MacdSignal, RollingStd, Rsi, Sma, WindowPlan,
};
use crate::domain::{Bar, NormalizedSeries};

/// Derived column names, in payload order.
pub const INDICATOR_COLUMNS: [&str; 11] = [
    "MA20",
    "MA50",
    "EMA12",
    "EMA26",
    "MACD",
    "MACD_Signal",
    "BB_Middle",
    "BB_Std",
    "BB_Upper",
    "BB_Lower",
    "RSI",
];

const BOLLINGER_MULTIPLIER: f64 = 2.0;

/// Container for computed indicator columns, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct IndicatorValues {
    series: HashMap<String, Vec<f64>>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a named indicator series.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    /// Value of a named indicator at a bar index.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(bar_index).copied())
    }

    fn value(&self, name: &str, bar_index: usize) -> f64 {
        self.get(name, bar_index).unwrap_or(f64::NAN)
    }
}

/// One bar plus its derived values. Serializes as a flat record with the
/// bar's keys followed by `MA20 .. RSI`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRow {
    #[serde(flatten)]
    pub bar: Bar,
    #[serde(rename = "MA20")]
    pub ma20: f64,
    #[serde(rename = "MA50")]
    pub ma50: f64,
    #[serde(rename = "EMA12")]
    pub ema12: f64,
    #[serde(rename = "EMA26")]
    pub ema26: f64,
    #[serde(rename = "MACD")]
    pub macd: f64,
    #[serde(rename = "MACD_Signal")]
    pub macd_signal: f64,
    #[serde(rename = "BB_Middle")]
    pub bb_middle: f64,
    #[serde(rename = "BB_Std")]
    pub bb_std: f64,
    #[serde(rename = "BB_Upper")]
    pub bb_upper: f64,
    #[serde(rename = "BB_Lower")]
    pub bb_lower: f64,
    #[serde(rename = "RSI")]
    pub rsi: f64,
}

impl IndicatorRow {
    /// Derived value by payload column name.
    pub fn value(&self, column: &str) -> Option<f64> {
        let value = match column {
            "MA20" => self.ma20,
            "MA50" => self.ma50,
            "EMA12" => self.ema12,
            "EMA26" => self.ema26,
            "MACD" => self.macd,
            "MACD_Signal" => self.macd_signal,
            "BB_Middle" => self.bb_middle,
            "BB_Std" => self.bb_std,
            "BB_Upper" => self.bb_upper,
            "BB_Lower" => self.bb_lower,
            "RSI" => self.rsi,
            _ => return None,
        };
        Some(value)
    }
}

/// Bar-aligned indicator output. Same length as the input series.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    rows: Vec<IndicatorRow>,
    windows: WindowPlan,
}

impl IndicatorSeries {
    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<IndicatorRow> {
        self.rows
    }

    pub fn windows(&self) -> WindowPlan {
        self.windows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One derived column across all rows.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        self.rows.iter().map(|row| row.value(name)).collect()
    }
}

/// The indicator set for a window plan, in payload order.
pub fn indicator_set(plan: &WindowPlan) -> Vec<Box<dyn Indicator>> {
    vec![
        Box::new(Sma::new(plan.ma, "MA20")),
        Box::new(Sma::new(plan.ma_long, "MA50")),
        Box::new(Ema::new(12, "EMA12")),
        Box::new(Ema::new(26, "EMA26")),
        Box::new(Macd::default()),
        Box::new(MacdSignal::standard()),
        Box::new(Bollinger::middle(plan.bollinger)),
        Box::new(RollingStd::new(plan.bollinger)),
        Box::new(Bollinger::upper(plan.bollinger, BOLLINGER_MULTIPLIER)),
        Box::new(Bollinger::lower(plan.bollinger, BOLLINGER_MULTIPLIER)),
        Box::new(Rsi::new(plan.rsi)),
    ]
}

/// Compute every derived column over `series`. Never fails; the empty
/// series yields an empty indicator series.
pub fn compute_indicators(series: &NormalizedSeries) -> IndicatorSeries {
    let bars = series.bars();
    let windows = WindowPlan::for_len(bars.len());

    let mut values = IndicatorValues::new();
    for indicator in indicator_set(&windows) {
        values.insert(indicator.name(), indicator.compute(bars));
    }

    let rows = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| IndicatorRow {
            bar: bar.clone(),
            ma20: values.value("MA20", i),
            ma50: values.value("MA50", i),
            ema12: values.value("EMA12", i),
            ema26: values.value("EMA26", i),
            macd: values.value("MACD", i),
            macd_signal: values.value("MACD_Signal", i),
            bb_middle: values.value("BB_Middle", i),
            bb_std: values.value("BB_Std", i),
            bb_upper: values.value("BB_Upper", i),
            bb_lower: values.value("BB_Lower", i),
            rsi: values.value("RSI", i),
        })
        .collect();

    IndicatorSeries { rows, windows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    fn series(closes: &[f64]) -> NormalizedSeries {
        NormalizedSeries::from_bars(make_bars(closes))
    }

    #[test]
    fn indicator_set_names_match_columns() {
        let names: Vec<String> = indicator_set(&WindowPlan::for_len(100))
            .iter()
            .map(|i| i.name().to_owned())
            .collect();
        assert_eq!(names, INDICATOR_COLUMNS);
    }

    #[test]
    fn empty_series_gives_empty_output() {
        let out = compute_indicators(&NormalizedSeries::empty());
        assert!(out.is_empty());
        assert_eq!(out.column("RSI"), Some(Vec::new()));
    }

    #[test]
    fn single_bar_is_fully_defined() {
        let out = compute_indicators(&series(&[42.0]));
        assert_eq!(out.len(), 1);
        let row = &out.rows()[0];
        for column in INDICATOR_COLUMNS {
            let value = row.value(column).unwrap();
            assert!(value.is_finite(), "{column} = {value}");
        }
        assert_eq!(row.ma20, 42.0);
        assert_eq!(row.bb_std, 0.0);
        assert_eq!(row.rsi, 50.0);
    }

    #[test]
    fn every_column_defined_for_every_row() {
        let closes: Vec<f64> = (0..75).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let out = compute_indicators(&series(&closes));
        assert_eq!(out.len(), 75);
        for column in INDICATOR_COLUMNS {
            let values = out.column(column).unwrap();
            assert!(values.iter().all(|v| v.is_finite()), "{column} has gaps");
        }
    }

    #[test]
    fn short_series_uses_shrunk_windows() {
        let closes: Vec<f64> = (1..=10).map(f64::from).collect();
        let out = compute_indicators(&series(&closes));
        assert_eq!(out.windows().ma, 5);
        // MA20 at the last bar covers the last 5 closes: mean(6..=10) = 8
        assert_approx(out.rows()[9].ma20, 8.0, DEFAULT_EPSILON);
        // MA50 covers the whole series: mean(1..=10) = 5.5
        assert_approx(out.rows()[9].ma50, 5.5, DEFAULT_EPSILON);
    }

    #[test]
    fn bands_and_macd_are_consistent() {
        let closes: Vec<f64> = (0..60).map(|i| 50.0 + (i % 7) as f64).collect();
        let out = compute_indicators(&series(&closes));
        for row in out.rows() {
            assert_eq!(row.macd, row.ema12 - row.ema26);
            assert_approx(row.bb_upper, row.bb_middle + 2.0 * row.bb_std, DEFAULT_EPSILON);
            assert_approx(row.bb_lower, row.bb_middle - 2.0 * row.bb_std, DEFAULT_EPSILON);
            assert_eq!(row.ma20, row.bb_middle);
        }
    }

    #[test]
    fn outlier_bar_does_not_skew_later_means() {
        let mut closes = vec![1e9 + 0.37];
        closes.extend(std::iter::repeat(0.01).take(60));
        let out = compute_indicators(&series(&closes));

        let last = &out.rows()[60];
        assert_approx(last.ma20, 0.01, 1e-15);
        assert_approx(last.ma50, 0.01, 1e-15);
        assert_approx(last.bb_middle, 0.01, 1e-15);
        assert_approx(last.bb_std, 0.0, 1e-15);
    }

    #[test]
    fn row_serializes_flat_with_payload_keys() {
        let out = compute_indicators(&series(&[10.0, 11.0]));
        let json = serde_json::to_value(&out.rows()[1]).unwrap();
        assert_eq!(json["Date"], "2024-01-03");
        assert_eq!(json["Close"], 11.0);
        // Two bars: MA20 window is 1, MA50 window is 2
        assert_eq!(json["MA20"], 11.0);
        assert_eq!(json["MA50"], 10.5);
        assert!(json["Open"].is_null());
        for column in INDICATOR_COLUMNS {
            assert!(json.get(column).is_some(), "missing {column}");
        }
    }

    #[test]
    fn unknown_column_is_none() {
        let out = compute_indicators(&series(&[1.0]));
        assert!(out.column("VWAP").is_none());
    }
}
