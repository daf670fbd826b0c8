//! Property tests for pipeline invariants.
//!
//! Uses proptest to verify:
//! 1. Length preservation: every indicator column has one value per bar
//! 2. RSI bounds: every finite RSI lies in [0, 100]
//! 3. MACD identity: MACD = EMA12 - EMA26, signal = EMA9(MACD)
//! 4. Window plan: adaptive windows never exceed the ideal ones
//! 5. Normalized series: finite closes, non-decreasing dates
//! 6. Symbol sanitization: output is non-empty and uses only allowed characters

use chrono::NaiveDate;
use proptest::prelude::*;
use pricelab_core::data::{normalize, RawField, RawTable, RawTimestamp, RawValue};
use pricelab_core::domain::{Bar, NormalizedSeries, Symbol};
use pricelab_core::indicators::series::INDICATOR_COLUMNS;
use pricelab_core::indicators::{compute_indicators, ema_of_series, WindowPlan};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec((1.0..500.0_f64).prop_map(|p| (p * 100.0).round() / 100.0), 0..max_len)
}

fn series_from(closes: &[f64]) -> NormalizedSeries {
    let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let date = (base + chrono::Duration::days(i as i64))
                .and_hms_opt(0, 0, 0)
                .unwrap();
            Bar::from_close(date, close)
        })
        .collect();
    NormalizedSeries::from_bars(bars)
}

fn arb_raw_value() -> impl Strategy<Value = RawValue> {
    prop_oneof![
        (0.5..200.0_f64).prop_map(RawValue::Number),
        Just(RawValue::Number(f64::NAN)),
        Just(RawValue::Missing),
        Just(RawValue::Text("bad".into())),
        (0.5..200.0_f64).prop_map(|v| RawValue::Text(format!("{v}"))),
    ]
}

fn arb_raw_timestamp() -> impl Strategy<Value = RawTimestamp> {
    prop_oneof![
        (1_500_000_000_i64..1_800_000_000).prop_map(RawTimestamp::utc),
        (1_500_000_000_i64..1_800_000_000, -43_200_i32..50_400).prop_map(
            |(seconds, offset)| RawTimestamp::Unix {
                seconds,
                utc_offset_seconds: Some(offset),
            }
        ),
        Just(RawTimestamp::Missing),
        Just(RawTimestamp::Text("not a date".into())),
    ]
}

// ── 1-3. Indicator table ─────────────────────────────────────────────

proptest! {
    #[test]
    fn every_column_has_one_value_per_bar(closes in arb_closes(120)) {
        let series = series_from(&closes);
        let table = compute_indicators(&series);
        prop_assert_eq!(table.len(), series.len());
        for name in INDICATOR_COLUMNS {
            prop_assert_eq!(table.column(name).unwrap().len(), series.len());
        }
    }

    #[test]
    fn rsi_stays_in_bounds(closes in arb_closes(120)) {
        let table = compute_indicators(&series_from(&closes));
        for rsi in table.column("RSI").unwrap() {
            prop_assert!(rsi.is_finite(), "RSI not finite: {}", rsi);
            prop_assert!((0.0..=100.0).contains(&rsi), "RSI out of bounds: {}", rsi);
        }
    }

    #[test]
    fn macd_is_difference_of_emas(closes in arb_closes(120)) {
        let table = compute_indicators(&series_from(&closes));
        let ema12 = table.column("EMA12").unwrap();
        let ema26 = table.column("EMA26").unwrap();
        let macd = table.column("MACD").unwrap();
        let signal = table.column("MACD_Signal").unwrap();
        let expected_signal = ema_of_series(&macd, 9);

        for i in 0..macd.len() {
            prop_assert!((macd[i] - (ema12[i] - ema26[i])).abs() < 1e-9);
            prop_assert!((signal[i] - expected_signal[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn bollinger_bands_bracket_the_middle(closes in arb_closes(120)) {
        let table = compute_indicators(&series_from(&closes));
        let upper = table.column("BB_Upper").unwrap();
        let middle = table.column("BB_Middle").unwrap();
        let lower = table.column("BB_Lower").unwrap();
        for i in 0..middle.len() {
            if middle[i].is_finite() && upper[i].is_finite() && lower[i].is_finite() {
                prop_assert!(lower[i] <= middle[i] + 1e-9);
                prop_assert!(middle[i] <= upper[i] + 1e-9);
            }
        }
    }
}

// ── 4. Window plan ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn windows_never_exceed_ideal(len in 0usize..500) {
        let plan = WindowPlan::for_len(len);
        prop_assert!(plan.ma <= 20);
        prop_assert!(plan.bollinger <= 20);
        prop_assert!(plan.rsi <= 14);
        prop_assert!(plan.ma_long <= 50);
        if len < 50 {
            prop_assert!(plan.ma <= len / 2);
            prop_assert!(plan.ma_long <= len);
        } else {
            prop_assert_eq!(plan, WindowPlan::for_len(50));
        }
    }
}

// ── 5. Normalization ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn normalized_rows_are_clean_and_sorted(
        rows in prop::collection::vec((arb_raw_timestamp(), arb_raw_value()), 0..60)
    ) {
        let (timestamps, closes): (Vec<_>, Vec<_>) = rows.into_iter().unzip();
        let row_count = timestamps.len();
        let table = RawTable::new(timestamps).with_column(RawField::Close, closes);

        let series = normalize(&table);

        prop_assert!(series.len() <= row_count);
        for bar in series.bars() {
            prop_assert!(bar.close.is_finite());
        }
        for pair in series.bars().windows(2) {
            prop_assert!(pair[0].date <= pair[1].date);
        }
    }
}

// ── 6. Symbol sanitization ───────────────────────────────────────────

proptest! {
    #[test]
    fn sanitized_symbols_use_only_allowed_characters(input in "\\PC{0,24}") {
        if let Ok(symbol) = Symbol::sanitize(&input) {
            let text = symbol.as_str();
            prop_assert!(!text.is_empty());
            prop_assert!(text
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '=')));
            prop_assert!(input.trim().starts_with(text));
        }
    }

    #[test]
    fn valid_tickers_pass_through(ticker in "[A-Z]{1,5}([.-][A-Z]{1,2})?") {
        let symbol = Symbol::sanitize(&ticker).unwrap();
        prop_assert_eq!(symbol.as_str(), ticker.as_str());
    }
}
