//! Seeded random-walk source for offline runs, demos and benchmarks.
//!
//! The same `(seed, symbol)` always yields the same table. Per-symbol seeds
//! are derived by hashing, so the order in which symbols are requested does
//! not matter.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{RawField, RawTable, RawTimestamp, RawValue, UpstreamError, UpstreamSource};
use crate::domain::{Interval, Period, Symbol};

/// Upper bound on bars per table.
pub const MAX_BARS: usize = 5_000;

/// Per-step volatility of the walk.
const STEP_VOLATILITY: f64 = 0.02;

#[derive(Debug, Clone)]
pub struct SyntheticSource {
    seed: u64,
    end: NaiveDate,
}

impl SyntheticSource {
    /// Source whose last bar falls on (or just before, for weekends) `end`.
    pub fn new(seed: u64, end: NaiveDate) -> Self {
        Self { seed, end }
    }

    /// Deterministic sub-seed for one symbol.
    pub fn sub_seed(&self, symbol: &Symbol) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(symbol.as_str().as_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    /// Bar timestamps, oldest first.
    fn timeline(&self, period: Period, interval: Interval) -> Vec<NaiveDateTime> {
        let intraday = interval.is_intraday();
        let mut end_day = self.end;
        while !intraday && is_weekend(end_day) {
            match end_day.pred_opt() {
                Some(previous) => end_day = previous,
                None => break,
            }
        }

        let close_hour = if intraday { 20 } else { 0 };
        let Some(end) = end_day.and_hms_opt(close_hour, 0, 0) else {
            return Vec::new();
        };
        let start = end
            .checked_sub_signed(Duration::days(period.calendar_days(end_day)))
            .unwrap_or(NaiveDateTime::MIN);
        let step = interval.step();

        let mut dates = Vec::new();
        let mut cursor = end;
        while cursor > start && dates.len() < MAX_BARS {
            if intraday || !is_weekend(cursor.date()) {
                dates.push(cursor);
            }
            match cursor.checked_sub_signed(step) {
                Some(previous) => cursor = previous,
                None => break,
            }
        }
        dates.reverse();
        dates
    }
}

fn is_weekend(day: NaiveDate) -> bool {
    matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}

impl UpstreamSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn history(
        &self,
        symbol: &Symbol,
        period: Period,
        interval: Interval,
    ) -> Result<Option<RawTable>, UpstreamError> {
        let dates = self.timeline(period, interval);
        if dates.is_empty() {
            return Ok(None);
        }

        let mut rng = StdRng::seed_from_u64(self.sub_seed(symbol));
        let mut close: f64 = rng.gen_range(20.0..500.0);

        let n = dates.len();
        let mut opens = Vec::with_capacity(n);
        let mut highs = Vec::with_capacity(n);
        let mut lows = Vec::with_capacity(n);
        let mut closes = Vec::with_capacity(n);
        let mut volumes = Vec::with_capacity(n);

        for _ in 0..n {
            let open = close;
            close = (open * (1.0 + rng.gen_range(-STEP_VOLATILITY..STEP_VOLATILITY))).max(0.01);
            let wick = rng.gen_range(0.0..STEP_VOLATILITY / 2.0);
            opens.push(RawValue::Number(open));
            highs.push(RawValue::Number(open.max(close) * (1.0 + wick)));
            lows.push(RawValue::Number(open.min(close) * (1.0 - wick)));
            closes.push(RawValue::Number(close));
            volumes.push(RawValue::Number(rng.gen_range(100_000.0..5_000_000.0_f64).round()));
        }

        let timestamps = dates
            .iter()
            .map(|date| RawTimestamp::utc(date.and_utc().timestamp()))
            .collect();

        Ok(Some(
            RawTable::new(timestamps)
                .with_column(RawField::Open, opens)
                .with_column(RawField::High, highs)
                .with_column(RawField::Low, lows)
                .with_column(RawField::Close, closes)
                .with_column(RawField::Volume, volumes)
                .with_column(RawField::Dividends, vec![RawValue::Number(0.0); n])
                .with_column(RawField::Splits, vec![RawValue::Number(0.0); n]),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::normalize::normalize;

    fn source() -> SyntheticSource {
        // 2024-03-15 is a Friday.
        SyntheticSource::new(42, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
    }

    fn symbol(s: &str) -> Symbol {
        Symbol::sanitize(s).unwrap()
    }

    #[test]
    fn same_seed_and_symbol_is_deterministic() {
        let a = source().history(&symbol("SPY"), Period::SixMonths, Interval::OneDay);
        let b = source().history(&symbol("SPY"), Period::SixMonths, Interval::OneDay);
        assert_eq!(a, b);
    }

    #[test]
    fn different_symbols_get_different_walks() {
        let s = source();
        assert_ne!(s.sub_seed(&symbol("SPY")), s.sub_seed(&symbol("QQQ")));
    }

    #[test]
    fn daily_bars_skip_weekends_and_end_on_anchor() {
        let table = source()
            .history(&symbol("SPY"), Period::OneMonth, Interval::OneDay)
            .unwrap()
            .unwrap();
        let series = normalize(&table);
        assert!(series.len() >= 20 && series.len() <= 23, "got {}", series.len());
        assert!(series.bars().iter().all(|bar| !is_weekend(bar.day())));
        assert_eq!(
            series.last_date().map(|d| d.date()),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
    }

    #[test]
    fn weekend_anchor_moves_back_to_friday() {
        let s = SyntheticSource::new(1, NaiveDate::from_ymd_opt(2024, 3, 17).unwrap());
        let table = s
            .history(&symbol("SPY"), Period::FiveDays, Interval::OneDay)
            .unwrap()
            .unwrap();
        let series = normalize(&table);
        assert_eq!(
            series.last_date().map(|d| d.date()),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
    }

    #[test]
    fn intraday_tables_are_capped() {
        let table = source()
            .history(&symbol("SPY"), Period::OneYear, Interval::OneMinute)
            .unwrap()
            .unwrap();
        assert_eq!(table.row_count(), MAX_BARS);
    }

    #[test]
    fn prices_stay_positive_and_ordered() {
        let table = source()
            .history(&symbol("TSLA"), Period::TwoYears, Interval::OneDay)
            .unwrap()
            .unwrap();
        let series = normalize(&table);
        for bar in series.bars() {
            assert!(bar.close > 0.0);
            assert!(bar.low <= bar.open.min(bar.close));
            assert!(bar.high >= bar.open.max(bar.close));
        }
    }
}
