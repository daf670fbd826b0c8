//! Lookback period and sampling interval descriptors.
//!
//! Both use the short string vocabulary of chart APIs (`6mo`, `1d`, ...).

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseRangeError {
    kind: &'static str,
    value: String,
}

/// How far back to fetch history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Period {
    OneDay,
    FiveDays,
    OneMonth,
    ThreeMonths,
    #[default]
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
    TenYears,
    YearToDate,
    Max,
}

impl Period {
    pub const ALL: [Period; 11] = [
        Self::OneDay,
        Self::FiveDays,
        Self::OneMonth,
        Self::ThreeMonths,
        Self::SixMonths,
        Self::OneYear,
        Self::TwoYears,
        Self::FiveYears,
        Self::TenYears,
        Self::YearToDate,
        Self::Max,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::FiveDays => "5d",
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
            Self::FiveYears => "5y",
            Self::TenYears => "10y",
            Self::YearToDate => "ytd",
            Self::Max => "max",
        }
    }

    /// Approximate calendar span. `ytd` is measured from `anchor`'s Jan 1;
    /// `max` is capped at thirty years.
    pub fn calendar_days(self, anchor: chrono::NaiveDate) -> i64 {
        use chrono::Datelike;
        match self {
            Self::OneDay => 1,
            Self::FiveDays => 5,
            Self::OneMonth => 30,
            Self::ThreeMonths => 91,
            Self::SixMonths => 182,
            Self::OneYear => 365,
            Self::TwoYears => 730,
            Self::FiveYears => 1826,
            Self::TenYears => 3652,
            Self::YearToDate => i64::from(anchor.ordinal()),
            Self::Max => 30 * 365,
        }
    }
}

impl FromStr for Period {
    type Err = ParseRangeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim();
        Self::ALL
            .into_iter()
            .find(|period| period.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ParseRangeError {
                kind: "period",
                value: value.to_owned(),
            })
    }
}

/// Spacing between consecutive bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Interval {
    OneMinute,
    TwoMinutes,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    SixtyMinutes,
    NinetyMinutes,
    OneHour,
    #[default]
    OneDay,
    FiveDays,
    OneWeek,
    OneMonth,
    ThreeMonths,
}

impl Interval {
    pub const ALL: [Interval; 13] = [
        Self::OneMinute,
        Self::TwoMinutes,
        Self::FiveMinutes,
        Self::FifteenMinutes,
        Self::ThirtyMinutes,
        Self::SixtyMinutes,
        Self::NinetyMinutes,
        Self::OneHour,
        Self::OneDay,
        Self::FiveDays,
        Self::OneWeek,
        Self::OneMonth,
        Self::ThreeMonths,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::TwoMinutes => "2m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::ThirtyMinutes => "30m",
            Self::SixtyMinutes => "60m",
            Self::NinetyMinutes => "90m",
            Self::OneHour => "1h",
            Self::OneDay => "1d",
            Self::FiveDays => "5d",
            Self::OneWeek => "1wk",
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
        }
    }

    /// Nominal spacing between bars.
    pub fn step(self) -> Duration {
        match self {
            Self::OneMinute => Duration::minutes(1),
            Self::TwoMinutes => Duration::minutes(2),
            Self::FiveMinutes => Duration::minutes(5),
            Self::FifteenMinutes => Duration::minutes(15),
            Self::ThirtyMinutes => Duration::minutes(30),
            Self::SixtyMinutes | Self::OneHour => Duration::hours(1),
            Self::NinetyMinutes => Duration::minutes(90),
            Self::OneDay => Duration::days(1),
            Self::FiveDays => Duration::days(5),
            Self::OneWeek => Duration::weeks(1),
            Self::OneMonth => Duration::days(30),
            Self::ThreeMonths => Duration::days(91),
        }
    }

    pub fn is_intraday(self) -> bool {
        self.step() < Duration::days(1)
    }
}

impl FromStr for Interval {
    type Err = ParseRangeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim();
        Self::ALL
            .into_iter()
            .find(|interval| interval.as_str() == needle)
            .ok_or_else(|| ParseRangeError {
                kind: "interval",
                value: value.to_owned(),
            })
    }
}

macro_rules! string_forms {
    ($ty:ty) => {
        impl Display for $ty {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl TryFrom<String> for $ty {
            type Error = ParseRangeError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.as_str().to_owned()
            }
        }
    };
}

string_forms!(Period);
string_forms!(Interval);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_request_defaults() {
        assert_eq!(Period::default().as_str(), "6mo");
        assert_eq!(Interval::default().as_str(), "1d");
    }

    #[test]
    fn parses_every_known_form() {
        for period in Period::ALL {
            assert_eq!(period.as_str().parse::<Period>().unwrap(), period);
        }
        for interval in Interval::ALL {
            assert_eq!(interval.as_str().parse::<Interval>().unwrap(), interval);
        }
    }

    #[test]
    fn month_and_minute_are_not_confused() {
        // "1mo" is a month for both; "1m" is only an interval (one minute).
        assert_eq!("1mo".parse::<Interval>().unwrap(), Interval::OneMonth);
        assert_eq!("1m".parse::<Interval>().unwrap(), Interval::OneMinute);
        assert!("1m".parse::<Period>().is_err());
    }

    #[test]
    fn rejects_unknown_strings() {
        let err = "7w".parse::<Period>().expect_err("must fail");
        assert_eq!(err.to_string(), "unknown period '7w'");
        assert!("daily".parse::<Interval>().is_err());
    }

    #[test]
    fn serde_uses_string_form() {
        let json = serde_json::to_string(&Period::OneYear).unwrap();
        assert_eq!(json, "\"1y\"");
        let parsed: Interval = serde_json::from_str("\"1wk\"").unwrap();
        assert_eq!(parsed, Interval::OneWeek);
    }

    #[test]
    fn intraday_detection() {
        assert!(Interval::FiveMinutes.is_intraday());
        assert!(!Interval::OneDay.is_intraday());
        assert!(!Interval::OneWeek.is_intraday());
    }
}
