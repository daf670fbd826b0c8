//! PriceLab Core: market data acquisition, normalization, technical
//! indicators and trend forecasting.
//!
//! The crate is organized as a pipeline:
//! - `data`: upstream sources, retrying acquisition controller, normalizer
//! - `indicators`: moving averages, MACD, Bollinger bands, RSI with adaptive windows
//! - `forecast`: pluggable trend model behind a forecast adapter
//! - `service`: the request surface (`get_series`, `get_forecast`) shared by server and CLI
//!
//! Configuration lives in `config`; static lookup tables in `reference`.

pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod export;
pub mod forecast;
pub mod indicators;
pub mod reference;
pub mod service;

pub use config::{ConfigError, PricelabConfig};
pub use domain::{Bar, Interval, NormalizedSeries, Period, Symbol};
pub use error::PipelineError;
pub use forecast::{ForecastAdapter, ForecastOutcome, ForecastPoint};
pub use indicators::{compute_indicators, IndicatorRow, IndicatorSeries};
pub use service::{MarketService, ServiceError};
