//! Request/response surface over the pipeline.
//!
//! `MarketService` ties acquisition, indicators and forecasting together and
//! maps every internal outcome onto three user-facing errors. It holds no
//! per-request state, so one instance serves concurrent callers.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ConfigError, PricelabConfig, SourceKind};
use crate::data::{AcquisitionController, NoSleep, ThreadSleeper};
use crate::domain::{Interval, NormalizedSeries, Period};
use crate::forecast::{ForecastAdapter, ForecastPoint, DEFAULT_HORIZON};
use crate::indicators::{compute_indicators, IndicatorRow, IndicatorSeries};
use crate::reference::{ReferenceData, TickerMatch};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("ticker required")]
    TickerRequired,

    #[error("could not fetch data")]
    FetchFailed,

    #[error("could not generate forecast")]
    ForecastUnavailable,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SeriesRequest {
    pub ticker: Option<String>,
    pub period: Option<String>,
    pub interval: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ForecastRequest {
    pub ticker: Option<String>,
    pub period: Option<String>,
    pub horizon: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesResponse {
    pub data: Vec<IndicatorRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResponse {
    pub forecast: Vec<ForecastPoint>,
}

#[derive(Clone)]
pub struct MarketService {
    controller: AcquisitionController,
    forecaster: ForecastAdapter,
    reference: Arc<ReferenceData>,
    horizon: usize,
    max_horizon: usize,
}

impl MarketService {
    pub fn new(
        controller: AcquisitionController,
        forecaster: ForecastAdapter,
        reference: Arc<ReferenceData>,
    ) -> Self {
        Self {
            controller,
            forecaster,
            reference,
            horizon: DEFAULT_HORIZON,
            max_horizon: usize::MAX,
        }
    }

    /// Default horizon and the cap applied to requested horizons.
    pub fn with_horizon(mut self, horizon: usize, max_horizon: usize) -> Self {
        self.horizon = horizon;
        self.max_horizon = max_horizon;
        self
    }

    /// Wire every stage from configuration. Loads the reference tables.
    pub fn from_config(config: &PricelabConfig) -> Result<Self, ConfigError> {
        let acquisition = &config.acquisition;
        let source = acquisition.build_source()?;
        let controller = match acquisition.source {
            SourceKind::Yahoo => AcquisitionController::with_sleeper(
                source,
                acquisition.retry_policy(),
                Arc::new(ThreadSleeper),
            ),
            SourceKind::Synthetic => AcquisitionController::with_sleeper(
                source,
                acquisition.retry_policy(),
                Arc::new(NoSleep),
            ),
        };
        let reference = ReferenceData::load(config.reference.dir.as_deref());

        info!(
            source = controller.source_name(),
            max_retries = acquisition.max_retries,
            forecast = config.forecast.enabled,
            tickers = reference.tickers().len(),
            "market service ready"
        );

        Ok(Self::new(controller, config.forecast.adapter(), Arc::new(reference))
            .with_horizon(config.forecast.horizon, config.forecast.max_horizon))
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn source_name(&self) -> &str {
        self.controller.source_name()
    }

    pub fn forecast_available(&self) -> bool {
        self.forecaster.is_available()
    }

    /// Bars plus indicators for one ticker.
    pub fn get_series(&self, request: &SeriesRequest) -> Result<SeriesResponse, ServiceError> {
        let indicators = self.indicator_series(request)?;
        Ok(SeriesResponse {
            data: indicators.into_rows(),
        })
    }

    /// Like `get_series`, keeping the series form (window plan, columns).
    pub fn indicator_series(
        &self,
        request: &SeriesRequest,
    ) -> Result<IndicatorSeries, ServiceError> {
        let ticker = require_ticker(request.ticker.as_deref())?;
        let period: Period = parse_or_default(request.period.as_deref())?;
        let interval: Interval = parse_or_default(request.interval.as_deref())?;

        let series = self.fetch(ticker, period, interval)?;
        let indicators = compute_indicators(&series);
        debug!(ticker, rows = indicators.len(), windows = ?indicators.windows(), "indicators computed");
        Ok(indicators)
    }

    /// Daily history projected `horizon` calendar days forward.
    pub fn get_forecast(
        &self,
        request: &ForecastRequest,
    ) -> Result<ForecastResponse, ServiceError> {
        let ticker = require_ticker(request.ticker.as_deref())?;
        let period: Period = parse_or_default(request.period.as_deref())?;
        let horizon = request.horizon.unwrap_or(self.horizon).min(self.max_horizon);

        let series = self.fetch(ticker, period, Interval::OneDay)?;
        let forecast = self
            .forecaster
            .forecast(&series, horizon)
            .into_result()
            .map_err(|error| {
                info!(ticker, %error, "no forecast");
                ServiceError::ForecastUnavailable
            })?;

        Ok(ForecastResponse { forecast })
    }

    pub fn search_tickers(&self, query: &str) -> Vec<TickerMatch> {
        self.reference.search_tickers(query)
    }

    pub fn languages(&self) -> &BTreeMap<String, String> {
        self.reference.languages()
    }

    pub fn timezones(&self) -> &[String] {
        self.reference.timezones()
    }

    fn fetch(
        &self,
        ticker: &str,
        period: Period,
        interval: Interval,
    ) -> Result<NormalizedSeries, ServiceError> {
        let series = self.controller.acquire(ticker, period, interval);
        if series.is_empty() {
            info!(ticker, %period, %interval, "no data");
            return Err(ServiceError::FetchFailed);
        }
        Ok(series)
    }
}

fn require_ticker(ticker: Option<&str>) -> Result<&str, ServiceError> {
    ticker
        .map(str::trim)
        .filter(|ticker| !ticker.is_empty())
        .ok_or(ServiceError::TickerRequired)
}

/// Absent or blank means default; anything unparseable cannot be fetched.
fn parse_or_default<T>(value: Option<&str>) -> Result<T, ServiceError>
where
    T: std::str::FromStr + Default,
    T::Err: std::fmt::Display,
{
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(T::default()),
        Some(value) => value.parse().map_err(|error: T::Err| {
            info!(%error, "rejected request parameter");
            ServiceError::FetchFailed
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{
        RawField, RawTable, RawTimestamp, RawValue, RetryPolicy, ScriptedSource, UpstreamError,
    };
    use crate::forecast::LinearTrendModel;
    use std::time::Duration;

    fn table(len: usize) -> RawTable {
        let start = 1_704_153_600; // 2024-01-02T00:00:00Z
        RawTable::new((0..len).map(|i| RawTimestamp::utc(start + i as i64 * 86_400)).collect())
            .with_column(
                RawField::Close,
                (0..len).map(|i| RawValue::Number(100.0 + i as f64)).collect(),
            )
    }

    fn service(source: Arc<ScriptedSource>, with_model: bool) -> MarketService {
        let policy = RetryPolicy {
            max_retries: 3,
            backoff_unit: Duration::from_millis(1),
        };
        let controller = AcquisitionController::with_sleeper(source, policy, Arc::new(NoSleep));
        let model = with_model
            .then(|| Arc::new(LinearTrendModel::default()) as Arc<dyn crate::forecast::TrendModel>);
        MarketService::new(
            controller,
            ForecastAdapter::new(model),
            Arc::new(ReferenceData::default()),
        )
    }

    fn series_request(ticker: &str) -> SeriesRequest {
        SeriesRequest {
            ticker: Some(ticker.into()),
            ..SeriesRequest::default()
        }
    }

    #[test]
    fn missing_or_blank_ticker_is_required() {
        let source = Arc::new(ScriptedSource::new([]));
        let svc = service(source.clone(), true);
        assert_eq!(
            svc.get_series(&SeriesRequest::default()),
            Err(ServiceError::TickerRequired)
        );
        assert_eq!(
            svc.get_forecast(&ForecastRequest {
                ticker: Some("  ".into()),
                ..ForecastRequest::default()
            }),
            Err(ServiceError::TickerRequired)
        );
        assert_eq!(source.calls(), 0);
    }

    #[test]
    fn series_carries_every_bar() {
        let source = Arc::new(ScriptedSource::new([Ok(Some(table(30)))]));
        let svc = service(source, false);
        let response = svc.get_series(&series_request("SPY")).unwrap();
        assert_eq!(response.data.len(), 30);
        assert_eq!(response.data[29].bar.close, 129.0);
    }

    #[test]
    fn invalid_symbol_fails_without_upstream_call() {
        let source = Arc::new(ScriptedSource::new([]));
        let svc = service(source.clone(), false);
        assert_eq!(
            svc.get_series(&series_request("???")),
            Err(ServiceError::FetchFailed)
        );
        assert_eq!(source.calls(), 0);
    }

    #[test]
    fn bad_period_is_fetch_failure() {
        let source = Arc::new(ScriptedSource::new([]));
        let svc = service(source.clone(), false);
        let request = SeriesRequest {
            ticker: Some("SPY".into()),
            period: Some("forever".into()),
            interval: None,
        };
        assert_eq!(svc.get_series(&request), Err(ServiceError::FetchFailed));
        assert_eq!(source.calls(), 0);
    }

    #[test]
    fn exhausted_upstream_is_fetch_failure() {
        let source = Arc::new(ScriptedSource::always(Err(UpstreamError::Network(
            "reset".into(),
        ))));
        let svc = service(source.clone(), false);
        assert_eq!(
            svc.get_series(&series_request("SPY")),
            Err(ServiceError::FetchFailed)
        );
        assert_eq!(source.calls(), 3);
    }

    #[test]
    fn forecast_needs_a_model() {
        let source = Arc::new(ScriptedSource::new([Ok(Some(table(40)))]));
        let svc = service(source, false);
        let request = ForecastRequest {
            ticker: Some("SPY".into()),
            ..ForecastRequest::default()
        };
        assert_eq!(svc.get_forecast(&request), Err(ServiceError::ForecastUnavailable));
    }

    #[test]
    fn short_history_cannot_be_forecast() {
        let source = Arc::new(ScriptedSource::new([Ok(Some(table(10)))]));
        let svc = service(source, true);
        let request = ForecastRequest {
            ticker: Some("SPY".into()),
            ..ForecastRequest::default()
        };
        assert_eq!(svc.get_forecast(&request), Err(ServiceError::ForecastUnavailable));
    }

    #[test]
    fn forecast_defaults_to_thirty_days_and_respects_cap() {
        let source = Arc::new(ScriptedSource::new([
            Ok(Some(table(40))),
            Ok(Some(table(40))),
        ]));
        let svc = service(source, true).with_horizon(30, 10);
        let request = ForecastRequest {
            ticker: Some("SPY".into()),
            ..ForecastRequest::default()
        };
        let capped = svc.get_forecast(&request).unwrap();
        assert_eq!(capped.forecast.len(), 10);

        let svc = svc.with_horizon(30, 365);
        let full = svc.get_forecast(&request).unwrap();
        assert_eq!(full.forecast.len(), 30);
        // Perfect line: +1 per day from 100 on 2024-01-02
        assert!((full.forecast[0].predicted - 140.0).abs() < 1e-6);
    }

    #[test]
    fn error_messages_are_user_facing() {
        assert_eq!(ServiceError::TickerRequired.to_string(), "ticker required");
        assert_eq!(ServiceError::FetchFailed.to_string(), "could not fetch data");
        assert_eq!(
            ServiceError::ForecastUnavailable.to_string(),
            "could not generate forecast"
        );
    }

    #[test]
    fn reference_lookups_pass_through() {
        let svc = service(Arc::new(ScriptedSource::new([])), false);
        assert!(!svc.search_tickers("msft").is_empty());
        assert!(svc.languages().contains_key("en"));
        assert!(!svc.timezones().is_empty());
    }
}
