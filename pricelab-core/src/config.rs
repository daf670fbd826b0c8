//! Configuration, loaded from TOML.
//!
//! Every section and key is optional; an empty file is the default config.
//!
//! ```toml
//! [acquisition]
//! source = "yahoo"          # or "synthetic"
//! max_retries = 3
//! backoff_unit_ms = 1000
//!
//! [forecast]
//! horizon = 30
//! interval_width = 0.8
//!
//! [reference]
//! dir = "./reference"
//!
//! [server]
//! bind = "127.0.0.1:5000"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{RetryPolicy, SyntheticSource, UpstreamSource, YahooSource};
use crate::forecast::{ForecastAdapter, LinearTrendModel, TrendModel};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which upstream the acquisition controller talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Yahoo,
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    pub source: SourceKind,
    pub max_retries: u32,
    pub backoff_unit_ms: u64,
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub synthetic_seed: u64,
    /// Last day of synthetic history; today (UTC) when unset.
    pub synthetic_end: Option<NaiveDate>,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Yahoo,
            max_retries: 3,
            backoff_unit_ms: 1000,
            base_url: crate::data::yahoo::DEFAULT_BASE_URL.to_owned(),
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_owned(),
            synthetic_seed: 42,
            synthetic_end: None,
        }
    }
}

impl AcquisitionConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff_unit: Duration::from_millis(self.backoff_unit_ms),
        }
    }

    /// Build the configured upstream source.
    pub fn build_source(&self) -> Result<Arc<dyn UpstreamSource>, ConfigError> {
        match self.source {
            SourceKind::Yahoo => {
                let source = YahooSource::new(
                    self.base_url.clone(),
                    Duration::from_secs(self.timeout_secs),
                    &self.user_agent,
                )
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
                Ok(Arc::new(source))
            }
            SourceKind::Synthetic => {
                let end = self
                    .synthetic_end
                    .unwrap_or_else(|| chrono::Utc::now().date_naive());
                Ok(Arc::new(SyntheticSource::new(self.synthetic_seed, end)))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Without a model every forecast request is "could not generate".
    pub enabled: bool,
    pub horizon: usize,
    pub max_horizon: usize,
    pub min_history: usize,
    pub interval_width: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            horizon: crate::forecast::DEFAULT_HORIZON,
            max_horizon: 365,
            min_history: crate::forecast::DEFAULT_MIN_HISTORY,
            interval_width: crate::forecast::linear_trend::DEFAULT_INTERVAL_WIDTH,
        }
    }
}

impl ForecastConfig {
    pub fn adapter(&self) -> ForecastAdapter {
        let model = self.enabled.then(|| {
            Arc::new(LinearTrendModel::new(self.interval_width)) as Arc<dyn TrendModel>
        });
        ForecastAdapter::new(model).with_min_history(self.min_history)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    /// Directory with `languages.json`, `timezones.json`, `tickers.json`.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_owned(),
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricelabConfig {
    pub acquisition: AcquisitionConfig,
    pub forecast: ForecastConfig,
    pub reference: ReferenceConfig,
    pub server: ServerConfig,
}

impl PricelabConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let forecast = &self.forecast;
        if !(forecast.interval_width > 0.0 && forecast.interval_width < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "forecast.interval_width must be in (0, 1), got {}",
                forecast.interval_width
            )));
        }
        if forecast.horizon > forecast.max_horizon {
            return Err(ConfigError::Invalid(format!(
                "forecast.horizon {} exceeds forecast.max_horizon {}",
                forecast.horizon, forecast.max_horizon
            )));
        }
        if self.acquisition.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "acquisition.timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        let config = PricelabConfig::from_toml("").unwrap();
        assert_eq!(config, PricelabConfig::default());
        assert_eq!(config.acquisition.retry_policy(), RetryPolicy::default());
        assert_eq!(config.forecast.horizon, 30);
        assert_eq!(config.server.bind, "127.0.0.1:5000");
    }

    #[test]
    fn parses_partial_sections() {
        let config = PricelabConfig::from_toml(
            r#"
            [acquisition]
            source = "synthetic"
            max_retries = 5
            backoff_unit_ms = 10
            synthetic_end = "2024-06-28"

            [forecast]
            enabled = false

            [reference]
            dir = "/srv/reference"
            "#,
        )
        .unwrap();

        assert_eq!(config.acquisition.source, SourceKind::Synthetic);
        assert_eq!(
            config.acquisition.retry_policy(),
            RetryPolicy {
                max_retries: 5,
                backoff_unit: Duration::from_millis(10),
            }
        );
        assert_eq!(
            config.acquisition.synthetic_end,
            NaiveDate::from_ymd_opt(2024, 6, 28)
        );
        assert!(!config.forecast.adapter().is_available());
        assert_eq!(config.reference.dir, Some(PathBuf::from("/srv/reference")));
        assert_eq!(config.acquisition.timeout_secs, 30);
    }

    #[test]
    fn synthetic_source_builds() {
        let config = AcquisitionConfig {
            source: SourceKind::Synthetic,
            ..AcquisitionConfig::default()
        };
        assert_eq!(config.build_source().unwrap().name(), "synthetic");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            PricelabConfig::from_toml("[forecast]\ninterval_width = 1.5"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            PricelabConfig::from_toml("[forecast]\nhorizon = 500"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            PricelabConfig::from_toml("[acquisition]\nsource = \"bloomberg\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = PricelabConfig::from_file(Path::new("/no/such/pricelab.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
