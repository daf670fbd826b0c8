//! PriceLab CLI: price series, indicators, forecasts and reference lookups.
//!
//! Commands:
//! - `series`: fetch a ticker's history with indicator columns (JSON, CSV or Parquet)
//! - `forecast`: project daily closes forward with the trend model
//! - `search`: look up tickers by symbol or company name
//! - `reference languages|timezones`: print the static reference tables

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pricelab_core::config::SourceKind;
use pricelab_core::export::{write_indicators, write_indicators_file, TableFormat};
use pricelab_core::service::{ForecastRequest, SeriesRequest};
use pricelab_core::{MarketService, PricelabConfig};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pricelab",
    about = "PriceLab CLI: price series, technical indicators and trend forecasts"
)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Offline mode: synthetic data, no network access.
    #[arg(long, global = true, default_value_t = false)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a ticker's history with MA, EMA, MACD, Bollinger and RSI columns.
    Series {
        /// Ticker symbol (e.g., AAPL, BTC-USD, EURUSD=X).
        ticker: String,

        /// History period: 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max.
        #[arg(long)]
        period: Option<String>,

        /// Bar interval: 1m, 5m, 15m, 30m, 1h, 1d, 1wk, 1mo, ...
        #[arg(long)]
        interval: Option<String>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Write to this file instead of stdout (required for parquet).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Project daily closes forward.
    Forecast {
        /// Ticker symbol.
        ticker: String,

        /// History period used to fit the trend.
        #[arg(long)]
        period: Option<String>,

        /// Number of future calendar days. Defaults to the configured horizon.
        #[arg(long)]
        horizon: Option<usize>,

        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Search the ticker catalog by symbol or name.
    Search {
        /// Case-insensitive substring.
        query: String,
    },
    /// Print a static reference table.
    Reference {
        #[command(subcommand)]
        table: ReferenceTable,
    },
}

#[derive(Subcommand)]
enum ReferenceTable {
    /// Supported interface languages (code → name).
    Languages,
    /// Known IANA timezone names.
    Timezones,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
    Parquet,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let config = load_config(cli.config.as_deref(), cli.offline)?;

    match cli.command {
        Commands::Series {
            ticker,
            period,
            interval,
            format,
            output,
        } => {
            let service = build_service(&config)?;
            let request = SeriesRequest {
                ticker: Some(ticker),
                period,
                interval,
            };
            run_series(&service, &request, format, output.as_deref())
        }
        Commands::Forecast {
            ticker,
            period,
            horizon,
            output,
        } => {
            let service = build_service(&config)?;
            let request = ForecastRequest {
                ticker: Some(ticker),
                period,
                horizon,
            };
            let response = service.get_forecast(&request)?;
            write_json(&response, output.as_deref())
        }
        Commands::Search { query } => {
            let service = build_service(&config)?;
            let matches = service.search_tickers(&query);
            if matches.is_empty() {
                eprintln!("No tickers match '{query}'");
            }
            for hit in matches {
                println!("{:<14} {}", hit.ticker, hit.name);
            }
            Ok(())
        }
        Commands::Reference { table } => {
            let service = build_service(&config)?;
            match table {
                ReferenceTable::Languages => {
                    for (code, name) in service.languages() {
                        println!("{code:<6} {name}");
                    }
                }
                ReferenceTable::Timezones => {
                    for name in service.timezones() {
                        println!("{name}");
                    }
                }
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>, offline: bool) -> Result<PricelabConfig> {
    let mut config = match path {
        Some(path) => PricelabConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PricelabConfig::default(),
    };
    if offline {
        config.acquisition.source = SourceKind::Synthetic;
    }
    debug!(source = ?config.acquisition.source, "config ready");
    Ok(config)
}

fn build_service(config: &PricelabConfig) -> Result<MarketService> {
    MarketService::from_config(config).context("failed to build market service")
}

fn run_series(
    service: &MarketService,
    request: &SeriesRequest,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let table_format = match format {
        OutputFormat::Json => return write_json(&service.get_series(request)?, output),
        OutputFormat::Csv => TableFormat::Csv,
        OutputFormat::Parquet => TableFormat::Parquet,
    };

    if table_format == TableFormat::Parquet && output.is_none() {
        bail!("--format parquet requires --output");
    }

    let series = service.indicator_series(request)?;
    match output {
        Some(path) => {
            write_indicators_file(&series, table_format, path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote {} rows to {}", series.len(), path.display());
        }
        None => write_indicators(&series, table_format, io::stdout().lock())?,
    }
    Ok(())
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            serde_json::to_writer_pretty(file, value)?;
            eprintln!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, value)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_series_with_global_flags() {
        let cli = Cli::try_parse_from([
            "pricelab", "series", "AAPL", "--period", "1y", "--format", "csv", "--offline",
        ])
        .unwrap();
        assert!(cli.offline);
        match cli.command {
            Commands::Series {
                ticker,
                period,
                format,
                output,
                ..
            } => {
                assert_eq!(ticker, "AAPL");
                assert_eq!(period.as_deref(), Some("1y"));
                assert_eq!(format, OutputFormat::Csv);
                assert!(output.is_none());
            }
            _ => panic!("expected series command"),
        }
    }

    #[test]
    fn offline_switches_to_synthetic_source() {
        let config = load_config(None, true).unwrap();
        assert_eq!(config.acquisition.source, SourceKind::Synthetic);
        let config = load_config(None, false).unwrap();
        assert_eq!(config.acquisition.source, SourceKind::Yahoo);
    }

    #[test]
    fn parquet_to_stdout_is_rejected() {
        let config = load_config(None, true).unwrap();
        let service = build_service(&config).unwrap();
        let request = SeriesRequest {
            ticker: Some("SPY".into()),
            ..SeriesRequest::default()
        };
        let err = run_series(&service, &request, OutputFormat::Parquet, None).unwrap_err();
        assert!(err.to_string().contains("--output"));
    }

    #[test]
    fn offline_series_writes_csv_file() {
        let config = load_config(None, true).unwrap();
        let service = build_service(&config).unwrap();
        let request = SeriesRequest {
            ticker: Some("SPY".into()),
            period: Some("3mo".into()),
            interval: None,
        };
        let path = std::env::temp_dir().join(format!("pricelab-cli-{}.csv", std::process::id()));
        run_series(&service, &request, OutputFormat::Csv, Some(&path)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(text.starts_with("Date,Open,High,Low,Close"));
        assert!(text.lines().count() > 40);
    }
}
