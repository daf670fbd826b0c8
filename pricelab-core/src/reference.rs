//! Static reference tables: languages, timezones, ticker catalog.
//!
//! Loaded once at startup from an optional directory holding
//! `languages.json`, `timezones.json` and `tickers.json`. Any file that is
//! missing or unreadable falls back to the embedded default, so loading never
//! fails. The tables are read-only afterwards and shared behind an `Arc`.

use std::collections::BTreeMap;
use std::path::Path;

use chrono_tz::Tz;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

const DEFAULT_LANGUAGES: &str = include_str!("../data/languages.json");
const DEFAULT_TICKERS: &str = include_str!("../data/tickers.json");

/// One ticker-search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickerMatch {
    pub ticker: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceData {
    languages: BTreeMap<String, String>,
    timezones: Vec<String>,
    tickers: BTreeMap<String, String>,
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self {
            languages: parse_embedded(DEFAULT_LANGUAGES),
            timezones: default_timezones(),
            tickers: parse_embedded(DEFAULT_TICKERS),
        }
    }
}

impl ReferenceData {
    /// Load the tables from `dir`, falling back per file to the defaults.
    pub fn load(dir: Option<&Path>) -> Self {
        let Some(dir) = dir else {
            return Self::default();
        };

        let languages = load_table(&dir.join("languages.json"))
            .unwrap_or_else(|| parse_embedded(DEFAULT_LANGUAGES));
        let timezones = load_table::<Vec<String>>(&dir.join("timezones.json"))
            .map(|names| names.into_iter().filter(|name| is_known_timezone(name)).collect())
            .unwrap_or_else(default_timezones);
        let tickers = load_table(&dir.join("tickers.json"))
            .unwrap_or_else(|| parse_embedded(DEFAULT_TICKERS));

        Self {
            languages,
            timezones,
            tickers,
        }
    }

    pub fn languages(&self) -> &BTreeMap<String, String> {
        &self.languages
    }

    pub fn timezones(&self) -> &[String] {
        &self.timezones
    }

    pub fn tickers(&self) -> &BTreeMap<String, String> {
        &self.tickers
    }

    /// Case-insensitive substring match on symbol or name, sorted by symbol.
    /// An empty query matches nothing.
    pub fn search_tickers(&self, query: &str) -> Vec<TickerMatch> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        self.tickers
            .iter()
            .filter(|(ticker, name)| {
                ticker.to_lowercase().contains(&query) || name.to_lowercase().contains(&query)
            })
            .map(|(ticker, name)| TickerMatch {
                ticker: ticker.clone(),
                name: name.clone(),
            })
            .collect()
    }
}

/// True for IANA names chrono-tz knows.
pub fn is_known_timezone(name: &str) -> bool {
    name.parse::<Tz>().is_ok()
}

fn default_timezones() -> Vec<String> {
    chrono_tz::TZ_VARIANTS
        .iter()
        .map(|tz| tz.name().to_owned())
        .collect()
}

fn parse_embedded(content: &str) -> BTreeMap<String, String> {
    serde_json::from_str(content).unwrap_or_default()
}

fn load_table<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "reference file not found, using default");
            return None;
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read reference file, using default");
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(table) => Some(table),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "invalid reference file, using default");
            None
        }
    }
}
