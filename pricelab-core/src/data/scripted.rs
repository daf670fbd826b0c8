//! Replays a fixed script of upstream outcomes.
//!
//! Each `history` call pops the next outcome; once the script runs out the
//! fallback outcome repeats. Calls are counted so tests can assert how often
//! the acquisition loop reached the upstream.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::provider::{RawTable, UpstreamError, UpstreamSource};
use crate::domain::{Interval, Period, Symbol};

pub type ScriptedOutcome = Result<Option<RawTable>, UpstreamError>;

#[derive(Debug)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<ScriptedOutcome>>,
    fallback: ScriptedOutcome,
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new(script: impl IntoIterator<Item = ScriptedOutcome>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback: Ok(None),
            calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Every call returns `outcome`.
    pub fn always(outcome: ScriptedOutcome) -> Self {
        Self::new([]).with_fallback(outcome)
    }

    /// Outcome used once the script is exhausted (default: no data).
    pub fn with_fallback(mut self, outcome: ScriptedOutcome) -> Self {
        self.fallback = outcome;
        self
    }

    /// Number of `history` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Symbols passed to `history`, in call order.
    pub fn requested_symbols(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|symbols| symbols.clone())
            .unwrap_or_default()
    }
}

impl UpstreamSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    fn history(
        &self,
        symbol: &Symbol,
        _period: Period,
        _interval: Interval,
    ) -> Result<Option<RawTable>, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(symbol.to_string());
        }

        let next = self
            .script
            .lock()
            .map_err(|_| UpstreamError::Other("script lock poisoned".into()))?
            .pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}
