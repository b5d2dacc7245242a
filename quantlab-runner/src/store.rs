//! Shared bar store for the ingest → compute handoff.
//!
//! Writers (the ingest fan-out) insert under the mutex. Before the compute
//! phase starts, `snapshot()` clones out an immutable view; workers read
//! their `Arc`-shared vectors without touching the lock, which is sound
//! because every writer has drained by then.

use quantlab_core::domain::Bar;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Bars per (strategy name, symbol).
#[derive(Debug, Default)]
pub struct DataStore {
    inner: Mutex<HashMap<String, HashMap<String, Arc<Vec<Bar>>>>>,
}

/// Immutable view handed to compute workers.
#[derive(Debug, Clone, Default)]
pub struct DataSnapshot {
    bars: HashMap<String, HashMap<String, Arc<Vec<Bar>>>>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, strategy: &str, symbol: &str, bars: Vec<Bar>) {
        let mut inner = self.inner.lock().expect("data store lock poisoned");
        inner
            .entry(strategy.to_string())
            .or_default()
            .insert(symbol.to_string(), Arc::new(bars));
    }

    /// Clone out the current contents. Called once, after ingest completes.
    pub fn snapshot(&self) -> DataSnapshot {
        let inner = self.inner.lock().expect("data store lock poisoned");
        DataSnapshot {
            bars: inner.clone(),
        }
    }
}

impl DataSnapshot {
    /// Per-symbol streams for one strategy, in the order given by `symbols`.
    /// Symbols with no ingested bars yield empty streams; the engine turns
    /// those into its missing-data error.
    pub fn streams_for(&self, strategy: &str, symbols: &[String]) -> Vec<Vec<Bar>> {
        let per_symbol = self.bars.get(strategy);
        symbols
            .iter()
            .map(|symbol| {
                per_symbol
                    .and_then(|m| m.get(symbol))
                    .map(|bars| bars.as_ref().clone())
                    .unwrap_or_default()
            })
            .collect()
    }
}
