//! Batch runner — one backtest per strategy, fanned out on rayon.
//!
//! Workers share nothing mutable: each builds its own strategy instance,
//! merges its own bar feed from the immutable data snapshot, and owns its
//! engine state for the duration of the run. A fatal error in one backtest
//! is recorded in that strategy's outcome and leaves the rest untouched.

use crate::manifest::StrategyManifest;
use crate::metrics::PerformanceMetrics;
use crate::registry;
use crate::store::DataSnapshot;
use quantlab_core::feed::merge_bar_streams;
use quantlab_core::sim::{run_backtest, BacktestReport, EngineError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a strategy's backtest did not produce a report.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("unknown strategy '{key}' (known: {known})")]
    UnknownStrategy { key: String, known: String },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// A finished run: the core report plus the metrics post-pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyRunReport {
    pub name: String,
    pub report: BacktestReport,
    pub metrics: PerformanceMetrics,
}

/// Per-strategy outcome of a batch.
#[derive(Debug)]
pub struct RunOutcome {
    pub name: String,
    pub result: Result<StrategyRunReport, RunError>,
}

/// Run one strategy from its manifest against the data snapshot.
pub fn run_one(
    manifest: &StrategyManifest,
    snapshot: &DataSnapshot,
) -> Result<StrategyRunReport, RunError> {
    let mut strategy =
        registry::build_strategy(&manifest.strategy).ok_or_else(|| RunError::UnknownStrategy {
            key: manifest.strategy.clone(),
            known: registry::known_strategies().join(", "),
        })?;

    let symbols: Vec<String> = manifest
        .params
        .symbols
        .iter()
        .map(|s| s.symbol.clone())
        .collect();
    let streams = snapshot.streams_for(&manifest.name, &symbols);
    let bars = merge_bar_streams(streams);

    let report = run_backtest(strategy.as_mut(), &bars, &manifest.params)?;
    let metrics = PerformanceMetrics::compute(&report.equity_curve, &report.fills);

    Ok(StrategyRunReport {
        name: manifest.name.clone(),
        report,
        metrics,
    })
}

/// Run every manifest concurrently. Outcomes come back in manifest order.
pub fn run_all(manifests: &[StrategyManifest], snapshot: &DataSnapshot) -> Vec<RunOutcome> {
    manifests
        .par_iter()
        .map(|manifest| {
            let result = run_one(manifest, snapshot);
            match &result {
                Ok(run) => tracing::info!(
                    strategy = %run.name,
                    total_return = run.metrics.total_return,
                    fills = run.metrics.fill_count,
                    "backtest complete"
                ),
                Err(error) => tracing::error!(strategy = %manifest.name, %error, "backtest failed"),
            }
            RunOutcome {
                name: manifest.name.clone(),
                result,
            }
        })
        .collect()
}
