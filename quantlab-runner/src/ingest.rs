//! Ingest phase — fetch bars for every (strategy, symbol) pair.
//!
//! The fan-out runs on rayon; each task probes the response cache first, so
//! re-runs against warm caches are network-free. All writers drain before the
//! compute phase reads the store. Failures are collected per pair rather than
//! aborting the batch: a strategy with missing data fails later, by itself,
//! with the engine's missing-data error.

use crate::manifest::StrategyManifest;
use crate::store::DataStore;
use quantlab_core::data::{AggregateBarsRequest, BarFetcher, BarProvider, DataError, ResponseCache};
use rayon::prelude::*;

const DEFAULT_FROM: &str = "2024-01-01";
const DEFAULT_TO: &str = "2024-12-31";

/// One failed (strategy, symbol) fetch.
#[derive(Debug)]
pub struct IngestFailure {
    pub strategy: String,
    pub symbol: String,
    pub error: DataError,
}

/// Fetch every declared symbol for every manifest into the store.
pub fn ingest_all(
    manifests: &[StrategyManifest],
    provider: &dyn BarProvider,
    cache: &ResponseCache,
    store: &DataStore,
) -> Vec<IngestFailure> {
    let work: Vec<(&StrategyManifest, AggregateBarsRequest)> = manifests
        .iter()
        .flat_map(|manifest| {
            manifest.params.symbols.iter().map(move |spec| {
                let request = AggregateBarsRequest {
                    symbol: spec.symbol.clone(),
                    timespan: spec.timespan,
                    timespan_unit: spec.timespan_unit.clone(),
                    from: manifest
                        .params
                        .backtest_start
                        .clone()
                        .unwrap_or_else(|| DEFAULT_FROM.into()),
                    to: manifest
                        .params
                        .backtest_end
                        .clone()
                        .unwrap_or_else(|| DEFAULT_TO.into()),
                };
                (manifest, request)
            })
        })
        .collect();

    work.par_iter()
        .filter_map(|(manifest, request)| {
            let fetcher = BarFetcher::new(provider, cache);
            match fetcher.fetch(request) {
                Ok(bars) => {
                    tracing::info!(
                        strategy = %manifest.name,
                        symbol = %request.symbol,
                        bars = bars.len(),
                        "ingested"
                    );
                    store.insert(&manifest.name, &request.symbol, bars);
                    None
                }
                Err(error) => {
                    tracing::warn!(
                        strategy = %manifest.name,
                        symbol = %request.symbol,
                        %error,
                        "ingest failed"
                    );
                    Some(IngestFailure {
                        strategy: manifest.name.clone(),
                        symbol: request.symbol.clone(),
                        error,
                    })
                }
            }
        })
        .collect()
}
