//! QuantLab CLI — fetch market data and run backtest batches.
//!
//! Commands:
//! - `fetch` — populate the response cache for every manifest's symbols
//! - `run` — ingest (cache-first), run one backtest per strategy, write
//!   JSON + CSV artifacts

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use quantlab_core::data::{PolygonProvider, ResponseCache};
use quantlab_runner::{ingest_all, run_all, write_artifacts, DataStore, StrategyManifest};

#[derive(Parser)]
#[command(name = "quantlab", about = "Quantitative strategy backtesting engine")]
struct Cli {
    /// Directory of strategy manifests (*.toml).
    #[arg(long, default_value = "manifests")]
    manifest_dir: PathBuf,

    /// Response cache directory.
    #[arg(long, default_value = ".quantlab-cache")]
    cache_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch bar data for every manifest symbol into the cache.
    Fetch {
        /// Polygon API key; falls back to $POLYGON_API_KEY.
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Run every manifest's backtest and write report artifacts.
    Run {
        /// Output directory for reports.
        #[arg(long, default_value = "reports")]
        out_dir: PathBuf,

        /// Polygon API key; falls back to $POLYGON_API_KEY. Only needed when
        /// the cache is cold.
        #[arg(long)]
        api_key: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let manifests = StrategyManifest::load_dir(&cli.manifest_dir)
        .with_context(|| format!("loading manifests from {}", cli.manifest_dir.display()))?;
    if manifests.is_empty() {
        bail!("no manifests found in {}", cli.manifest_dir.display());
    }

    let cache = ResponseCache::new(&cli.cache_dir);

    match cli.command {
        Command::Fetch { api_key } => {
            let provider = PolygonProvider::new(resolve_api_key(api_key)?);
            let store = DataStore::new();
            let failures = ingest_all(&manifests, &provider, &cache, &store);
            for failure in &failures {
                tracing::warn!(
                    strategy = %failure.strategy,
                    symbol = %failure.symbol,
                    error = %failure.error,
                    "fetch failed"
                );
            }
            if !failures.is_empty() {
                bail!("{} of the fetches failed", failures.len());
            }
            println!("cache warmed for {} manifest(s)", manifests.len());
        }
        Command::Run { out_dir, api_key } => {
            // An empty key is fine when every response is already cached.
            let provider = PolygonProvider::new(resolve_api_key(api_key).unwrap_or_default());
            let store = DataStore::new();
            let failures = ingest_all(&manifests, &provider, &cache, &store);
            for failure in &failures {
                tracing::warn!(
                    strategy = %failure.strategy,
                    symbol = %failure.symbol,
                    error = %failure.error,
                    "ingest failed; strategy will report missing data"
                );
            }

            let outcomes = run_all(&manifests, &store.snapshot());
            let mut failed = 0usize;
            for outcome in &outcomes {
                match &outcome.result {
                    Ok(run) => {
                        let path = write_artifacts(&out_dir, run)?;
                        println!(
                            "{}: return {:+.2}% over {} bars, {} fills -> {}",
                            run.name,
                            run.metrics.total_return * 100.0,
                            run.metrics.bar_count,
                            run.metrics.fill_count,
                            path.display()
                        );
                    }
                    Err(error) => {
                        failed += 1;
                        eprintln!("{}: FAILED: {error}", outcome.name);
                    }
                }
            }
            if failed > 0 {
                bail!("{failed} backtest(s) failed");
            }
        }
    }

    Ok(())
}

fn resolve_api_key(flag: Option<String>) -> Result<String> {
    if let Some(key) = flag {
        return Ok(key);
    }
    std::env::var("POLYGON_API_KEY")
        .context("no API key: pass --api-key or set POLYGON_API_KEY")
}
