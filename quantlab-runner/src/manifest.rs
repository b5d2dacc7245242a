//! Strategy manifests — one TOML file per strategy.
//!
//! A manifest names the strategy implementation (a registry key), carries its
//! host parameters, and declares the symbols it trades:
//!
//! ```toml
//! name = "spy-momentum"
//! strategy = "ma_crossover"
//!
//! [params]
//! initial_capital = 10000000000
//! position_size_value = 0.25
//!
//! [[params.symbols]]
//! symbol = "SPY"
//! timespan = 1
//! timespan_unit = "day"
//! ```

use quantlab_core::params::HostParams;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading or validating manifests.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("manifest '{name}' declares no symbols")]
    NoSymbols { name: String },
}

/// A parsed strategy manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyManifest {
    /// Display name for reports and logs.
    pub name: String,
    /// Registry key choosing the strategy implementation.
    pub strategy: String,
    pub params: HostParams,
}

impl StrategyManifest {
    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        let raw = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: StrategyManifest =
            toml::from_str(&raw).map_err(|source| ManifestError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        if manifest.params.symbols.is_empty() {
            return Err(ManifestError::NoSymbols {
                name: manifest.name,
            });
        }
        Ok(manifest)
    }

    /// Load every `*.toml` in a directory, sorted by file name so batch
    /// ordering is stable.
    pub fn load_dir(dir: &Path) -> Result<Vec<Self>, ManifestError> {
        let entries = fs::read_dir(dir).map_err(|source| ManifestError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        paths.sort();

        paths.iter().map(|path| Self::from_path(path)).collect()
    }
}
