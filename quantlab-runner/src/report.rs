//! Report artifacts — JSON report and CSV equity curve per strategy.

use crate::runner::StrategyRunReport;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Write `{out_dir}/{name}.json` and `{out_dir}/{name}_equity.csv`.
///
/// Returns the JSON path. File names reuse the manifest name, so a batch of
/// strategies lands side by side in one directory.
pub fn write_artifacts(out_dir: &Path, run: &StrategyRunReport) -> Result<PathBuf, ReportError> {
    fs::create_dir_all(out_dir).map_err(|source| ReportError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let json_path = out_dir.join(format!("{}.json", run.name));
    let json = serde_json::to_string_pretty(run)?;
    fs::write(&json_path, json).map_err(|source| ReportError::Io {
        path: json_path.clone(),
        source,
    })?;

    let csv_path = out_dir.join(format!("{}_equity.csv", run.name));
    write_equity_csv(&csv_path, run)?;

    Ok(json_path)
}

fn write_equity_csv(path: &Path, run: &StrategyRunReport) -> Result<(), ReportError> {
    let map_io = |source: std::io::Error| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::create(path).map_err(map_io)?;
    writeln!(file, "timestamp_ns,equity,total_return,max_drawdown").map_err(map_io)?;
    for snap in &run.report.equity_curve {
        writeln!(
            file,
            "{},{},{:.6},{:.6}",
            snap.timestamp_ns, snap.equity, snap.total_return, snap.max_drawdown
        )
        .map_err(map_io)?;
    }
    Ok(())
}
