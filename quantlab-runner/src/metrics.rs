//! Performance metrics — pure functions over the finished equity curve.
//!
//! Every metric takes the curve (and optionally the fill log) and returns a
//! scalar. This is the post-pass that fills in what the engine leaves as
//! reserved zeros; nothing here feeds back into simulation state.

use quantlab_core::domain::{EquitySnapshot, Fill};
use serde::{Deserialize, Serialize};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Aggregate statistics for one finished backtest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub cagr: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub max_drawdown: f64,
    pub fill_count: usize,
    pub bar_count: usize,
}

impl PerformanceMetrics {
    pub fn compute(equity_curve: &[EquitySnapshot], fills: &[Fill]) -> Self {
        let equity: Vec<f64> = equity_curve.iter().map(|s| s.equity.to_f64()).collect();
        Self {
            total_return: total_return(&equity),
            cagr: cagr(&equity),
            sharpe: sharpe_ratio(&equity, 0.0),
            sortino: sortino_ratio(&equity, 0.0),
            max_drawdown: equity_curve.last().map_or(0.0, |s| s.max_drawdown),
            fill_count: fills.len(),
            bar_count: equity_curve.len(),
        }
    }
}

/// (final - initial) / initial; zero for degenerate curves.
pub fn total_return(equity: &[f64]) -> f64 {
    match (equity.first(), equity.last()) {
        (Some(&initial), Some(&last)) if equity.len() >= 2 && initial > 0.0 => {
            (last - initial) / initial
        }
        _ => 0.0,
    }
}

/// Compound annual growth rate, assuming daily bars.
pub fn cagr(equity: &[f64]) -> f64 {
    if equity.len() < 2 {
        return 0.0;
    }
    let initial = equity[0];
    let last = *equity.last().expect("nonempty");
    if initial <= 0.0 || last <= 0.0 {
        return 0.0;
    }
    let years = equity.len() as f64 / TRADING_DAYS_PER_YEAR;
    (last / initial).powf(1.0 / years) - 1.0
}

fn per_bar_returns(equity: &[f64]) -> Vec<f64> {
    equity
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

/// Annualized Sharpe ratio from per-bar returns. Zero when variance is zero.
pub fn sharpe_ratio(equity: &[f64], risk_free_rate: f64) -> f64 {
    let returns = per_bar_returns(equity);
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64 - risk_free_rate;
    let variance = returns
        .iter()
        .map(|r| (r - mean).powi(2))
        .sum::<f64>()
        / (returns.len() - 1) as f64;
    if variance <= 0.0 {
        return 0.0;
    }
    mean / variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Like Sharpe but penalizing only downside deviation.
pub fn sortino_ratio(equity: &[f64], risk_free_rate: f64) -> f64 {
    let returns = per_bar_returns(equity);
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64 - risk_free_rate;
    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    if downside.is_empty() {
        return 0.0;
    }
    let downside_variance =
        downside.iter().map(|r| r.powi(2)).sum::<f64>() / downside.len() as f64;
    if downside_variance <= 0.0 {
        return 0.0;
    }
    mean / downside_variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt()
}
