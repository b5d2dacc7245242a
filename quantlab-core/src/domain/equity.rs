//! Equity snapshot — one entry per processed bar.

use super::money::Money;
use serde::{Deserialize, Serialize};

/// Point-in-time equity record.
///
/// Only `equity`, `total_return`, and `max_drawdown` are populated by the
/// engine; the remaining ratio fields are reserved for a metrics pass that
/// runs over the finished curve and stay zero until then.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquitySnapshot {
    pub timestamp_ns: i64,
    pub equity: Money,
    pub total_return: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub sharpe_ratio_rolling: f64,
    pub sortino_ratio: f64,
    pub sortino_ratio_rolling: f64,
    pub calmar_ratio: f64,
    pub calmar_ratio_rolling: f64,
    pub tail_ratio: f64,
    pub tail_ratio_rolling: f64,
    pub value_at_risk: f64,
    pub value_at_risk_rolling: f64,
    pub conditional_value_at_risk: f64,
    pub conditional_value_at_risk_rolling: f64,
}

impl EquitySnapshot {
    /// A snapshot with the engine-populated fields set and all reserved
    /// metric fields zero.
    pub fn at(timestamp_ns: i64, equity: Money, total_return: f64, max_drawdown: f64) -> Self {
        Self {
            timestamp_ns,
            equity,
            total_return,
            max_drawdown,
            sharpe_ratio: 0.0,
            sharpe_ratio_rolling: 0.0,
            sortino_ratio: 0.0,
            sortino_ratio_rolling: 0.0,
            calmar_ratio: 0.0,
            calmar_ratio_rolling: 0.0,
            tail_ratio: 0.0,
            tail_ratio_rolling: 0.0,
            value_at_risk: 0.0,
            value_at_risk_rolling: 0.0,
            conditional_value_at_risk: 0.0,
            conditional_value_at_risk_rolling: 0.0,
        }
    }
}
