//! Strategy capability — the seam where user trading logic plugs in.
//!
//! Dynamic loading and cross-language marshalling live behind this trait and
//! are not the core's problem: the engine only ever sees `on_init`,
//! `on_start`, `on_bar`, and `on_end`. The `on_bar` snapshot is read-only
//! and borrows from engine state for the duration of the call; strategies
//! must copy anything they want to keep.

pub mod builtin;
pub mod scripted;

use crate::domain::{Bar, EquitySnapshot, ExitOrder, Fill, Instruction, Money, Position};
use crate::params::HostParams;
use std::collections::BTreeMap;
use thiserror::Error;

pub use builtin::{BuyAndHold, MaCrossover};
pub use scripted::ScriptedStrategy;

/// Read-only view of simulation state handed to `on_bar`.
#[derive(Debug, Clone, Copy)]
pub struct StateSnapshot<'a> {
    pub cash: Money,
    pub current_timestamp_ns: i64,
    pub positions: &'a BTreeMap<String, Position>,
    /// Fills recorded since the previous bar.
    pub new_fills: &'a [Fill],
    /// Exit orders created since the previous bar.
    pub new_exit_orders: &'a [ExitOrder],
    pub equity_curve: &'a [EquitySnapshot],
}

impl StateSnapshot<'_> {
    pub fn position_quantity(&self, symbol: &str) -> f64 {
        self.positions.get(symbol).map_or(0.0, |p| p.quantity)
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }
}

/// A strategy callback failure. Fatal to the owning backtest only.
#[derive(Debug, Error)]
#[error("strategy error (code {code}): {message}")]
pub struct StrategyError {
    pub code: i32,
    pub message: String,
}

impl StrategyError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// User trading logic driven by the engine, one instance per backtest.
pub trait Strategy {
    fn name(&self) -> &str;

    fn on_init(&mut self, _params: &HostParams) -> Result<(), StrategyError> {
        Ok(())
    }

    fn on_start(&mut self) -> Result<(), StrategyError> {
        Ok(())
    }

    /// Called once per admitted bar. May block, must not retain the snapshot.
    fn on_bar(
        &mut self,
        bar: &Bar,
        snapshot: &StateSnapshot<'_>,
    ) -> Result<Vec<Instruction>, StrategyError>;

    /// Called after the last bar; the returned value lands in the report.
    fn on_end(&mut self) -> Result<serde_json::Value, StrategyError> {
        Ok(serde_json::Value::Null)
    }
}
