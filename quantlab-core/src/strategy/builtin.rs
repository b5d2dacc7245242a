//! Built-in strategies.
//!
//! These stand in for externally loaded plugins: simple, well-understood
//! logic that exercises the host's signal path end to end and gives the
//! runner something to execute out of the box.

use super::{StateSnapshot, Strategy, StrategyError};
use crate::domain::{Bar, Instruction, OrderSide, Signal};
use std::collections::{HashMap, HashSet};

/// Emits one buy signal per symbol on its first bar, then holds.
#[derive(Debug, Default)]
pub struct BuyAndHold {
    entered: HashSet<String>,
}

impl BuyAndHold {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Strategy for BuyAndHold {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn on_bar(
        &mut self,
        bar: &Bar,
        _snapshot: &StateSnapshot<'_>,
    ) -> Result<Vec<Instruction>, StrategyError> {
        if self.entered.insert(bar.symbol.clone()) {
            return Ok(vec![Instruction::Signal(Signal {
                symbol: bar.symbol.clone(),
                side: OrderSide::Buy,
            })]);
        }
        Ok(Vec::new())
    }

    fn on_end(&mut self) -> Result<serde_json::Value, StrategyError> {
        Ok(serde_json::json!({ "symbols_entered": self.entered.len() }))
    }
}

/// Moving-average crossover.
///
/// Keeps a rolling window of closes per symbol; emits a buy signal when the
/// fast mean crosses above the slow mean and a sell when it crosses below.
/// Flat until both windows are full.
#[derive(Debug)]
pub struct MaCrossover {
    fast: usize,
    slow: usize,
    closes: HashMap<String, Vec<f64>>,
    above: HashMap<String, bool>,
}

impl MaCrossover {
    pub fn new(fast: usize, slow: usize) -> Self {
        assert!(fast < slow, "fast window must be shorter than slow");
        Self {
            fast,
            slow,
            closes: HashMap::new(),
            above: HashMap::new(),
        }
    }

    fn mean(values: &[f64]) -> f64 {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl Strategy for MaCrossover {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn on_bar(
        &mut self,
        bar: &Bar,
        snapshot: &StateSnapshot<'_>,
    ) -> Result<Vec<Instruction>, StrategyError> {
        let closes = self.closes.entry(bar.symbol.clone()).or_default();
        closes.push(bar.close.to_f64());
        if closes.len() > self.slow {
            closes.remove(0);
        }
        if closes.len() < self.slow {
            return Ok(Vec::new());
        }

        let fast_mean = Self::mean(&closes[closes.len() - self.fast..]);
        let slow_mean = Self::mean(closes);
        let now_above = fast_mean > slow_mean;
        let was_above = self.above.insert(bar.symbol.clone(), now_above);

        let Some(was_above) = was_above else {
            return Ok(Vec::new());
        };
        if now_above == was_above {
            return Ok(Vec::new());
        }

        // Crossed. Long on the way up; flatten on the way down.
        if now_above {
            Ok(vec![Instruction::Signal(Signal {
                symbol: bar.symbol.clone(),
                side: OrderSide::Buy,
            })])
        } else if snapshot.position_quantity(&bar.symbol) > 0.0 {
            Ok(vec![Instruction::Signal(Signal {
                symbol: bar.symbol.clone(),
                side: OrderSide::Sell,
            })])
        } else {
            Ok(Vec::new())
        }
    }

    fn on_end(&mut self) -> Result<serde_json::Value, StrategyError> {
        Ok(serde_json::json!({ "fast": self.fast, "slow": self.slow }))
    }
}
