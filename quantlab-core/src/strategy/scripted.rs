//! Scripted strategy — replays a predetermined instruction stream.
//!
//! Drives the engine with exact, reproducible inputs: the scenario tests and
//! the determinism property are built on it. The script maps a bar ordinal
//! (0-based count of admitted bars) to the instructions to emit on that bar.

use super::{StateSnapshot, Strategy, StrategyError};
use crate::domain::{Bar, Instruction};
use std::collections::HashMap;

/// Replays `script[bar_ordinal]` as the instruction list for each bar.
#[derive(Debug, Default)]
pub struct ScriptedStrategy {
    script: HashMap<usize, Vec<Instruction>>,
    bars_seen: usize,
}

impl ScriptedStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit `instructions` on the bar with ordinal `bar_index`.
    pub fn at(mut self, bar_index: usize, instructions: Vec<Instruction>) -> Self {
        self.script.insert(bar_index, instructions);
        self
    }

    pub fn bars_seen(&self) -> usize {
        self.bars_seen
    }
}

impl Strategy for ScriptedStrategy {
    fn name(&self) -> &str {
        "scripted"
    }

    fn on_bar(
        &mut self,
        _bar: &Bar,
        _snapshot: &StateSnapshot<'_>,
    ) -> Result<Vec<Instruction>, StrategyError> {
        let instructions = self.script.get(&self.bars_seen).cloned().unwrap_or_default();
        self.bars_seen += 1;
        Ok(instructions)
    }

    fn on_end(&mut self) -> Result<serde_json::Value, StrategyError> {
        Ok(serde_json::json!({ "bars_seen": self.bars_seen }))
    }
}
