//! Host parameters — the per-strategy configuration consumed by the core.
//!
//! Parsed from the strategy manifest and validated once at setup. A
//! validation failure is fatal for that backtest before any bar is processed;
//! everything downstream may assume a checked configuration.

use crate::domain::Money;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

fn default_true() -> bool {
    true
}

fn default_timezone() -> String {
    "America/New_York".to_string()
}

/// Commission model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionType {
    /// `rate * quantity`
    PerShare,
    /// `rate * quantity * price`
    Percentage,
    /// `rate` per fill
    Flat,
}

/// How a newly submitted order maps to a future fill timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlippageModel {
    /// Fill on the current bar.
    None,
    /// Fixed delay of `slippage` milliseconds.
    TimeBased,
    /// Delay scales with order size relative to bar volume.
    TimeVolumeBased,
}

/// Signal sizing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSizingMethod {
    FixedPercentage,
    FixedDollar,
    EqualWeight,
}

/// One instrument declared by the strategy manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolSpec {
    pub symbol: String,
    pub timespan: u32,
    pub timespan_unit: String,
}

/// Per-strategy host configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostParams {
    pub initial_capital: Money,
    #[serde(default)]
    pub symbols: Vec<SymbolSpec>,

    #[serde(default)]
    pub market_hours_only: bool,
    #[serde(default = "default_timezone")]
    pub market_timezone: String,

    #[serde(default)]
    pub allow_fractional_shares: bool,
    #[serde(default = "default_true")]
    pub allow_short_selling: bool,

    #[serde(default)]
    pub commission: Option<f64>,
    #[serde(default)]
    pub commission_type: Option<CommissionType>,

    #[serde(default)]
    pub slippage: Option<f64>,
    #[serde(default)]
    pub slippage_model: Option<SlippageModel>,

    #[serde(default)]
    pub fill_max_pct_of_volume: Option<f64>,
    #[serde(default)]
    pub initial_margin_pct: Option<f64>,
    #[serde(default)]
    pub max_leverage: Option<f64>,

    #[serde(default)]
    pub position_sizing_method: Option<PositionSizingMethod>,
    #[serde(default)]
    pub position_size_value: Option<f64>,
    #[serde(default)]
    pub max_position_size: Option<f64>,

    #[serde(default)]
    pub use_stop_loss: bool,
    #[serde(default)]
    pub stop_loss_pct: Option<f64>,
    #[serde(default)]
    pub use_take_profit: bool,
    #[serde(default)]
    pub take_profit_pct: Option<f64>,

    /// Fetch window for the data phase, ISO-8601 dates.
    #[serde(default)]
    pub backtest_start: Option<String>,
    #[serde(default)]
    pub backtest_end: Option<String>,

    /// Seed for the deterministic fill-id generator.
    #[serde(default)]
    pub seed: u64,
}

impl HostParams {
    /// A minimal valid configuration, used heavily by tests.
    pub fn with_capital(initial_capital: Money) -> Self {
        Self {
            initial_capital,
            symbols: Vec::new(),
            market_hours_only: false,
            market_timezone: default_timezone(),
            allow_fractional_shares: false,
            allow_short_selling: true,
            commission: None,
            commission_type: None,
            slippage: None,
            slippage_model: None,
            fill_max_pct_of_volume: None,
            initial_margin_pct: None,
            max_leverage: None,
            position_sizing_method: None,
            position_size_value: None,
            max_position_size: None,
            use_stop_loss: false,
            stop_loss_pct: None,
            use_take_profit: false,
            take_profit_pct: None,
            backtest_start: None,
            backtest_end: None,
            seed: 0,
        }
    }

    /// Effective per-order leverage ceiling.
    pub fn max_leverage_or_default(&self) -> f64 {
        self.max_leverage.unwrap_or(1.0)
    }

    /// The configured exchange timezone, already validated.
    pub fn timezone(&self) -> Tz {
        self.market_timezone
            .parse()
            .expect("timezone validated at setup")
    }

    /// Validate the configuration. Fatal for the backtest on failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_capital <= Money::ZERO {
            return Err(ConfigError::NonPositiveInitialCapital);
        }
        if self.market_timezone.parse::<Tz>().is_err() {
            return Err(ConfigError::UnknownTimezone(self.market_timezone.clone()));
        }
        if let Some(pct) = self.fill_max_pct_of_volume {
            if !(pct > 0.0 && pct <= 1.0) {
                return Err(ConfigError::OutOfRange {
                    option: "fill_max_pct_of_volume",
                    expected: "(0, 1]",
                    got: pct,
                });
            }
        }
        if let Some(lev) = self.max_leverage {
            if lev < 1.0 {
                return Err(ConfigError::OutOfRange {
                    option: "max_leverage",
                    expected: ">= 1",
                    got: lev,
                });
            }
        }
        if let Some(pct) = self.initial_margin_pct {
            if !(0.0..=1.0).contains(&pct) {
                return Err(ConfigError::OutOfRange {
                    option: "initial_margin_pct",
                    expected: "[0, 1]",
                    got: pct,
                });
            }
        }
        if let Some(rate) = self.commission {
            if rate < 0.0 {
                return Err(ConfigError::OutOfRange {
                    option: "commission",
                    expected: ">= 0",
                    got: rate,
                });
            }
        }
        if let Some(delay) = self.slippage {
            if delay < 0.0 {
                return Err(ConfigError::OutOfRange {
                    option: "slippage",
                    expected: ">= 0",
                    got: delay,
                });
            }
        }
        if self.use_stop_loss {
            match self.stop_loss_pct {
                Some(pct) if pct > 0.0 && pct < 1.0 => {}
                Some(pct) => {
                    return Err(ConfigError::OutOfRange {
                        option: "stop_loss_pct",
                        expected: "(0, 1)",
                        got: pct,
                    })
                }
                None => return Err(ConfigError::Missing("stop_loss_pct")),
            }
        }
        if self.use_take_profit {
            match self.take_profit_pct {
                Some(pct) if pct > 0.0 => {}
                Some(pct) => {
                    return Err(ConfigError::OutOfRange {
                        option: "take_profit_pct",
                        expected: "> 0",
                        got: pct,
                    })
                }
                None => return Err(ConfigError::Missing("take_profit_pct")),
            }
        }
        if let Some(value) = self.position_size_value {
            if value < 0.0 {
                return Err(ConfigError::OutOfRange {
                    option: "position_size_value",
                    expected: ">= 0",
                    got: value,
                });
            }
        }
        Ok(())
    }
}

/// Fatal configuration errors, raised at setup before any bar is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("initial_capital must be positive")]
    NonPositiveInitialCapital,

    #[error("unknown market_timezone: {0}")]
    UnknownTimezone(String),

    #[error("required option missing: {0}")]
    Missing(&'static str),

    #[error("{option} out of range: expected {expected}, got {got}")]
    OutOfRange {
        option: &'static str,
        expected: &'static str,
        got: f64,
    },
}
