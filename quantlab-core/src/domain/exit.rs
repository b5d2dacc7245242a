//! Exit orders — conditional market orders attached to a source fill.
//!
//! Created at fill time from the originating order's stop-loss / take-profit
//! prices. Mutable for their lifetime: `trigger_quantity` shrinks as the
//! source fill is consumed by FIFO reduction, and the entry disappears when
//! it reaches zero or the trigger fires.

use super::fill::FillId;
use super::money::Money;
use super::position::EPSILON;
use serde::{Deserialize, Serialize};

/// Shared payload of both exit order kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitTrigger {
    pub symbol: String,
    pub trigger_quantity: f64,
    pub trigger_price: Money,
    pub reference_fill_price: Money,
    pub created_at_ns: i64,
    pub source_fill_id: FillId,
    pub is_short_position: bool,
}

/// Stop-loss or take-profit attached to a specific source fill.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitOrder {
    StopLoss(ExitTrigger),
    TakeProfit(ExitTrigger),
}

impl ExitOrder {
    pub fn trigger(&self) -> &ExitTrigger {
        match self {
            ExitOrder::StopLoss(t) | ExitOrder::TakeProfit(t) => t,
        }
    }

    pub fn trigger_mut(&mut self) -> &mut ExitTrigger {
        match self {
            ExitOrder::StopLoss(t) | ExitOrder::TakeProfit(t) => t,
        }
    }

    pub fn is_stop_loss(&self) -> bool {
        matches!(self, ExitOrder::StopLoss(_))
    }

    /// Whether `price` fires this exit.
    ///
    /// A stop-loss fires on price adverse to the position (at or below the
    /// stop for a long, at or above for a short); a take-profit on price
    /// favorable to it.
    pub fn is_triggered_by(&self, price: Money) -> bool {
        match self {
            ExitOrder::StopLoss(t) => {
                if t.is_short_position {
                    price >= t.trigger_price
                } else {
                    price <= t.trigger_price
                }
            }
            ExitOrder::TakeProfit(t) => {
                if t.is_short_position {
                    price <= t.trigger_price
                } else {
                    price >= t.trigger_price
                }
            }
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.trigger().trigger_quantity < EPSILON
    }
}
