//! Position — net signed holding in a single symbol.

use super::money::Money;
use serde::{Deserialize, Serialize};

/// Quantities smaller than this are treated as flat.
pub const EPSILON: f64 = 1e-4;

/// Net position in one symbol. Negative quantity is a short.
///
/// A position with `|quantity| < EPSILON` is removed from the position map
/// and its average price reset to zero; the two representations of "flat"
/// are never allowed to diverge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: f64,
    pub average_price: Money,
}

impl Position {
    pub fn flat(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            quantity: 0.0,
            average_price: Money::ZERO,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.quantity.abs() < EPSILON
    }

    pub fn is_long(&self) -> bool {
        self.quantity >= EPSILON
    }

    pub fn is_short(&self) -> bool {
        self.quantity <= -EPSILON
    }

    /// Mark-to-market PnL against the average entry price.
    pub fn unrealized_pnl(&self, current_price: Money) -> Money {
        (current_price - self.average_price) * self.quantity
    }
}
