//! Equity, available margin, return, and drawdown calculators.
//!
//! Pure functions over `SimState`. The monetary identity these maintain:
//! `equity = cash + margin_in_use + Σ (close - avg_price) * quantity`, i.e.
//! cash on hand, plus margin parked against open fills, plus unrealized PnL
//! marked at the latest close.

use crate::domain::Money;
use crate::params::HostParams;
use crate::sim::state::SimState;

/// Tolerance for "is the peak meaningfully positive" in drawdown math.
const PEAK_EPSILON_MICROS: i64 = 1;

/// Mark-to-market equity.
pub fn equity(state: &SimState) -> Money {
    let unrealized: Money = state
        .positions
        .values()
        .map(|pos| {
            let price = state.close(&pos.symbol).unwrap_or(pos.average_price);
            pos.unrealized_pnl(price)
        })
        .sum();
    state.cash + state.margin_in_use + unrealized
}

/// Equity not already reserved as margin.
pub fn available_margin(state: &SimState) -> Money {
    equity(state) - state.margin_in_use
}

/// Fractional return against initial capital.
pub fn total_return(params: &HostParams, equity: Money) -> f64 {
    (equity - params.initial_capital).to_f64() / params.initial_capital.to_f64()
}

/// Current drawdown from peak, in `[0, 1]`. Zero when the peak is not
/// meaningfully positive.
pub fn drawdown(peak_equity: Money, equity: Money) -> f64 {
    if peak_equity.micros() <= PEAK_EPSILON_MICROS {
        return 0.0;
    }
    ((peak_equity - equity).to_f64() / peak_equity.to_f64()).max(0.0)
}
