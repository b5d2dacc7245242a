//! Slippage scheduler — maps a newly submitted order to its fill timestamp.

use crate::domain::Order;
use crate::params::{HostParams, SlippageModel};
use crate::sim::state::SimState;

const NANOS_PER_MILLISECOND: f64 = 1e6;
const NANOS_PER_SECOND: f64 = 1e9;

/// Compute when `order` should fill, in nanoseconds.
///
/// - `None` (or unset): the current bar timestamp — fill this bar.
/// - `TimeBased`: fixed delay of `slippage` milliseconds.
/// - `TimeVolumeBased`: delay of `slippage * (quantity / bar volume)` seconds;
///   falls back to the current bar when no volume is known.
pub fn scheduled_fill_time_ns(order: &Order, params: &HostParams, state: &SimState) -> i64 {
    let now = state.current_timestamp_ns;

    match params.slippage_model {
        None | Some(SlippageModel::None) => now,
        Some(SlippageModel::TimeBased) => {
            let delay_ns = params.slippage.unwrap_or(0.0) * NANOS_PER_MILLISECOND;
            now + delay_ns as i64
        }
        Some(SlippageModel::TimeVolumeBased) => {
            let Some(volume) = state.volume(&order.symbol).filter(|v| *v > 0.0) else {
                return now;
            };
            let size_ratio = order.quantity / volume;
            let delay_seconds = params.slippage.unwrap_or(1.0) * size_ratio;
            now + (delay_seconds * NANOS_PER_SECOND) as i64
        }
    }
}
