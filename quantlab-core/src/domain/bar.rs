//! Bar — the fundamental market data unit.

use super::money::Money;
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single symbol over one time interval.
///
/// `unix_ts_ns` is unique within a symbol's stream; different symbols may
/// share timestamps. The canonical fill price for a market order is the close
/// of the bar covering the scheduled fill timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub unix_ts_ns: i64,
    pub open: Money,
    pub high: Money,
    pub low: Money,
    pub close: Money,
    pub volume: f64,
}

impl Bar {
    /// Basic OHLCV sanity: high >= low, high bounds open/close, volume >= 0.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && !self.open.is_negative()
            && !self.close.is_negative()
            && self.volume >= 0.0
    }
}
