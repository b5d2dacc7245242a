//! Orders, signals, and the strategy instruction sum type.

use super::fill::FillId;
use super::money::Money;
use serde::{Deserialize, Serialize};

/// Direction of an order or signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn is_buy(self) -> bool {
        self == OrderSide::Buy
    }

    pub fn is_sell(self) -> bool {
        self == OrderSide::Sell
    }

    /// The side that closes a position opened on this side.
    pub fn opposite(self) -> OrderSide {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

/// What kind of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Fill at the close of the bar covering the scheduled fill timestamp.
    Market,
    /// Rest in the limit book until the bar close crosses the limit price.
    Limit,
}

/// A fully specified order.
///
/// A `Sell` with no long position opens or extends a short. Exit orders carry
/// the id of the fill they close; a stale `source_fill_id` (already consumed
/// by FIFO reduction) makes the order a silent no-op at execution time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: f64,
    pub order_type: OrderType,
    pub created_at_ns: i64,
    pub limit_price: Option<Money>,
    pub stop_loss_price: Option<Money>,
    pub take_profit_price: Option<Money>,
    pub leverage: Option<f64>,
    pub is_exit_order: bool,
    pub source_fill_id: Option<FillId>,
}

impl Order {
    /// A plain market order with no exit prices attached.
    pub fn market(symbol: impl Into<String>, side: OrderSide, quantity: f64, created_at_ns: i64) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
            order_type: OrderType::Market,
            created_at_ns,
            limit_price: None,
            stop_loss_price: None,
            take_profit_price: None,
            leverage: None,
            is_exit_order: false,
            source_fill_id: None,
        }
    }

    /// A limit order resting at `limit_price`.
    pub fn limit(
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: f64,
        limit_price: Money,
        created_at_ns: i64,
    ) -> Self {
        Self {
            order_type: OrderType::Limit,
            limit_price: Some(limit_price),
            ..Self::market(symbol, side, quantity, created_at_ns)
        }
    }

    pub fn is_limit(&self) -> bool {
        self.order_type == OrderType::Limit
    }
}

/// A lightweight instruction: the host sizes it and derives exit prices from
/// its configured policies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub side: OrderSide,
}

/// What a strategy may emit from `on_bar`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    Signal(Signal),
    Order(Order),
}
