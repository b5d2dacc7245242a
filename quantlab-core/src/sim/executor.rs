//! Order executor — turns an order plus current state into an execution.
//!
//! The executor is pure with respect to simulation state: it inspects
//! `SimState` but never mutates it. A successful result carries everything
//! the engine needs to apply the fill (`SimState::apply_execution`); a
//! rejection carries a reason and guarantees no state change. The only thing
//! consumed on success is one id from the deterministic fill-id generator.

use crate::domain::position::EPSILON;
use crate::domain::{
    ExitOrder, ExitTrigger, Fill, FillIdGen, Money, Order, OrderSide, OrderType, Position, Signal,
};
use crate::params::{HostParams, PositionSizingMethod};
use crate::sim::equity;
use crate::sim::exchange;
use crate::sim::position_math::{self, ClosingInfo};
use crate::sim::state::SimState;

/// Default fraction of equity allocated per signal when the host does not
/// configure `position_size_value`.
const DEFAULT_POSITION_SIZE_VALUE: f64 = 0.1;

/// A fully computed fill, ready to be applied to state.
#[derive(Debug, Clone)]
pub struct Execution {
    pub cash_delta: Money,
    pub margin_required: Money,
    pub leverage: f64,
    pub position_opening_quantity: f64,
    pub fill: Fill,
    pub position: Position,
    pub exit_orders: Vec<ExitOrder>,
    pub closing: ClosingInfo,
    /// Remainder of a volume-capped order, rescheduled by the engine.
    pub partial_order: Option<Order>,
}

/// Outcome of `execute_order`. Rejections are recoverable: the engine logs
/// and continues.
#[derive(Debug)]
pub enum ExecutionResult {
    Filled(Execution),
    Rejected(String),
}

/// Cap the fillable quantity at `fill_max_pct_of_volume` of the current bar's
/// volume; the remainder becomes a partial order.
fn fillable_and_remaining(order: &Order, params: &HostParams, volume: f64) -> (f64, f64) {
    if let Some(pct) = params.fill_max_pct_of_volume {
        let max_fill = volume * pct;
        if order.quantity > max_fill {
            return (max_fill, order.quantity - max_fill);
        }
    }
    (order.quantity, 0.0)
}

/// Fill price: market orders fill at the bar close; a limit buy never pays
/// above its limit, a limit sell never receives below it.
fn fill_price(order: &Order, close: Money) -> Money {
    match (order.order_type, order.limit_price) {
        (OrderType::Limit, Some(limit)) => {
            if order.side.is_buy() {
                limit.min(close)
            } else {
                limit.max(close)
            }
        }
        _ => close,
    }
}

fn margin_required(
    params: &HostParams,
    fill_price: Money,
    position_opening_quantity: f64,
    leverage: f64,
) -> Money {
    if position_opening_quantity <= EPSILON {
        return Money::ZERO;
    }
    let opening_value = fill_price * position_opening_quantity;
    let leveraged = opening_value / leverage;
    let floor = opening_value * params.initial_margin_pct.unwrap_or(0.0);
    leveraged.max(floor)
}

fn create_exit_orders(
    order: &Order,
    fill: &Fill,
    position_opening_quantity: f64,
    new_quantity: f64,
    now_ns: i64,
) -> Vec<ExitOrder> {
    if position_opening_quantity <= EPSILON {
        return Vec::new();
    }
    let is_short_position = order.side.is_sell() && new_quantity <= 0.0;
    let trigger = |price: Money| ExitTrigger {
        symbol: order.symbol.clone(),
        trigger_quantity: position_opening_quantity,
        trigger_price: price,
        reference_fill_price: fill.price,
        created_at_ns: now_ns,
        source_fill_id: fill.id,
        is_short_position,
    };

    let mut exits = Vec::new();
    if let Some(stop) = order.stop_loss_price {
        exits.push(ExitOrder::StopLoss(trigger(stop)));
    }
    if let Some(target) = order.take_profit_price {
        exits.push(ExitOrder::TakeProfit(trigger(target)));
    }
    exits
}

/// Execute one order against the current state.
pub fn execute_order(
    order: &Order,
    params: &HostParams,
    state: &SimState,
    ids: &mut FillIdGen,
) -> ExecutionResult {
    if order.quantity <= 0.0 {
        return ExecutionResult::Rejected("order quantity must be positive".into());
    }
    let Some(close) = state.close(&order.symbol) else {
        return ExecutionResult::Rejected(format!("no price data for symbol: {}", order.symbol));
    };
    let Some(volume) = state.volume(&order.symbol) else {
        return ExecutionResult::Rejected(format!("no volume data for symbol: {}", order.symbol));
    };

    // The dominant silent-skip path: a take-profit firing after its stop-loss
    // already consumed the source fill (or vice versa).
    if order.is_exit_order {
        if let Some(source) = order.source_fill_id {
            if !state.is_fill_active(source) {
                return ExecutionResult::Rejected("exit order source fill no longer active".into());
            }
        }
    }

    let (mut fillable_quantity, remaining_quantity) = fillable_and_remaining(order, params, volume);
    if !params.allow_fractional_shares {
        fillable_quantity = fillable_quantity.floor();
        if fillable_quantity <= 0.0 {
            return ExecutionResult::Rejected("order quantity too small to execute".into());
        }
    }

    let price = fill_price(order, close);
    let current_quantity = state.position_quantity(&order.symbol);
    let new_quantity = match order.side {
        OrderSide::Buy => current_quantity + fillable_quantity,
        OrderSide::Sell => current_quantity - fillable_quantity,
    };
    let opening_quantity = position_math::position_opening_quantity(
        order.side,
        fillable_quantity,
        current_quantity,
        new_quantity,
    );

    let commission = exchange::commission_for(fillable_quantity, price, params);

    let leverage = order.leverage.unwrap_or(1.0);
    if leverage < 1.0 || leverage > params.max_leverage_or_default() {
        return ExecutionResult::Rejected(format!(
            "leverage {leverage} outside [1, {}]",
            params.max_leverage_or_default()
        ));
    }

    if !params.allow_short_selling && new_quantity < -EPSILON {
        return ExecutionResult::Rejected("short selling not allowed".into());
    }

    let required_margin = margin_required(params, price, opening_quantity, leverage);
    if opening_quantity > EPSILON {
        if required_margin + commission > equity::available_margin(state) {
            return ExecutionResult::Rejected("insufficient margin for position".into());
        }
    } else if order.side.is_buy() {
        let fill_value = price * fillable_quantity;
        if fill_value + commission > state.cash {
            return ExecutionResult::Rejected("insufficient cash to close position".into());
        }
    }

    let closing = position_math::fifo_closing_info(
        state,
        &order.symbol,
        order.side,
        fillable_quantity - opening_quantity,
        price,
    );

    // Opening locks margin and pays commission; closing returns margin plus
    // realized PnL. One formula covers both sides.
    let cash_delta = closing.margin_released + closing.realized_pnl - required_margin - commission;
    if (state.cash + cash_delta).to_f64() < -EPSILON {
        return ExecutionResult::Rejected("insufficient funds for trade and commission".into());
    }

    let fill = Fill {
        id: ids.next_id(),
        symbol: order.symbol.clone(),
        side: order.side,
        quantity: fillable_quantity,
        price,
        created_at_ns: state.current_timestamp_ns,
        leverage,
        margin_used: required_margin,
    };

    let exit_orders = create_exit_orders(
        order,
        &fill,
        opening_quantity,
        new_quantity,
        state.current_timestamp_ns,
    );

    let position = position_math::apply_fill_to_position(
        state,
        &order.symbol,
        order.side,
        fillable_quantity,
        price,
    );

    let partial_order = (remaining_quantity > 0.0).then(|| Order {
        quantity: remaining_quantity,
        created_at_ns: state.current_timestamp_ns,
        ..order.clone()
    });

    ExecutionResult::Filled(Execution {
        cash_delta,
        margin_required: required_margin,
        leverage,
        position_opening_quantity: opening_quantity,
        fill,
        position,
        exit_orders,
        closing,
        partial_order,
    })
}

/// Convert a strategy signal into a sized market order using the host's
/// sizing, stop-loss, and take-profit policies.
pub fn signal_to_order(signal: &Signal, params: &HostParams, state: &SimState) -> Order {
    let close = state.close(&signal.symbol);
    let quantity = signal_position_size(signal, params, state);

    let stop_loss_price = close.filter(|_| params.use_stop_loss).and_then(|price| {
        params.stop_loss_pct.map(|pct| match signal.side {
            OrderSide::Buy => price * (1.0 - pct),
            OrderSide::Sell => price * (1.0 + pct),
        })
    });
    let take_profit_price = close.filter(|_| params.use_take_profit).and_then(|price| {
        params.take_profit_pct.map(|pct| match signal.side {
            OrderSide::Buy => price * (1.0 + pct),
            OrderSide::Sell => price * (1.0 - pct),
        })
    });

    Order {
        stop_loss_price,
        take_profit_price,
        ..Order::market(
            signal.symbol.clone(),
            signal.side,
            quantity,
            state.current_timestamp_ns,
        )
    }
}

fn signal_position_size(signal: &Signal, params: &HostParams, state: &SimState) -> f64 {
    let Some(price) = state.close(&signal.symbol) else {
        return 0.0;
    };
    if price <= Money::ZERO {
        return 0.0;
    }
    let equity_now = equity::equity(state);
    let size_value = params
        .position_size_value
        .unwrap_or(DEFAULT_POSITION_SIZE_VALUE);

    let mut quantity = match params
        .position_sizing_method
        .unwrap_or(PositionSizingMethod::FixedPercentage)
    {
        PositionSizingMethod::FixedPercentage => (equity_now * size_value).to_f64() / price.to_f64(),
        PositionSizingMethod::FixedDollar => size_value / price.to_f64(),
        PositionSizingMethod::EqualWeight => {
            let symbol_count = params.symbols.len();
            if symbol_count == 0 {
                return 0.0;
            }
            (equity_now / symbol_count as i64).to_f64() / price.to_f64()
        }
    };

    if let Some(cap) = params.max_position_size {
        quantity = quantity.min(cap);
    }
    quantity
}
