//! Position arithmetic and FIFO fill consumption.
//!
//! Average-price rules on a fill:
//! 1. extending a same-sign position -> quantity-weighted mean of old and new;
//! 2. flipping sign -> average resets to the fill price for the residual;
//! 3. reducing without flipping -> average unchanged.
//!
//! FIFO reduction walks the append-only fill log in order, consuming
//! opposite-side fills that still have open quantity, and releases each
//! consumed fill's margin reservation proportionally.

use crate::domain::position::EPSILON;
use crate::domain::{FillId, Money, OrderSide, Position};
use crate::sim::state::SimState;

/// One opposite-side fill consumed by a reduction.
#[derive(Debug, Clone)]
pub struct ClosedFill {
    pub fill_id: FillId,
    pub quantity: f64,
    pub margin_released: Money,
}

/// Outcome of a FIFO walk: which fills were consumed, total margin released,
/// and the realized PnL of the closed quantity.
#[derive(Debug, Clone)]
pub struct ClosingInfo {
    pub closed: Vec<ClosedFill>,
    pub margin_released: Money,
    pub realized_pnl: Money,
}

impl ClosingInfo {
    pub fn empty() -> Self {
        Self {
            closed: Vec::new(),
            margin_released: Money::ZERO,
            realized_pnl: Money::ZERO,
        }
    }
}

/// The portion of a fill that increases `|position.quantity|`.
pub fn position_opening_quantity(
    side: OrderSide,
    fillable_quantity: f64,
    current_quantity: f64,
    new_quantity: f64,
) -> f64 {
    match side {
        OrderSide::Buy => {
            if current_quantity >= 0.0 {
                fillable_quantity
            } else {
                new_quantity.max(0.0)
            }
        }
        OrderSide::Sell => {
            if current_quantity <= 0.0 {
                fillable_quantity
            } else {
                (-new_quantity).max(0.0)
            }
        }
    }
}

/// Post-fill position for `symbol` given the pre-fill position in `state`.
pub fn apply_fill_to_position(
    state: &SimState,
    symbol: &str,
    side: OrderSide,
    fillable_quantity: f64,
    fill_price: Money,
) -> Position {
    let mut position = state
        .positions
        .get(symbol)
        .cloned()
        .unwrap_or_else(|| Position::flat(symbol));

    let old_quantity = position.quantity;
    match side {
        OrderSide::Buy => {
            let new_quantity = old_quantity + fillable_quantity;
            if old_quantity < 0.0 && new_quantity > 0.0 {
                position.average_price = fill_price;
            } else if old_quantity >= 0.0 {
                position.average_price = weighted_average(
                    position.average_price,
                    old_quantity,
                    fill_price,
                    fillable_quantity,
                    new_quantity,
                );
            }
            position.quantity = new_quantity;
        }
        OrderSide::Sell => {
            let new_quantity = old_quantity - fillable_quantity;
            if old_quantity > 0.0 && new_quantity < 0.0 {
                position.average_price = fill_price;
            } else if old_quantity <= 0.0 {
                position.average_price = weighted_average(
                    position.average_price,
                    old_quantity.abs(),
                    fill_price,
                    fillable_quantity,
                    new_quantity.abs(),
                );
            }
            position.quantity = new_quantity;
        }
    }

    if position.quantity.abs() < EPSILON {
        position.quantity = 0.0;
        position.average_price = Money::ZERO;
    }
    position
}

fn weighted_average(
    old_price: Money,
    old_quantity: f64,
    fill_price: Money,
    fill_quantity: f64,
    total_quantity: f64,
) -> Money {
    if total_quantity.abs() < EPSILON {
        return Money::ZERO;
    }
    (old_price * old_quantity + fill_price * fill_quantity) / total_quantity
}

/// Walk the fill log in order, consuming up to `closing_quantity` of
/// opposite-side open quantity for `symbol`.
///
/// `side` is the side of the incoming fill: a sell consumes active buy fills,
/// a buy consumes active sell fills. Realized PnL is always
/// `(sell price - buy price) * closed quantity`. A fill consumed to within
/// `EPSILON` of empty releases its entire remaining margin so reservations
/// cannot leak through repeated proportional rounding.
pub fn fifo_closing_info(
    state: &SimState,
    symbol: &str,
    side: OrderSide,
    closing_quantity: f64,
    fill_price: Money,
) -> ClosingInfo {
    let mut info = ClosingInfo::empty();
    if closing_quantity < EPSILON {
        return info;
    }

    let active = match side {
        OrderSide::Buy => &state.active_sell_fills,
        OrderSide::Sell => &state.active_buy_fills,
    };

    let mut remaining = closing_quantity;
    for existing in &state.fills {
        if remaining < EPSILON {
            break;
        }
        if existing.symbol != symbol || existing.side == side {
            continue;
        }
        let Some(&available) = active.get(&existing.id) else {
            continue;
        };

        let to_close = available.min(remaining);
        let reserved = state
            .active_margin_for_fills
            .get(&existing.id)
            .copied()
            .unwrap_or(Money::ZERO);
        let released = if to_close >= available - EPSILON {
            reserved
        } else {
            reserved * (to_close / available)
        };

        let pnl = match side {
            // Buy closing a short: entry was the sell.
            OrderSide::Buy => (existing.price - fill_price) * to_close,
            // Sell closing a long: entry was the buy.
            OrderSide::Sell => (fill_price - existing.price) * to_close,
        };

        info.closed.push(ClosedFill {
            fill_id: existing.id,
            quantity: to_close,
            margin_released: released,
        });
        info.margin_released += released;
        info.realized_pnl += pnl;
        remaining -= to_close;
    }

    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bar, Fill, FillIdGen};

    fn state_with_price(close: i64) -> SimState {
        let mut state = SimState::new(Money::from_units(10_000));
        state.prepare_next_bar(&Bar {
            symbol: "SPY".into(),
            unix_ts_ns: 1,
            open: Money::from_units(close),
            high: Money::from_units(close),
            low: Money::from_units(close),
            close: Money::from_units(close),
            volume: 10_000.0,
        });
        state
    }

    fn seed_fill(
        state: &mut SimState,
        ids: &mut FillIdGen,
        side: OrderSide,
        quantity: f64,
        price: i64,
        margin: i64,
    ) -> FillId {
        let fill = Fill {
            id: ids.next_id(),
            symbol: "SPY".into(),
            side,
            quantity,
            price: Money::from_units(price),
            created_at_ns: state.current_timestamp_ns,
            leverage: 1.0,
            margin_used: Money::from_units(margin),
        };
        let id = fill.id;
        match side {
            OrderSide::Buy => state.active_buy_fills.insert(id, quantity),
            OrderSide::Sell => state.active_sell_fills.insert(id, quantity),
        };
        state.active_margin_for_fills.insert(id, Money::from_units(margin));
        state.margin_in_use += Money::from_units(margin);
        state.fills.push(fill);
        id
    }

    #[test]
    fn opening_quantity_buy_extends_long() {
        assert_eq!(position_opening_quantity(OrderSide::Buy, 5.0, 3.0, 8.0), 5.0);
    }

    #[test]
    fn opening_quantity_buy_flipping_short() {
        // -3 short, buy 5 -> +2: only the portion past flat opens.
        assert_eq!(position_opening_quantity(OrderSide::Buy, 5.0, -3.0, 2.0), 2.0);
    }

    #[test]
    fn opening_quantity_pure_close_is_zero() {
        assert_eq!(position_opening_quantity(OrderSide::Sell, 3.0, 10.0, 7.0), 0.0);
        assert_eq!(position_opening_quantity(OrderSide::Buy, 3.0, -10.0, -7.0), 0.0);
    }

    #[test]
    fn opening_quantity_sell_flipping_long() {
        // +3 long, sell 5 -> -2: 2 opens short.
        assert_eq!(position_opening_quantity(OrderSide::Sell, 5.0, 3.0, -2.0), 2.0);
    }

    #[test]
    fn average_price_weighted_on_extension() {
        let mut state = state_with_price(110);
        state.positions.insert(
            "SPY".into(),
            Position {
                symbol: "SPY".into(),
                quantity: 10.0,
                average_price: Money::from_units(100),
            },
        );
        let pos =
            apply_fill_to_position(&state, "SPY", OrderSide::Buy, 10.0, Money::from_units(110));
        assert_eq!(pos.quantity, 20.0);
        assert_eq!(pos.average_price, Money::from_units(105));
    }

    #[test]
    fn average_price_unchanged_on_reduction() {
        let mut state = state_with_price(110);
        state.positions.insert(
            "SPY".into(),
            Position {
                symbol: "SPY".into(),
                quantity: 10.0,
                average_price: Money::from_units(100),
            },
        );
        let pos =
            apply_fill_to_position(&state, "SPY", OrderSide::Sell, 4.0, Money::from_units(110));
        assert_eq!(pos.quantity, 6.0);
        assert_eq!(pos.average_price, Money::from_units(100));
    }

    #[test]
    fn average_price_resets_on_flip() {
        let mut state = state_with_price(110);
        state.positions.insert(
            "SPY".into(),
            Position {
                symbol: "SPY".into(),
                quantity: 3.0,
                average_price: Money::from_units(100),
            },
        );
        let pos =
            apply_fill_to_position(&state, "SPY", OrderSide::Sell, 5.0, Money::from_units(110));
        assert_eq!(pos.quantity, -2.0);
        assert_eq!(pos.average_price, Money::from_units(110));
    }

    #[test]
    fn flat_position_is_normalized() {
        let mut state = state_with_price(110);
        state.positions.insert(
            "SPY".into(),
            Position {
                symbol: "SPY".into(),
                quantity: 5.0,
                average_price: Money::from_units(100),
            },
        );
        let pos =
            apply_fill_to_position(&state, "SPY", OrderSide::Sell, 5.0, Money::from_units(110));
        assert_eq!(pos.quantity, 0.0);
        assert_eq!(pos.average_price, Money::ZERO);
    }

    #[test]
    fn fifo_consumes_in_insertion_order() {
        let mut state = state_with_price(110);
        let mut ids = FillIdGen::from_seed(1);
        let first = seed_fill(&mut state, &mut ids, OrderSide::Buy, 5.0, 100, 500);
        let second = seed_fill(&mut state, &mut ids, OrderSide::Buy, 5.0, 104, 520);

        let info = fifo_closing_info(&state, "SPY", OrderSide::Sell, 7.0, Money::from_units(110));
        assert_eq!(info.closed.len(), 2);
        assert_eq!(info.closed[0].fill_id, first);
        assert_eq!(info.closed[0].quantity, 5.0);
        assert_eq!(info.closed[1].fill_id, second);
        assert_eq!(info.closed[1].quantity, 2.0);
        // PnL: (110-100)*5 + (110-104)*2 = 62
        assert_eq!(info.realized_pnl, Money::from_units(62));
        // Margin: all of 500 + 2/5 of 520 = 708
        assert_eq!(info.margin_released, Money::from_units(708));
    }

    #[test]
    fn fifo_full_consumption_releases_entire_reservation() {
        let mut state = state_with_price(90);
        let mut ids = FillIdGen::from_seed(2);
        seed_fill(&mut state, &mut ids, OrderSide::Sell, 3.0, 100, 300);

        let info = fifo_closing_info(&state, "SPY", OrderSide::Buy, 3.0, Money::from_units(90));
        assert_eq!(info.margin_released, Money::from_units(300));
        // Short entry at 100 closed at 90: (100-90)*3 = 30 profit.
        assert_eq!(info.realized_pnl, Money::from_units(30));
    }

    #[test]
    fn fifo_ignores_other_symbols_and_same_side() {
        let mut state = state_with_price(110);
        let mut ids = FillIdGen::from_seed(3);
        seed_fill(&mut state, &mut ids, OrderSide::Sell, 5.0, 100, 500);

        // A sell closes *buy* fills; the seeded sell fill must not match.
        let info = fifo_closing_info(&state, "SPY", OrderSide::Sell, 5.0, Money::from_units(110));
        assert!(info.closed.is_empty());
        assert_eq!(info.margin_released, Money::ZERO);
    }
}
