//! Property tests for monetary round-trips and the accounting invariants.

use proptest::prelude::*;

use quantlab_core::domain::{Bar, FillIdGen, Money, Order, OrderSide};
use quantlab_core::params::HostParams;
use quantlab_core::sim::executor::{execute_order, ExecutionResult};
use quantlab_core::sim::{equity, SimState};

fn bar(close: i64, ts: i64) -> Bar {
    Bar {
        symbol: "SPY".into(),
        unix_ts_ns: ts,
        open: Money::from_units(close),
        high: Money::from_units(close),
        low: Money::from_units(close),
        close: Money::from_units(close),
        volume: 1_000_000.0,
    }
}

/// Drive random orders through executor + state, checking the ledger
/// invariants after every applied fill.
fn run_random_orders(orders: Vec<(bool, u16, i16)>) {
    let mut params = HostParams::with_capital(Money::from_units(1_000_000));
    params.allow_fractional_shares = true;

    let mut state = SimState::new(params.initial_capital);
    let mut ids = FillIdGen::from_seed(7);

    for (i, (is_buy, quantity, price_offset)) in orders.into_iter().enumerate() {
        let close = 100 + (price_offset as i64 % 50);
        state.prepare_next_bar(&bar(close.max(1), i as i64 + 1));

        let side = if is_buy { OrderSide::Buy } else { OrderSide::Sell };
        let order = Order::market("SPY", side, quantity as f64, state.current_timestamp_ns);

        if let ExecutionResult::Filled(exec) = execute_order(&order, &params, &state, &mut ids) {
            state.apply_execution(&exec);
        }

        // Invariant: margin ledger sums to margin_in_use.
        let ledger_total: Money = state.active_margin_for_fills.values().copied().sum();
        assert_eq!(
            ledger_total, state.margin_in_use,
            "margin ledger diverged from margin_in_use"
        );

        // Invariant: signed open quantities reconstruct the position.
        let long_open: f64 = state.active_buy_fills.values().sum();
        let short_open: f64 = state.active_sell_fills.values().sum();
        let net = long_open - short_open;
        let position = state.position_quantity("SPY");
        assert!(
            (net - position).abs() < 1e-6,
            "active fills ({net}) diverged from position ({position})"
        );

        // Invariant: cash never goes below -epsilon.
        assert!(state.cash.to_f64() >= -1e-4, "cash went negative");

        // Invariant: the equity identity holds.
        let close_money = state.close("SPY").unwrap();
        let expected = state.cash
            + state.margin_in_use
            + state
                .positions
                .get("SPY")
                .map(|p| (close_money - p.average_price) * p.quantity)
                .unwrap_or(Money::ZERO);
        assert_eq!(equity::equity(&state), expected);
    }
}

proptest! {
    #[test]
    fn money_parse_format_roundtrip(micros in -(10i64.pow(12) * 1_000_000)..(10i64.pow(12) * 1_000_000)) {
        let value = Money::from_micros(micros);
        let formatted = value.to_string();
        let parsed: Money = formatted.parse().unwrap();
        prop_assert_eq!(parsed, value);
    }

    #[test]
    fn money_add_sub_inverse(a in -1_000_000_000_000i64..1_000_000_000_000i64,
                             b in -1_000_000_000_000i64..1_000_000_000_000i64) {
        let (a, b) = (Money::from_micros(a), Money::from_micros(b));
        prop_assert_eq!(a + b - b, a);
    }

    #[test]
    fn ledger_invariants_hold_under_random_orders(
        orders in prop::collection::vec((any::<bool>(), 1u16..500, any::<i16>()), 1..40)
    ) {
        run_random_orders(orders);
    }

    #[test]
    fn matched_round_trip_returns_cash_exactly(
        pairs in prop::collection::vec((1u16..100, 50i64..150, 50i64..150), 1..10)
    ) {
        // A pure sequence of matched buy/sell pairs with zero commission and
        // zero slippage must return cash to start plus realized PnL, exact at
        // micro-unit granularity.
        let mut params = HostParams::with_capital(Money::from_units(10_000_000));
        params.allow_fractional_shares = true;

        let mut state = SimState::new(params.initial_capital);
        let mut ids = FillIdGen::from_seed(3);
        let mut expected_pnl = Money::ZERO;
        let mut ts = 0i64;

        for (quantity, buy_price, sell_price) in pairs {
            let quantity = quantity as f64;

            ts += 1;
            state.prepare_next_bar(&bar(buy_price, ts));
            let order = Order::market("SPY", OrderSide::Buy, quantity, ts);
            match execute_order(&order, &params, &state, &mut ids) {
                ExecutionResult::Filled(exec) => state.apply_execution(&exec),
                ExecutionResult::Rejected(reason) => panic!("buy rejected: {reason}"),
            }

            ts += 1;
            state.prepare_next_bar(&bar(sell_price, ts));
            let order = Order::market("SPY", OrderSide::Sell, quantity, ts);
            match execute_order(&order, &params, &state, &mut ids) {
                ExecutionResult::Filled(exec) => state.apply_execution(&exec),
                ExecutionResult::Rejected(reason) => panic!("sell rejected: {reason}"),
            }

            expected_pnl += (Money::from_units(sell_price) - Money::from_units(buy_price)) * quantity;
        }

        prop_assert_eq!(state.cash, params.initial_capital + expected_pnl);
        prop_assert!(state.positions.is_empty());
        prop_assert_eq!(state.margin_in_use, Money::ZERO);
    }

    #[test]
    fn peak_equity_and_drawdown_monotone(
        closes in prop::collection::vec(50i64..150, 2..30)
    ) {
        let mut params = HostParams::with_capital(Money::from_units(10_000));
        params.allow_fractional_shares = true;

        let mut state = SimState::new(params.initial_capital);
        let mut ids = FillIdGen::from_seed(11);

        // Open a position on the first bar so equity actually moves.
        state.prepare_next_bar(&bar(closes[0], 1));
        let order = Order::market("SPY", OrderSide::Buy, 10.0, 1);
        if let ExecutionResult::Filled(exec) = execute_order(&order, &params, &state, &mut ids) {
            state.apply_execution(&exec);
        }

        let mut last_peak = Money::ZERO;
        let mut last_dd = 0.0f64;
        for (i, close) in closes.iter().enumerate() {
            state.prepare_next_bar(&bar(*close, i as i64 + 1));
            state.record_bar_equity_snapshot(&params);

            prop_assert!(state.peak_equity >= last_peak, "peak equity decreased");
            prop_assert!(state.max_drawdown >= last_dd, "max drawdown decreased");
            prop_assert!((0.0..=1.0).contains(&state.max_drawdown));
            last_peak = state.peak_equity;
            last_dd = state.max_drawdown;
        }
    }
}
