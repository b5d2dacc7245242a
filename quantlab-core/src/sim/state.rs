//! Mutable simulation state: cash, margin, positions, fill ledgers, price
//! snapshot, and the equity curve.
//!
//! Two fill ledgers are kept deliberately: `fills` is the append-only log
//! that defines FIFO match order, and `active_{buy,sell}_fills` map fill id
//! to remaining open quantity for O(1) availability checks. `new_fills` and
//! `new_exit_orders` are per-bar deltas exposed to the strategy and wiped at
//! the end of each bar.

use std::collections::{BTreeMap, HashMap};

use crate::domain::position::EPSILON;
use crate::domain::{Bar, EquitySnapshot, ExitOrder, Fill, FillId, Money, Position};
use crate::params::HostParams;
use crate::sim::equity;
use crate::sim::executor::Execution;

/// OHLC snapshot of the most recent bar for one symbol.
#[derive(Debug, Clone, Copy)]
pub struct BarPrices {
    pub open: Money,
    pub high: Money,
    pub low: Money,
    pub close: Money,
}

/// State owned by exactly one backtest engine instance.
#[derive(Debug)]
pub struct SimState {
    pub cash: Money,
    pub margin_in_use: Money,
    pub current_timestamp_ns: i64,

    /// Net position per symbol. BTreeMap for deterministic iteration.
    pub positions: BTreeMap<String, Position>,
    pub current_bar_prices: HashMap<String, BarPrices>,
    pub current_volumes: HashMap<String, f64>,

    /// Append-only log; defines FIFO consumption order.
    pub fills: Vec<Fill>,
    /// Remaining open quantity per active fill, by side.
    pub active_buy_fills: HashMap<FillId, f64>,
    pub active_sell_fills: HashMap<FillId, f64>,
    /// Margin still reserved against each active fill.
    pub active_margin_for_fills: HashMap<FillId, Money>,

    /// Per-bar deltas, exposed to the strategy and cleared each bar.
    pub new_fills: Vec<Fill>,
    pub new_exit_orders: Vec<ExitOrder>,

    pub equity_curve: Vec<EquitySnapshot>,
    pub peak_equity: Money,
    pub max_drawdown: f64,
}

impl SimState {
    pub fn new(initial_capital: Money) -> Self {
        Self {
            cash: initial_capital,
            margin_in_use: Money::ZERO,
            current_timestamp_ns: 0,
            positions: BTreeMap::new(),
            current_bar_prices: HashMap::new(),
            current_volumes: HashMap::new(),
            fills: Vec::new(),
            active_buy_fills: HashMap::new(),
            active_sell_fills: HashMap::new(),
            active_margin_for_fills: HashMap::new(),
            new_fills: Vec::new(),
            new_exit_orders: Vec::new(),
            equity_curve: Vec::new(),
            peak_equity: initial_capital,
            max_drawdown: 0.0,
        }
    }

    /// Advance the price snapshot and clock to `bar`.
    pub fn prepare_next_bar(&mut self, bar: &Bar) {
        self.current_timestamp_ns = bar.unix_ts_ns;
        self.current_bar_prices.insert(
            bar.symbol.clone(),
            BarPrices {
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
            },
        );
        self.current_volumes.insert(bar.symbol.clone(), bar.volume);
    }

    /// Latest close for a symbol, if a bar has been seen.
    pub fn close(&self, symbol: &str) -> Option<Money> {
        self.current_bar_prices.get(symbol).map(|p| p.close)
    }

    /// Latest bar volume for a symbol.
    pub fn volume(&self, symbol: &str) -> Option<f64> {
        self.current_volumes.get(symbol).copied()
    }

    /// Net position quantity, zero when absent.
    pub fn position_quantity(&self, symbol: &str) -> f64 {
        self.positions.get(symbol).map_or(0.0, |p| p.quantity)
    }

    /// Whether `id` still has open quantity on either side.
    pub fn is_fill_active(&self, id: FillId) -> bool {
        self.active_buy_fills.contains_key(&id) || self.active_sell_fills.contains_key(&id)
    }

    /// Remaining open quantity of the opposite-side ledger for `side`'s fill.
    pub fn open_quantity(&self, id: FillId) -> f64 {
        self.active_buy_fills
            .get(&id)
            .or_else(|| self.active_sell_fills.get(&id))
            .copied()
            .unwrap_or(0.0)
    }

    /// Apply a successful execution. This is the only place simulation state
    /// mutates in response to a fill.
    pub fn apply_execution(&mut self, exec: &Execution) {
        self.cash += exec.cash_delta;
        debug_assert!(
            self.cash.to_f64() >= -EPSILON,
            "executor admitted a cash-negative fill"
        );

        // FIFO reductions: consume opposite-side active fills and release
        // their margin reservations.
        for closed in &exec.closing.closed {
            let opposite = if exec.fill.is_buy() {
                &mut self.active_sell_fills
            } else {
                &mut self.active_buy_fills
            };
            if let Some(open) = opposite.get_mut(&closed.fill_id) {
                *open -= closed.quantity;
                if *open < EPSILON {
                    opposite.remove(&closed.fill_id);
                    self.active_margin_for_fills.remove(&closed.fill_id);
                } else if let Some(margin) = self.active_margin_for_fills.get_mut(&closed.fill_id)
                {
                    *margin -= closed.margin_released;
                }
            }
        }
        self.margin_in_use = self.margin_in_use - exec.closing.margin_released + exec.margin_required;

        // The opening portion of the new fill becomes active.
        if exec.position_opening_quantity > EPSILON {
            let own_side = if exec.fill.is_buy() {
                &mut self.active_buy_fills
            } else {
                &mut self.active_sell_fills
            };
            own_side.insert(exec.fill.id, exec.position_opening_quantity);
            self.active_margin_for_fills
                .insert(exec.fill.id, exec.margin_required);
        }

        if exec.position.is_flat() {
            self.positions.remove(&exec.position.symbol);
        } else {
            self.positions
                .insert(exec.position.symbol.clone(), exec.position.clone());
        }

        self.fills.push(exec.fill.clone());
        self.new_fills.push(exec.fill.clone());
        self.new_exit_orders.extend(exec.exit_orders.iter().cloned());
    }

    /// Mark-to-market and append (or overwrite) this bar's equity snapshot.
    ///
    /// Bars that share a timestamp across symbols each record a snapshot; the
    /// trailing entry is overwritten so the curve keeps one entry per
    /// timestamp.
    pub fn record_bar_equity_snapshot(&mut self, params: &HostParams) {
        let equity_now = equity::equity(self);

        if equity_now > self.peak_equity {
            self.peak_equity = equity_now;
        }
        let dd = equity::drawdown(self.peak_equity, equity_now);
        if dd > self.max_drawdown {
            self.max_drawdown = dd;
        }

        let snapshot = EquitySnapshot::at(
            self.current_timestamp_ns,
            equity_now,
            equity::total_return(params, equity_now),
            self.max_drawdown,
        );

        match self.equity_curve.last_mut() {
            Some(last) if last.timestamp_ns == self.current_timestamp_ns => *last = snapshot,
            _ => self.equity_curve.push(snapshot),
        }
    }

    /// Wipe the per-bar delta sets.
    pub fn clear_previous_bar_state(&mut self) {
        self.new_fills.clear();
        self.new_exit_orders.clear();
    }
}
