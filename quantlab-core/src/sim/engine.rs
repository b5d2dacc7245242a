//! Backtest engine — the per-bar event loop.
//!
//! One engine instance drives one strategy over one merged bar sequence,
//! single-threaded and deterministic. Per bar:
//!
//! 1. advance the price snapshot and clock;
//! 2. gate on market hours;
//! 3. drain scheduled orders due at or before the bar (delayed slippage);
//! 4. match the limit book against the close, schedule crossings;
//! 5. scan the exit book, schedule triggered exits;
//! 6. call the strategy with a read-only snapshot;
//! 7. convert instructions to orders and schedule them;
//! 8. drain again — orders whose slippage puts them at or before this bar
//!    fill on this bar;
//! 9. reschedule volume-capped partial remainders (they wait for the next
//!    bar, so one order chain fills at most once per bar);
//! 10. record the equity snapshot and wipe the per-bar delta sets.
//!
//! Rejected executions are logged and skipped; state never mutates on a
//! rejection. A strategy callback failure is fatal to this backtest only.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Bar, EquitySnapshot, Fill, FillIdGen, Instruction, Money, Order, Position};
use crate::params::{ConfigError, HostParams};
use crate::sim::books::{ExitOrderBook, LimitOrderBook, ScheduledOrderBook};
use crate::sim::exchange::ExchangeCalendar;
use crate::sim::executor::{self, ExecutionResult};
use crate::sim::slippage;
use crate::sim::state::SimState;
use crate::strategy::{StateSnapshot, Strategy, StrategyError};

/// Everything a finished backtest hands back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub strategy: String,
    pub equity_curve: Vec<EquitySnapshot>,
    pub fills: Vec<Fill>,
    pub final_cash: Money,
    pub final_positions: Vec<Position>,
    /// Whatever the strategy returned from `on_end`.
    pub strategy_report: serde_json::Value,
}

/// Fatal backtest failures. Concurrent backtests are unaffected by another's
/// fatal error.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("strategy callback failed: {0}")]
    Strategy(#[from] StrategyError),

    #[error("no bar data for declared symbol '{symbol}'")]
    MissingData { symbol: String },
}

/// Run one backtest to completion.
///
/// `bars` is the chronologically merged union of the strategy's symbol
/// streams (see `feed::merge_bar_streams`).
pub fn run_backtest(
    strategy: &mut dyn Strategy,
    bars: &[Bar],
    params: &HostParams,
) -> Result<BacktestReport, EngineError> {
    params.validate()?;

    for declared in &params.symbols {
        if !bars.iter().any(|bar| bar.symbol == declared.symbol) {
            return Err(EngineError::MissingData {
                symbol: declared.symbol.clone(),
            });
        }
    }

    strategy.on_init(params)?;
    strategy.on_start()?;

    let calendar = ExchangeCalendar::from_params(params);
    let mut state = SimState::new(params.initial_capital);
    let mut ids = FillIdGen::from_seed(params.seed);
    let mut scheduled = ScheduledOrderBook::new();
    let mut limit_book = LimitOrderBook::new();
    let mut exit_book = ExitOrderBook::new();
    let mut pending_partials: Vec<Order> = Vec::new();

    for bar in bars {
        state.prepare_next_bar(bar);
        let now = state.current_timestamp_ns;

        if !calendar.is_within_market_hours(now) {
            continue;
        }

        // Orders whose slippage delay landed them in this bar.
        for order in scheduled.pop_due(now) {
            execute_and_apply(
                &order,
                params,
                &mut state,
                &mut ids,
                &mut exit_book,
                &mut pending_partials,
            );
        }

        // Limit crossings and exit triggers become due-now market work.
        for order in limit_book.collect_marketable(&state) {
            scheduled.schedule(order, now);
        }
        for order in exit_book.collect_triggered(&state) {
            scheduled.schedule(order, now);
        }

        let snapshot = StateSnapshot {
            cash: state.cash,
            current_timestamp_ns: state.current_timestamp_ns,
            positions: &state.positions,
            new_fills: &state.new_fills,
            new_exit_orders: &state.new_exit_orders,
            equity_curve: &state.equity_curve,
        };
        let instructions = strategy.on_bar(bar, &snapshot)?;

        for instruction in instructions {
            let order = match instruction {
                Instruction::Signal(signal) => executor::signal_to_order(&signal, params, &state),
                Instruction::Order(order) => order,
            };
            if order.is_limit() && order.limit_price.is_some() {
                limit_book.add(order);
            } else {
                let fill_at = slippage::scheduled_fill_time_ns(&order, params, &state);
                scheduled.schedule(order, fill_at);
            }
        }

        // Second drain: zero-slippage work submitted this bar fills this bar.
        for order in scheduled.pop_due(now) {
            execute_and_apply(
                &order,
                params,
                &mut state,
                &mut ids,
                &mut exit_book,
                &mut pending_partials,
            );
        }

        // Partial remainders join the book only now, after the final drain of
        // the bar, so the volume cap binds once per bar per order chain.
        for partial in pending_partials.drain(..) {
            let fill_at = slippage::scheduled_fill_time_ns(&partial, params, &state);
            scheduled.schedule(partial, fill_at);
        }

        state.record_bar_equity_snapshot(params);
        state.clear_previous_bar_state();
    }

    let strategy_report = strategy.on_end()?;

    Ok(BacktestReport {
        strategy: strategy.name().to_string(),
        equity_curve: state.equity_curve,
        fills: state.fills,
        final_cash: state.cash,
        final_positions: state.positions.into_values().collect(),
        strategy_report,
    })
}

fn execute_and_apply(
    order: &Order,
    params: &HostParams,
    state: &mut SimState,
    ids: &mut FillIdGen,
    exit_book: &mut ExitOrderBook,
    pending_partials: &mut Vec<Order>,
) {
    match executor::execute_order(order, params, state, ids) {
        ExecutionResult::Filled(exec) => {
            state.apply_execution(&exec);
            for closed in &exec.closing.closed {
                exit_book.reduce_by_fill(closed.fill_id, closed.quantity);
            }
            for exit in exec.exit_orders {
                exit_book.add(exit);
            }
            if let Some(partial) = exec.partial_order {
                pending_partials.push(partial);
            }
            tracing::trace!(
                symbol = %exec.fill.symbol,
                quantity = exec.fill.quantity,
                price = %exec.fill.price,
                "fill applied"
            );
        }
        ExecutionResult::Rejected(reason) => {
            tracing::debug!(symbol = %order.symbol, %reason, "order rejected");
        }
    }
}
