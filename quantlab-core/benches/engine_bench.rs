//! Criterion benchmarks for simulation hot paths.
//!
//! Benchmarks:
//! 1. Full bar event loop with an active trading strategy
//! 2. Executor throughput (open/close alternation)
//! 3. Heap churn in the scheduled-order book
//! 4. Bar feed merge across symbol streams

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use quantlab_core::domain::{Bar, FillIdGen, Instruction, Money, Order, OrderSide};
use quantlab_core::feed::merge_bar_streams;
use quantlab_core::params::HostParams;
use quantlab_core::sim::books::ScheduledOrderBook;
use quantlab_core::sim::executor::{execute_order, ExecutionResult};
use quantlab_core::sim::{run_backtest, SimState};
use quantlab_core::strategy::ScriptedStrategy;

fn make_bars(symbol: &str, n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            Bar {
                symbol: symbol.to_string(),
                unix_ts_ns: (i as i64 + 1) * 1_000_000_000,
                open: Money::from_f64(close - 0.3),
                high: Money::from_f64(close + 1.5),
                low: Money::from_f64(close - 1.5),
                close: Money::from_f64(close),
                volume: 1_000_000.0,
            }
        })
        .collect()
}

fn bench_params() -> HostParams {
    let mut params = HostParams::with_capital(Money::from_units(1_000_000));
    params.allow_fractional_shares = true;
    params
}

fn bench_event_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_loop");
    for n in [252usize, 2_520] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let bars = make_bars("BENCH", n);
            let params = bench_params();
            b.iter(|| {
                // Buy on even bars, flatten on odd ones.
                let mut strategy = ScriptedStrategy::new();
                for i in (0..n).step_by(2) {
                    strategy = strategy.at(
                        i,
                        vec![Instruction::Order(Order::market(
                            "BENCH",
                            OrderSide::Buy,
                            10.0,
                            0,
                        ))],
                    );
                    strategy = strategy.at(
                        i + 1,
                        vec![Instruction::Order(Order::market(
                            "BENCH",
                            OrderSide::Sell,
                            10.0,
                            0,
                        ))],
                    );
                }
                black_box(run_backtest(&mut strategy, &bars, &params).unwrap())
            });
        });
    }
    group.finish();
}

fn bench_executor(c: &mut Criterion) {
    c.bench_function("executor_open_close", |b| {
        let params = bench_params();
        let bars = make_bars("BENCH", 2);
        b.iter(|| {
            let mut state = SimState::new(params.initial_capital);
            let mut ids = FillIdGen::from_seed(1);
            state.prepare_next_bar(&bars[0]);
            for _ in 0..100 {
                let buy = Order::market("BENCH", OrderSide::Buy, 10.0, 0);
                if let ExecutionResult::Filled(exec) =
                    execute_order(&buy, &params, &state, &mut ids)
                {
                    state.apply_execution(&exec);
                }
                let sell = Order::market("BENCH", OrderSide::Sell, 10.0, 0);
                if let ExecutionResult::Filled(exec) =
                    execute_order(&sell, &params, &state, &mut ids)
                {
                    state.apply_execution(&exec);
                }
            }
            black_box(state.fills.len())
        });
    });
}

fn bench_scheduled_book(c: &mut Criterion) {
    c.bench_function("scheduled_book_churn", |b| {
        b.iter(|| {
            let mut book = ScheduledOrderBook::new();
            for i in 0..1_000i64 {
                book.schedule(Order::market("BENCH", OrderSide::Buy, 1.0, i), i % 97);
            }
            let mut drained = 0usize;
            for t in 0..97i64 {
                drained += book.pop_due(t).len();
            }
            black_box(drained)
        });
    });
}

fn bench_feed_merge(c: &mut Criterion) {
    c.bench_function("feed_merge_8x1000", |b| {
        let streams: Vec<Vec<Bar>> = (0..8)
            .map(|i| make_bars(&format!("SYM{i}"), 1_000))
            .collect();
        b.iter(|| black_box(merge_bar_streams(streams.clone())));
    });
}

criterion_group!(
    benches,
    bench_event_loop,
    bench_executor,
    bench_scheduled_book,
    bench_feed_merge
);
criterion_main!(benches);
