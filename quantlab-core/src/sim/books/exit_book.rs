//! Exit-order book — stop-losses and take-profits keyed by trigger price.
//!
//! Stop-losses sit in a min-heap (lowest stop on top) and take-profits in a
//! max-heap (highest target on top). Because the bar price does not traverse
//! trigger prices monotonically, a scan must visit every entry: each is
//! popped, evaluated, and reinserted when it does not fire. Entries whose
//! position or source fill is gone are dropped during the scan.

use std::cmp::Ordering;

use crate::collections::{MaxHeap, MinHeap};
use crate::domain::position::EPSILON;
use crate::domain::{ExitOrder, FillId, Money, Order, OrderSide};
use crate::sim::state::SimState;

#[derive(Debug, Clone)]
struct ExitEntry {
    price: Money,
    seq: u64,
    exit: ExitOrder,
}

impl PartialEq for ExitEntry {
    fn eq(&self, other: &Self) -> bool {
        self.price == other.price && self.seq == other.seq
    }
}

impl Eq for ExitEntry {}

impl PartialOrd for ExitEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ExitEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.price
            .cmp(&other.price)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Min-heap of stop-losses and max-heap of take-profits.
#[derive(Debug, Default)]
pub struct ExitOrderBook {
    stop_losses: MinHeap<ExitEntry>,
    take_profits: MaxHeap<ExitEntry>,
    next_seq: u64,
}

impl ExitOrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, exit: ExitOrder) {
        let entry = ExitEntry {
            price: exit.trigger().trigger_price,
            seq: self.next_seq,
            exit,
        };
        self.next_seq += 1;
        if entry.exit.is_stop_loss() {
            self.stop_losses.push(entry);
        } else {
            self.take_profits.push(entry);
        }
    }

    pub fn len(&self) -> usize {
        self.stop_losses.len() + self.take_profits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stop_losses.is_empty() && self.take_profits.is_empty()
    }

    /// Scan both heaps against the current bar closes. Triggered exits are
    /// returned as market orders carrying their source fill id; stop-losses
    /// are scanned before take-profits, so a same-bar conflict on one fill
    /// resolves in the stop-loss's favor (the take-profit then skips at
    /// execution as a stale exit).
    pub fn collect_triggered(&mut self, state: &SimState) -> Vec<Order> {
        let mut orders = Vec::new();

        let stops = self.stop_losses.drain();
        let (fired, kept) = scan(stops, state, ScanOrder::LowestFirst);
        self.stop_losses.extend(kept);
        orders.extend(fired);

        let targets = self.take_profits.drain();
        let (fired, kept) = scan(targets, state, ScanOrder::HighestFirst);
        self.take_profits.extend(kept);
        orders.extend(fired);

        orders
    }

    /// Shrink exit orders attached to `source` after FIFO consumption.
    /// Entries reduced to nothing are dropped; both heaps are rebuilt.
    pub fn reduce_by_fill(&mut self, source: FillId, quantity: f64) {
        let reduce = |entries: Vec<ExitEntry>| -> Vec<ExitEntry> {
            entries
                .into_iter()
                .filter_map(|mut entry| {
                    if entry.exit.trigger().source_fill_id == source {
                        entry.exit.trigger_mut().trigger_quantity -= quantity;
                        if entry.exit.is_exhausted() {
                            return None;
                        }
                    }
                    Some(entry)
                })
                .collect()
        };

        let kept = reduce(self.stop_losses.drain());
        self.stop_losses.extend(kept);
        let kept = reduce(self.take_profits.drain());
        self.take_profits.extend(kept);
    }
}

/// Which end of the price ordering a heap exposes first.
enum ScanOrder {
    LowestFirst,
    HighestFirst,
}

/// Partition entries into fired market orders and survivors. Entries without
/// a live position or source fill are silently dropped; entries whose symbol
/// has no price yet survive untouched.
fn scan(
    entries: Vec<ExitEntry>,
    state: &SimState,
    order: ScanOrder,
) -> (Vec<Order>, Vec<ExitEntry>) {
    // Evaluate in the owning heap's pop order so emission is deterministic.
    let mut entries = entries;
    entries.sort();
    if matches!(order, ScanOrder::HighestFirst) {
        entries.reverse();
    }

    let mut fired = Vec::new();
    let mut kept = Vec::new();
    for entry in entries {
        let trigger = entry.exit.trigger();
        if !state.positions.contains_key(&trigger.symbol)
            || !state.is_fill_active(trigger.source_fill_id)
            || trigger.trigger_quantity < EPSILON
        {
            continue;
        }
        let Some(close) = state.close(&trigger.symbol) else {
            kept.push(entry);
            continue;
        };
        if entry.exit.is_triggered_by(close) {
            fired.push(to_market_order(&entry.exit, state.current_timestamp_ns));
        } else {
            kept.push(entry);
        }
    }
    (fired, kept)
}

fn to_market_order(exit: &ExitOrder, now_ns: i64) -> Order {
    let trigger = exit.trigger();
    let side = if trigger.is_short_position {
        OrderSide::Buy
    } else {
        OrderSide::Sell
    };
    Order {
        is_exit_order: true,
        source_fill_id: Some(trigger.source_fill_id),
        ..Order::market(
            trigger.symbol.clone(),
            side,
            trigger.trigger_quantity,
            now_ns,
        )
    }
}
