//! Limit-order book — per-symbol resting orders keyed by limit price.
//!
//! Buy limits rest in a max-heap (highest bid on top), sell limits in a
//! min-heap (lowest ask on top). Matching compares the heap top against the
//! bar close, so a scan per symbol is O(matches · log n): once the top no
//! longer crosses, nothing below it can.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::collections::{MaxHeap, MinHeap};
use crate::domain::{Money, Order};
use crate::sim::state::SimState;

#[derive(Debug, Clone)]
struct LimitEntry {
    price: Money,
    seq: u64,
    order: Order,
}

impl PartialEq for LimitEntry {
    fn eq(&self, other: &Self) -> bool {
        self.price == other.price && self.seq == other.seq
    }
}

impl Eq for LimitEntry {}

impl PartialOrd for LimitEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LimitEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.price
            .cmp(&other.price)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Per-symbol buy and sell limit heaps. Symbols map through a `BTreeMap` so
/// the per-bar matching order is deterministic.
#[derive(Debug, Default)]
pub struct LimitOrderBook {
    buy_limits: BTreeMap<String, MaxHeap<LimitEntry>>,
    sell_limits: BTreeMap<String, MinHeap<LimitEntry>>,
    next_seq: u64,
}

impl LimitOrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rest a limit order. Orders without a limit price are ignored with a
    /// warning; they should have been routed to the scheduled book.
    pub fn add(&mut self, order: Order) {
        let Some(price) = order.limit_price else {
            tracing::warn!(symbol = %order.symbol, "limit order without limit price dropped");
            return;
        };
        let entry = LimitEntry {
            price,
            seq: self.next_seq,
            order,
        };
        self.next_seq += 1;
        if entry.order.side.is_buy() {
            self.buy_limits
                .entry(entry.order.symbol.clone())
                .or_default()
                .push(entry);
        } else {
            self.sell_limits
                .entry(entry.order.symbol.clone())
                .or_default()
                .push(entry);
        }
    }

    /// Pop every order whose limit crosses the current close of its symbol.
    ///
    /// A buy limit `L` is marketable when `L >= close`; a sell limit when
    /// `L <= close`. Symbols without a known close are skipped.
    pub fn collect_marketable(&mut self, state: &SimState) -> Vec<Order> {
        let mut orders = Vec::new();

        for (symbol, heap) in self.buy_limits.iter_mut() {
            let Some(close) = state.close(symbol) else {
                continue;
            };
            while heap.peek().is_some_and(|top| top.price >= close) {
                orders.push(heap.pop().expect("peeked entry").order);
            }
        }

        for (symbol, heap) in self.sell_limits.iter_mut() {
            let Some(close) = state.close(symbol) else {
                continue;
            };
            while heap.peek().is_some_and(|top| top.price <= close) {
                orders.push(heap.pop().expect("peeked entry").order);
            }
        }

        orders
    }

    /// Cancel every resting order for `symbol`, both sides.
    pub fn cancel_symbol(&mut self, symbol: &str) {
        self.buy_limits.remove(symbol);
        self.sell_limits.remove(symbol);
    }

    pub fn len(&self) -> usize {
        self.buy_limits.values().map(MaxHeap::len).sum::<usize>()
            + self.sell_limits.values().map(MinHeap::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
