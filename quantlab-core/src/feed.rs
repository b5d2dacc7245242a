//! Bar feed merge — chronologically interleaves per-symbol bar streams.

use crate::collections::MinHeap;
use crate::domain::Bar;

/// Merge per-symbol bar vectors (each already sorted by timestamp) into one
/// chronological stream.
///
/// Ties on timestamp resolve in stream order, so the merged sequence is fully
/// deterministic for a given input ordering. This ordering also defines
/// intra-bar processing order for symbols that share timestamps.
pub fn merge_bar_streams(streams: Vec<Vec<Bar>>) -> Vec<Bar> {
    let total: usize = streams.iter().map(Vec::len).sum();
    let mut merged = Vec::with_capacity(total);

    let mut cursors: Vec<std::vec::IntoIter<Bar>> =
        streams.into_iter().map(Vec::into_iter).collect();

    // One staged bar per stream; the heap orders streams by the staged bar's
    // timestamp, ties broken by stream index. Timestamps are unique within a
    // stream, so (ts, idx) keys are unique.
    let mut staged: Vec<Option<Bar>> = Vec::with_capacity(cursors.len());
    let mut heap: MinHeap<(i64, usize)> = MinHeap::new();

    for (idx, cursor) in cursors.iter_mut().enumerate() {
        let bar = cursor.next();
        if let Some(ref b) = bar {
            heap.push((b.unix_ts_ns, idx));
        }
        staged.push(bar);
    }

    while let Some((_, idx)) = heap.pop() {
        let bar = staged[idx].take().expect("staged bar for popped stream");
        merged.push(bar);
        if let Some(next) = cursors[idx].next() {
            heap.push((next.unix_ts_ns, idx));
            staged[idx] = Some(next);
        }
    }

    merged
}
