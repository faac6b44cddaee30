//! K-way merge over recency-tagged sorted sources.
//!
//! Both read paths that reconcile overlapping versions use this module: a
//! range scan merges the memtable with every live SSTable, and compaction
//! merges all files of one tier into their successor.
//!
//! Each source is a key-ascending iterator of `(key, value)` pairs tagged
//! with an integer **order** where *smaller means newer*. A binary min-heap
//! holds the head of each source, ordered by `(key ascending, order
//! ascending)`:
//!
//! ```text
//! Sources:  [a, d, g, ...]   [b, d, h, ...]   [c, d, i, ...]
//!                │                │                │
//! Heap:     [    a,               b,               c    ]
//!                │ pop minimum (key, order)
//! Output:        a
//! ```
//!
//! When several sources hold the same key, the entry with the smallest
//! order is popped first and wins; the rest are drained and their sources
//! advanced, so the output is strictly key-ascending with unique keys and
//! each key carries its newest value. Tombstones pass through untouched —
//! compaction must retain them, and the scan path filters them afterwards.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A sorted input stream for [`MergeIterator`].
pub struct MergeSource<'a> {
    iter: Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a>,
    order: usize,
}

impl<'a> MergeSource<'a> {
    /// Wraps a key-ascending iterator with its recency order
    /// (smaller = newer).
    pub fn new(iter: Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a>, order: usize) -> Self {
        Self { iter, order }
    }
}

/// One buffered record in the merge heap.
#[derive(Debug)]
struct HeapEntry {
    key: Vec<u8>,
    value: Vec<u8>,
    source: usize,
    order: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    // `BinaryHeap` is a max-heap; reverse the key comparison so the
    // smallest key pops first, and on equal keys let the smallest order
    // (the newest record) win the pop.
    fn cmp(&self, other: &Self) -> Ordering {
        match self.key.cmp(&other.key) {
            Ordering::Equal => other.order.cmp(&self.order),
            ord => ord.reverse(),
        }
    }
}

/// Merges N recency-tagged sorted streams into one deduplicated,
/// key-ascending stream where every key carries its newest value.
pub struct MergeIterator<'a> {
    sources: Vec<MergeSource<'a>>,
    heap: BinaryHeap<HeapEntry>,
}

impl<'a> MergeIterator<'a> {
    /// Seeds the heap with the head of each source.
    pub fn new(mut sources: Vec<MergeSource<'a>>) -> Self {
        let mut heap = BinaryHeap::with_capacity(sources.len());
        for (idx, source) in sources.iter_mut().enumerate() {
            if let Some((key, value)) = source.iter.next() {
                heap.push(HeapEntry {
                    key,
                    value,
                    source: idx,
                    order: source.order,
                });
            }
        }
        Self { sources, heap }
    }

    /// Refills the heap from the given source, if it has more records.
    fn advance(&mut self, idx: usize) {
        if let Some((key, value)) = self.sources[idx].iter.next() {
            let order = self.sources[idx].order;
            self.heap.push(HeapEntry {
                key,
                value,
                source: idx,
                order,
            });
        }
    }
}

impl Iterator for MergeIterator<'_> {
    type Item = (Vec<u8>, Vec<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        // The top entry is the smallest key, and among equal keys the
        // smallest order, so it is the winner for its key.
        let top = self.heap.pop()?;

        // Drain the losers for this key, keeping their sources moving.
        while self.heap.peek().is_some_and(|entry| entry.key == top.key) {
            if let Some(dup) = self.heap.pop() {
                self.advance(dup.source);
            }
        }

        self.advance(top.source);
        Some((top.key, top.value))
    }
}
