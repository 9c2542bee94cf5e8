//! Priority queue for BPE merge candidates.
//!
//! Candidates are ordered by aggregate count, highest first. Equal counts are
//! broken by `order`, the position at which the pair was first entered into
//! the frequency table: the earlier pair wins. This tie-break is part of the
//! artifact contract, since two learners that disagree on it produce
//! different model files from the same corpus.

use crate::core::merges::Pair;
use ahash::AHashMap;
use dary_heap::OctonaryHeap;
use std::cmp::{Ordering, Reverse};

/// A merge candidate during BPE training.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCandidate {
    /// The pair of symbol IDs to merge
    pub pair: Pair,
    /// The frequency/count of this pair
    pub count: u64,
    /// First-encountered position of the pair in the frequency table
    pub order: u64,
}

impl MergeCandidate {
    /// Create a new merge candidate.
    pub fn new(pair: Pair, count: u64, order: u64) -> Self {
        Self { pair, count, order }
    }
}

impl Ord for MergeCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap: higher count first, then lower order first.
        self.count
            .cmp(&other.count)
            .then_with(|| Reverse(self.order).cmp(&Reverse(other.order)))
    }
}

impl PartialOrd for MergeCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority queue for BPE merge operations.
///
/// Uses an 8-ary heap for better cache locality than a binary heap. Counts
/// are updated lazily: a new entry is pushed and older entries for the same
/// pair are discarded when they surface.
pub struct PairPriorityQueue {
    /// The heap storing merge candidates
    heap: OctonaryHeap<MergeCandidate>,
    /// Track current counts to detect stale entries
    current_counts: AHashMap<Pair, u64>,
}

impl PairPriorityQueue {
    /// Create a new priority queue with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: OctonaryHeap::with_capacity(capacity),
            current_counts: AHashMap::with_capacity(capacity),
        }
    }

    /// Create a new empty priority queue.
    pub fn new() -> Self {
        Self {
            heap: OctonaryHeap::new(),
            current_counts: AHashMap::new(),
        }
    }

    /// Push a merge candidate onto the queue.
    pub fn push(&mut self, candidate: MergeCandidate) {
        self.current_counts.insert(candidate.pair, candidate.count);
        self.heap.push(candidate);
    }

    /// Pop the highest priority merge candidate.
    ///
    /// Returns None if the queue is empty or only contains stale entries.
    pub fn pop(&mut self) -> Option<MergeCandidate> {
        while let Some(candidate) = self.heap.pop() {
            if let Some(&current) = self.current_counts.get(&candidate.pair) {
                if current == candidate.count {
                    self.current_counts.remove(&candidate.pair);
                    return Some(candidate);
                }
            }
        }
        None
    }

    /// Update the count for a pair.
    ///
    /// Any existing entry for the pair becomes stale. A count of zero
    /// removes the pair from consideration.
    pub fn update(&mut self, pair: Pair, new_count: u64, order: u64) {
        if new_count == 0 {
            self.current_counts.remove(&pair);
            return;
        }
        self.current_counts.insert(pair, new_count);
        self.heap.push(MergeCandidate::new(pair, new_count, order));
    }

    /// Get the number of (potentially stale) entries in the queue.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Get the current count for a pair.
    pub fn get_count(&self, pair: Pair) -> Option<u64> {
        self.current_counts.get(&pair).copied()
    }
}

impl Default for PairPriorityQueue {
    fn default() -> Self {
        Self::new()
    }
}
