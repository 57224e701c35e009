//! Lazy-invalidation min-heap keyed by `(priority, version, key)`, shared by
//! the GDSF-family policies to find the minimum-priority resident without
//! paying for an eager decrease-key operation on every priority update.
//!
//! Priorities never rotate the heap in place; instead a new `(priority,
//! version, key)` entry is pushed on every update and stale entries (whose
//! `version` no longer matches the resident's current version, or whose key
//! is no longer resident) are dropped lazily the next time the minimum is
//! read.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy, PartialEq)]
struct HeapEntry {
    priority: f64,
    version: u64,
    key: u64,
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then(self.version.cmp(&other.version))
            .then(self.key.cmp(&other.key))
    }
}

/// Versioned lazy min-heap over `(priority, version, key)` entries.
#[derive(Debug, Clone, Default)]
pub struct PriorityIndex {
    heap: BinaryHeap<Reverse<HeapEntry>>,
}

impl PriorityIndex {
    /// An empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    /// Record a priority update for `key`. Does not remove the previous
    /// entry for `key`; it is left to go stale and is skipped by
    /// `peek_valid_min`.
    pub fn push(&mut self, priority: f64, version: u64, key: u64) {
        self.heap.push(Reverse(HeapEntry {
            priority,
            version,
            key,
        }));
    }

    /// Return the current valid minimum `(priority, key)`, dropping stale
    /// entries from the top of the heap as it goes. `is_valid(key, version)`
    /// should return whether `version` still matches that key's live
    /// metadata and the key is still resident.
    pub fn peek_valid_min<F>(&mut self, mut is_valid: F) -> Option<(f64, u64)>
    where
        F: FnMut(u64, u64) -> bool,
    {
        while let Some(&Reverse(top)) = self.heap.peek() {
            if is_valid(top.key, top.version) {
                return Some((top.priority, top.key));
            }
            self.heap.pop();
        }
        None
    }

    /// Number of entries still queued, including stale ones not yet pruned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the heap holds no entries at all (not even stale ones).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_smallest_priority() {
        let mut idx = PriorityIndex::new();
        idx.push(3.0, 0, 1);
        idx.push(1.0, 0, 2);
        idx.push(2.0, 0, 3);
        let (pr, key) = idx.peek_valid_min(|_, _| true).unwrap();
        assert_eq!(pr, 1.0);
        assert_eq!(key, 2);
    }

    #[test]
    fn skips_stale_entries() {
        let mut idx = PriorityIndex::new();
        idx.push(1.0, 0, 1); // stale: version will be 1, not 0
        idx.push(1.0, 1, 1); // current version for key 1
        idx.push(2.0, 0, 2);
        let (pr, key) = idx
            .peek_valid_min(|k, v| if k == 1 { v == 1 } else { v == 0 })
            .unwrap();
        assert_eq!(key, 1);
        assert_eq!(pr, 1.0);
    }

    #[test]
    fn empty_heap_returns_none() {
        let mut idx = PriorityIndex::new();
        assert!(idx.peek_valid_min(|_, _| true).is_none());
    }

    #[test]
    fn all_stale_returns_none() {
        let mut idx = PriorityIndex::new();
        idx.push(1.0, 0, 1);
        idx.push(2.0, 0, 2);
        assert!(idx.peek_valid_min(|_, _| false).is_none());
        assert!(idx.is_empty());
    }

    #[test]
    fn ties_break_by_key_for_determinism() {
        let mut idx = PriorityIndex::new();
        idx.push(1.0, 0, 5);
        idx.push(1.0, 0, 2);
        let (_, key) = idx.peek_valid_min(|_, _| true).unwrap();
        assert_eq!(key, 2);
    }
}
