//! The resident set a policy mutates.
//!
//! This is deliberately thin: a capacity-bounded set of integer identifiers
//! and nothing else. It is not part of the replacement logic -- policies are
//! generic over [`ResidentStore`] so that a caller could swap in a different
//! backing set without touching any policy code, the same way the upstream
//! store was always an external collaborator rather than core behavior.

use std::collections::HashSet;

use crate::error::{check_capacity, PolicyResult};

/// Contract a policy needs from its resident set.
pub trait ResidentStore {
    /// Insert `key`. Panics if this would exceed `capacity()` -- policies
    /// must call `delete`/evict first to make room.
    fn add(&mut self, key: u64);

    /// Remove `key`. A no-op if `key` is not present.
    fn delete(&mut self, key: u64);

    /// Whether `key` is currently resident.
    fn contains(&self, key: u64) -> bool;

    /// Number of currently resident identifiers.
    fn size(&self) -> usize;

    /// Fixed capacity this store was constructed with.
    fn capacity(&self) -> usize;
}

/// In-memory resident set backed by a `HashSet<u64>`.
///
/// `add` is strict: exceeding `capacity` is always a policy bug, so it
/// panics immediately rather than silently growing past the bound or
/// threading a `Result` through every policy's hot loop for a condition that
/// should never occur in correct code.
#[derive(Debug, Clone)]
pub struct BlockStore {
    capacity: usize,
    resident: HashSet<u64>,
}

impl BlockStore {
    /// Create an empty store with the given capacity.
    ///
    /// # Errors
    /// Returns [`crate::error::PolicyError::InvalidCapacity`] if `capacity`
    /// is zero.
    pub fn new(capacity: usize) -> PolicyResult<Self> {
        check_capacity(capacity)?;
        Ok(Self {
            capacity,
            resident: HashSet::with_capacity(capacity),
        })
    }
}

impl ResidentStore for BlockStore {
    fn add(&mut self, key: u64) {
        if self.resident.contains(&key) {
            return;
        }
        assert!(
            self.resident.len() < self.capacity,
            "BlockStore::add: key {key} would exceed capacity {} (policy failed to evict first)",
            self.capacity
        );
        self.resident.insert(key);
    }

    fn delete(&mut self, key: u64) {
        self.resident.remove(&key);
    }

    fn contains(&self, key: u64) -> bool {
        self.resident.contains(&key)
    }

    fn size(&self) -> usize {
        self.resident.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}
