//! GDSF-style priority admission: a virtual clock plus frequency plus a
//! position bonus decide both eviction victim and whether a new key is
//! worth admitting at all. No S/M segmentation -- this is the pure
//! priority-queue discipline that [`crate::policy::S3Gdsf`] later combines
//! with S3-FIFO's eviction machinery.

use std::collections::HashMap;

use crate::error::{check_capacity, check_nonnegative_weight, PolicyResult};
use crate::policy::{first_index, Policy, ResidentSnapshot};
use crate::policy_trace;
use crate::priority::PriorityIndex;
use crate::store::{BlockStore, ResidentStore};

#[derive(Debug, Clone, Copy)]
struct Meta {
    freq: u64,
    priority: f64,
    version: u64,
}

/// Construction-time parameters for [`Gdsf`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GdsfConfig {
    /// Weight of the position bonus: earlier-in-request keys get a larger
    /// admission-priority boost.
    pub pos_alpha: f64,
}

impl Default for GdsfConfig {
    fn default() -> Self {
        Self { pos_alpha: 1.0 }
    }
}

/// GDSF priority-admission policy.
pub struct Gdsf {
    store: BlockStore,
    clock: f64,
    meta: HashMap<u64, Meta>,
    heap: PriorityIndex,
    pos_alpha: f64,
}

impl Gdsf {
    /// Build a new policy over a store of the given `capacity`.
    ///
    /// # Errors
    /// Returns an error if `capacity` is zero or `config.pos_alpha` is
    /// negative or non-finite.
    pub fn new(capacity: usize, config: GdsfConfig) -> PolicyResult<Self> {
        check_capacity(capacity)?;
        check_nonnegative_weight("pos_alpha", config.pos_alpha)?;
        Ok(Self {
            store: BlockStore::new(capacity)?,
            clock: 0.0,
            meta: HashMap::new(),
            heap: PriorityIndex::new(),
            pos_alpha: config.pos_alpha,
        })
    }

    fn pos_bonus(&self, key: u64, request_prefix_ids: &[u64]) -> f64 {
        let n = request_prefix_ids.len();
        if n == 0 {
            return 0.0;
        }
        match first_index(request_prefix_ids, key) {
            Some(i) => self.pos_alpha * ((n - i) as f64 / n as f64),
            None => 0.0,
        }
    }

    fn priority_for(&self, freq: u64, pos_bonus: f64) -> f64 {
        self.clock + freq as f64 + pos_bonus
    }

    fn update_meta_and_heap(&mut self, key: u64, freq: u64, priority: f64) {
        let version = match self.meta.get_mut(&key) {
            Some(m) => {
                m.freq = freq;
                m.priority = priority;
                m.version += 1;
                m.version
            }
            None => {
                self.meta.insert(
                    key,
                    Meta {
                        freq,
                        priority,
                        version: 0,
                    },
                );
                0
            }
        };
        self.heap.push(priority, version, key);
    }

    fn peek_valid_min(&mut self) -> Option<(f64, u64)> {
        let store = &self.store;
        let meta = &self.meta;
        self.heap.peek_valid_min(|key, version| {
            meta.get(&key).is_some_and(|m| m.version == version) && store.contains(key)
        })
    }
}

impl Policy for Gdsf {
    fn access(&mut self, key: u64, request_prefix_ids: &[u64], _request_type: i32) -> bool {
        if self.store.contains(key) {
            let freq = self.meta.get(&key).map_or(1, |m| m.freq) + 1;
            let pos_bonus = self.pos_bonus(key, request_prefix_ids);
            let priority = self.priority_for(freq, pos_bonus);
            self.update_meta_and_heap(key, freq, priority);
            return true;
        }

        let pos_bonus = self.pos_bonus(key, request_prefix_ids);
        let priority_new = self.priority_for(1, pos_bonus);

        if self.store.size() < self.store.capacity() {
            self.store.add(key);
            self.update_meta_and_heap(key, 1, priority_new);
            return false;
        }

        let Some((min_priority, victim)) = self.peek_valid_min() else {
            policy_trace!(key, "gdsf admission rejected: no valid victim");
            return false;
        };
        if priority_new < min_priority {
            policy_trace!(key, min_priority, priority_new, "gdsf admission rejected");
            return false;
        }

        self.store.delete(victim);
        self.meta.remove(&victim);
        self.clock = self.clock.max(min_priority);
        policy_trace!(key = victim, clock = self.clock, "gdsf real eviction");

        self.store.add(key);
        self.update_meta_and_heap(key, 1, priority_new);
        false
    }

    fn current_keys(&self) -> ResidentSnapshot {
        ResidentSnapshot::Flat(self.meta.keys().copied().collect())
    }
}
