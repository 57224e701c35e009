//! S3_GDSF: S3-FIFO's eviction machinery (S/M segments, ghost queue, capped
//! hit counter) gated by a GDSF-style priority admission check, so a
//! low-priority newcomer can be rejected outright instead of always being
//! allowed to displace the oldest resident.

use std::collections::{HashMap, VecDeque};

use crate::error::{check_capacity, check_nonnegative_weight, PolicyResult};
use crate::ghost::GhostFifo;
use crate::policy::{first_index, Policy, ResidentSnapshot};
use crate::policy_trace;
use crate::priority::PriorityIndex;
use crate::store::{BlockStore, ResidentStore};

const MAX_FREQ: u8 = 3;

#[derive(Debug, Clone, Copy)]
struct Meta {
    priority: f64,
    version: u64,
}

/// Construction-time parameters for [`S3Gdsf`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct S3GdsfConfig {
    /// Weight of the position bias in the admission priority: `beta_pos /
    /// (1 + index-in-request)`.
    pub beta_pos: f64,
}

impl Default for S3GdsfConfig {
    fn default() -> Self {
        Self { beta_pos: 1.0 }
    }
}

/// Hybrid S3-FIFO eviction with GDSF priority admission.
pub struct S3Gdsf {
    store: BlockStore,
    s: VecDeque<u64>,
    m: VecDeque<u64>,
    ghost: GhostFifo,
    freq: HashMap<u64, u8>,
    meta: HashMap<u64, Meta>,
    heap: PriorityIndex,
    clock: f64,
    beta_pos: f64,
    s_cap: usize,
    m_cap: usize,
}

impl S3Gdsf {
    /// Build a new policy over a store of the given `capacity`.
    ///
    /// # Errors
    /// Returns an error if `capacity` is zero or `config.beta_pos` is
    /// negative or non-finite.
    pub fn new(capacity: usize, config: S3GdsfConfig) -> PolicyResult<Self> {
        check_capacity(capacity)?;
        check_nonnegative_weight("beta_pos", config.beta_pos)?;
        let s_cap = (capacity / 10).max(1);
        Ok(Self {
            store: BlockStore::new(capacity)?,
            s: VecDeque::new(),
            m: VecDeque::new(),
            ghost: GhostFifo::new(capacity),
            freq: HashMap::new(),
            meta: HashMap::new(),
            heap: PriorityIndex::new(),
            clock: 0.0,
            beta_pos: config.beta_pos,
            s_cap,
            m_cap: capacity - s_cap,
        })
    }

    fn pos_bias(&self, key: u64, request_prefix_ids: &[u64]) -> f64 {
        match first_index(request_prefix_ids, key) {
            Some(idx) => self.beta_pos / (1 + idx) as f64,
            None => 0.0,
        }
    }

    fn update_meta_and_heap(&mut self, key: u64, priority: f64) {
        let version = match self.meta.get_mut(&key) {
            Some(m) => {
                m.priority = priority;
                m.version += 1;
                m.version
            }
            None => {
                self.meta.insert(key, Meta { priority, version: 0 });
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

    fn insert_head_s(&mut self, key: u64, priority: f64) {
        self.store.add(key);
        self.s.push_front(key);
        self.update_meta_and_heap(key, priority);
    }

    fn insert_head_m(&mut self, key: u64, priority: f64) {
        self.store.add(key);
        self.m.push_front(key);
        self.update_meta_and_heap(key, priority);
    }

    fn rebalance_m(&mut self) {
        while self.m.len() > self.m_cap && self.store.size() > 0 {
            self.evict_m_real_once();
        }
    }

    fn ensure_space(&mut self) {
        while self.store.size() >= self.store.capacity() {
            if self.s.len() >= self.s_cap {
                self.evict_s_real_once();
            } else {
                self.evict_m_real_once();
            }
        }
    }

    fn retire(&mut self, key: u64) {
        self.store.delete(key);
        self.ghost.add(key);
        let priority = self.meta.get(&key).map_or(self.clock, |m| m.priority);
        self.clock = self.clock.max(priority);
        policy_trace!(key, clock = self.clock, "s3_gdsf real eviction");
        self.meta.remove(&key);
        self.freq.remove(&key);
    }

    fn evict_s_real_once(&mut self) {
        while let Some(t) = self.s.pop_back() {
            let f = self.freq.get(&t).copied().unwrap_or(0);
            if f > 1 {
                self.m.push_front(t);
                self.rebalance_m();
            } else {
                self.retire(t);
                return;
            }
        }
    }

    fn evict_m_real_once(&mut self) {
        while let Some(t) = self.m.pop_back() {
            let f = self.freq.get(&t).copied().unwrap_or(0);
            if f > 0 {
                self.m.push_front(t);
                self.freq.insert(t, f - 1);
            } else {
                self.retire(t);
                return;
            }
        }
    }
}

impl Policy for S3Gdsf {
    fn access(&mut self, key: u64, request_prefix_ids: &[u64], _request_type: i32) -> bool {
        if self.store.contains(key) {
            let f = self.freq.get(&key).copied().unwrap_or(0);
            let new_f = (f + 1).min(MAX_FREQ);
            self.freq.insert(key, new_f);
            let pos_bias = self.pos_bias(key, request_prefix_ids);
            let priority = self.clock + new_f as f64 + pos_bias;
            self.update_meta_and_heap(key, priority);
            return true;
        }

        let pos_bias = self.pos_bias(key, request_prefix_ids);
        let priority_new = self.clock + 1.0 + pos_bias;

        if self.store.size() >= self.store.capacity() {
            let min_priority = self.peek_valid_min().map(|(p, _)| p);
            if let Some(min_priority) = min_priority {
                if priority_new < min_priority {
                    policy_trace!(key, min_priority, priority_new, "s3_gdsf admission rejected");
                    return false;
                }
            }
            self.ensure_space();
        }

        if self.ghost.contains(key) {
            self.ghost.remove(key);
            self.insert_head_m(key, priority_new);
            self.rebalance_m();
        } else {
            self.insert_head_s(key, priority_new);
        }
        self.freq.insert(key, 0);
        false
    }

    fn current_keys(&self) -> ResidentSnapshot {
        ResidentSnapshot::Segmented {
            small: self.s.iter().copied().collect(),
            main: self.m.iter().copied().collect(),
        }
    }
}
