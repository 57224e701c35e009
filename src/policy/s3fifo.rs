//! S3-FIFO: a FIFO probation queue (`S`) feeding a FIFO main queue (`M`),
//! with a ghost queue (`G`) of recently evicted keys and a capped per-key
//! hit counter driving promotion, rotation, and real eviction.

use std::collections::{HashMap, VecDeque};

use crate::error::{check_capacity, check_unit_ratio, PolicyResult};
use crate::ghost::GhostFifo;
use crate::policy::{Policy, ResidentSnapshot};
use crate::policy_trace;
use crate::store::{BlockStore, ResidentStore};

const MAX_FREQ: u8 = 3;

/// Construction-time parameters for [`S3Fifo`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct S3FifoConfig {
    /// Fraction of capacity allotted to the small (probation) queue. The
    /// main queue gets the remainder. Not clamped to a minimum of one slot:
    /// for small capacities `S` can be legitimately empty.
    pub sm_ratio: f64,
}

impl Default for S3FifoConfig {
    fn default() -> Self {
        Self { sm_ratio: 0.1 }
    }
}

/// S3-FIFO cache-replacement policy.
pub struct S3Fifo {
    store: BlockStore,
    s: VecDeque<u64>,
    m: VecDeque<u64>,
    ghost: GhostFifo,
    freq: HashMap<u64, u8>,
    s_cap: usize,
    m_cap: usize,
}

impl S3Fifo {
    /// Build a new policy over a store of the given `capacity`.
    ///
    /// # Errors
    /// Returns an error if `capacity` is zero or `config.sm_ratio` is
    /// outside `[0.0, 1.0]`.
    pub fn new(capacity: usize, config: S3FifoConfig) -> PolicyResult<Self> {
        check_capacity(capacity)?;
        check_unit_ratio("sm_ratio", config.sm_ratio)?;
        let s_cap = (config.sm_ratio * capacity as f64) as usize;
        Ok(Self {
            store: BlockStore::new(capacity)?,
            s: VecDeque::new(),
            m: VecDeque::new(),
            ghost: GhostFifo::new(capacity),
            freq: HashMap::new(),
            s_cap,
            m_cap: capacity - s_cap,
        })
    }

    fn insert(&mut self, key: u64) {
        while self.store.size() >= self.store.capacity() {
            self.evict();
        }

        if self.ghost.contains(key) {
            self.m.push_front(key);
            self.store.add(key);
            self.ghost.remove(key);
            self.rebalance_m();
        } else {
            self.s.push_front(key);
            self.store.add(key);
        }
    }

    fn evict(&mut self) {
        if self.s.len() >= self.s_cap {
            self.evict_s();
        } else {
            self.evict_m();
        }
    }

    fn evict_s(&mut self) {
        while let Some(t) = self.s.pop_back() {
            let f = self.freq.get(&t).copied().unwrap_or(0);
            if f > 1 {
                self.m.push_front(t);
                self.rebalance_m();
            } else {
                policy_trace!(key = t, queue = "S", "s3fifo real eviction");
                self.ghost.add(t);
                self.store.delete(t);
                self.freq.remove(&t);
                return;
            }
        }
    }

    fn evict_m(&mut self) {
        while let Some(t) = self.m.pop_back() {
            let f = self.freq.get(&t).copied().unwrap_or(0);
            if f > 0 {
                self.m.push_front(t);
                self.freq.insert(t, f - 1);
            } else {
                policy_trace!(key = t, queue = "M", "s3fifo real eviction");
                self.store.delete(t);
                self.ghost.add(t);
                self.freq.remove(&t);
                return;
            }
        }
    }

    fn rebalance_m(&mut self) {
        while self.m.len() > self.m_cap {
            self.evict_m();
        }
    }
}

impl Policy for S3Fifo {
    fn access(&mut self, key: u64, _request_prefix_ids: &[u64], _request_type: i32) -> bool {
        if self.store.contains(key) {
            let f = self.freq.get(&key).copied().unwrap_or(0);
            self.freq.insert(key, (f + 1).min(MAX_FREQ));
            return true;
        }

        self.insert(key);
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

#[cfg(test)]
mod tests {
    use super::*;

    fn resident(p: &S3Fifo) -> Vec<u64> {
        match p.current_keys() {
            ResidentSnapshot::Segmented { mut small, main } => {
                small.extend(main);
                small
            }
            ResidentSnapshot::Flat(v) => v,
        }
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(S3Fifo::new(0, S3FifoConfig::default()).is_err());
    }

    #[test]
    fn out_of_range_sm_ratio_is_rejected() {
        assert!(S3Fifo::new(4, S3FifoConfig { sm_ratio: 1.5 }).is_err());
    }

    #[test]
    fn first_access_is_always_a_miss() {
        let mut p = S3Fifo::new(2, S3FifoConfig::default()).unwrap();
        assert!(!p.access(1, &[], 0));
    }

    #[test]
    fn repeated_access_is_a_hit() {
        let mut p = S3Fifo::new(2, S3FifoConfig::default()).unwrap();
        p.access(1, &[], 0);
        assert!(p.access(1, &[], 0));
    }

    #[test]
    fn scenario_a_all_residents_survive_one_rotation_round() {
        // capacity = 3, sm_ratio = 0.1 => s_cap = 0, m_cap = 3.
        let mut p = S3Fifo::new(3, S3FifoConfig { sm_ratio: 0.1 }).unwrap();
        for id in [1, 2, 3] {
            assert!(!p.access(id, &[1, 2, 3], 1));
        }
        for id in [1, 2, 3] {
            assert!(p.access(id, &[1, 2, 3], 1));
        }
        assert!(!p.access(4, &[4], 1));
        assert_eq!(resident(&p).len(), 3);
    }

    #[test]
    fn scenario_d_ghost_hit_routes_straight_to_main() {
        // capacity = 2, sm_ratio = 0.5 => s_cap = 1, m_cap = 1.
        let mut p = S3Fifo::new(2, S3FifoConfig { sm_ratio: 0.5 }).unwrap();
        p.access(10, &[10], 1);
        p.access(20, &[20], 1);
        p.access(30, &[30], 1); // evicts 10 to ghost
        assert!(!p.access(10, &[10], 1)); // ghost hit: miss, but routed to M
        match p.current_keys() {
            ResidentSnapshot::Segmented { main, .. } => assert!(main.contains(&10)),
            ResidentSnapshot::Flat(_) => unreachable!(),
        }
    }

    #[test]
    fn invariant_store_size_within_capacity() {
        let mut p = S3Fifo::new(4, S3FifoConfig::default()).unwrap();
        for id in 0..50 {
            p.access(id % 7, &[id % 7], 0);
            assert!(p.store.size() <= p.store.capacity());
        }
    }
}
