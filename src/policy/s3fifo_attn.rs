//! Positional-attention variant of S3-FIFO: the per-key counter is seeded
//! from *where in the current request* the key first appears, rather than
//! always starting at zero.

use std::collections::{HashMap, VecDeque};

use crate::error::{check_capacity, check_unit_ratio, PolicyResult};
use crate::ghost::GhostFifo;
use crate::policy::{Policy, ResidentSnapshot};
use crate::policy_trace;
use crate::store::{BlockStore, ResidentStore};

const MAX_OFFSET: u8 = 3;

/// Construction-time parameters for [`S3FifoAttn`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct S3FifoAttnConfig {
    /// Fraction of capacity allotted to the small (probation) queue.
    pub sm_ratio: f64,
}

impl Default for S3FifoAttnConfig {
    fn default() -> Self {
        Self { sm_ratio: 0.1 }
    }
}

/// Identifies "the same request list" across calls without requiring an
/// out-of-band request handle: the borrowed slice's address and length.
/// Valid only for the lifetime of a single synchronous `access` call, which
/// is all the one-slot cache needs.
type RequestIdentity = (*const u64, usize);

fn request_identity(ids: &[u64]) -> RequestIdentity {
    (ids.as_ptr(), ids.len())
}

/// Split `ids` into maximal contiguous runs (`ids[i] == ids[i-1] + 1`) and
/// assign each key an offset equal to its run's distance from the *last*
/// run, capped at `MAX_OFFSET`.
fn compute_request_offsets(ids: &[u64]) -> HashMap<u64, u8> {
    if ids.is_empty() {
        return HashMap::new();
    }

    let mut runs: Vec<Vec<u64>> = Vec::new();
    let mut current = vec![ids[0]];
    for &id in &ids[1..] {
        if Some(id) == current.last().and_then(|&last| last.checked_add(1)) {
            current.push(id);
        } else {
            runs.push(std::mem::take(&mut current));
            current = vec![id];
        }
    }
    runs.push(current);

    let last_run_index = runs.len() - 1;
    let mut offsets = HashMap::new();
    for (run_index, run) in runs.into_iter().enumerate() {
        let offset = (last_run_index - run_index).min(MAX_OFFSET as usize) as u8;
        for id in run {
            offsets.insert(id, offset);
        }
    }
    offsets
}

/// S3-FIFO with request-position-seeded counters.
pub struct S3FifoAttn {
    store: BlockStore,
    s: VecDeque<u64>,
    m: VecDeque<u64>,
    ghost: GhostFifo,
    offset: HashMap<u64, u8>,
    s_cap: usize,
    m_cap: usize,
    offset_cache_identity: Option<RequestIdentity>,
    offset_cache: HashMap<u64, u8>,
}

impl S3FifoAttn {
    /// Build a new policy over a store of the given `capacity`.
    ///
    /// # Errors
    /// Returns an error if `capacity` is zero or `config.sm_ratio` is
    /// outside `[0.0, 1.0]`.
    pub fn new(capacity: usize, config: S3FifoAttnConfig) -> PolicyResult<Self> {
        check_capacity(capacity)?;
        check_unit_ratio("sm_ratio", config.sm_ratio)?;
        let s_cap = (config.sm_ratio * capacity as f64) as usize;
        Ok(Self {
            store: BlockStore::new(capacity)?,
            s: VecDeque::new(),
            m: VecDeque::new(),
            ghost: GhostFifo::new(capacity),
            offset: HashMap::new(),
            s_cap,
            m_cap: capacity - s_cap,
            offset_cache_identity: None,
            offset_cache: HashMap::new(),
        })
    }

    fn init_offset(&mut self, key: u64, request_prefix_ids: &[u64]) -> u8 {
        if request_prefix_ids.is_empty() {
            return 0;
        }
        let identity = request_identity(request_prefix_ids);
        if self.offset_cache_identity != Some(identity) {
            self.offset_cache = compute_request_offsets(request_prefix_ids);
            self.offset_cache_identity = Some(identity);
        }
        self.offset_cache.get(&key).copied().unwrap_or(0).min(MAX_OFFSET)
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
            let off = self.offset.get(&t).copied().unwrap_or(0);
            if off > 0 {
                self.m.push_front(t);
                self.rebalance_m();
            } else {
                policy_trace!(key = t, queue = "S", "s3fifo_attn real eviction");
                self.ghost.add(t);
                self.store.delete(t);
                self.offset.remove(&t);
                return;
            }
        }
    }

    fn evict_m(&mut self) {
        while let Some(t) = self.m.pop_back() {
            let off = self.offset.get(&t).copied().unwrap_or(0);
            if off > 0 {
                self.m.push_front(t);
                self.offset.insert(t, off - 1);
            } else {
                policy_trace!(key = t, queue = "M", "s3fifo_attn real eviction");
                self.store.delete(t);
                self.ghost.add(t);
                self.offset.remove(&t);
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

impl Policy for S3FifoAttn {
    fn access(&mut self, key: u64, request_prefix_ids: &[u64], _request_type: i32) -> bool {
        if self.store.contains(key) {
            let off = self.offset.get(&key).copied().unwrap_or(0);
            self.offset.insert(key, (off + 1).min(MAX_OFFSET));
            return true;
        }

        let init = self.init_offset(key, request_prefix_ids);
        self.offset.insert(key, init);
        self.insert(key);
        false
    }

    fn current_keys(&self) -> ResidentSnapshot {
        ResidentSnapshot::Segmented {
            small: self.s.iter().copied().collect(),
            main: self.m.iter().copied().collect(),
        }
    }
}
