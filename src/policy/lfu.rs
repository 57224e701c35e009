//! Frequency-only eviction: always evict the resident with the lowest
//! access frequency. `LfuTyped` additionally prefers, among tied-frequency
//! victims, one whose last-seen request type differs from the incoming
//! request.

use std::collections::{BTreeSet, HashMap};

use crate::error::{check_capacity, PolicyResult};
use crate::policy::{Policy, ResidentSnapshot};
use crate::policy_trace;
use crate::store::{BlockStore, ResidentStore};

/// Construction-time parameters for [`Lfu`] and [`LfuTyped`].
///
/// LFU has no tunable recurrence parameters; this exists so every policy in
/// the crate is constructed the same way and so a future knob has somewhere
/// to live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LfuConfig;

/// Plain least-frequently-used policy.
pub struct Lfu {
    store: BlockStore,
    freq_map: HashMap<u64, u64>,
    min_freq: u64,
    min_set: BTreeSet<u64>,
}

impl Lfu {
    /// Build a new policy over a store of the given `capacity`.
    ///
    /// # Errors
    /// Returns an error if `capacity` is zero.
    pub fn new(capacity: usize, _config: LfuConfig) -> PolicyResult<Self> {
        check_capacity(capacity)?;
        Ok(Self {
            store: BlockStore::new(capacity)?,
            freq_map: HashMap::new(),
            min_freq: 0,
            min_set: BTreeSet::new(),
        })
    }

    /// Rebuild `min_set` from scratch against the current `min_freq`. Only
    /// fires when the unique minimum-frequency key graduates to a higher
    /// frequency, so it stays an infrequent O(resident) scan.
    fn renew_min_set(&mut self) {
        self.min_set = self
            .freq_map
            .iter()
            .filter(|&(_, &f)| f == self.min_freq)
            .map(|(&k, _)| k)
            .collect();
    }

    fn record_hit(&mut self, key: u64) {
        let freq = self.freq_map.get_mut(&key).expect("resident key has a freq entry");
        *freq += 1;
        let new_freq = *freq;

        if self.min_set.contains(&key) {
            if new_freq > self.min_freq && self.min_set.len() == 1 {
                self.min_freq += 1;
                self.renew_min_set();
            } else {
                self.min_set.remove(&key);
            }
        }
    }

    /// Pick this access's eviction victim from `min_set`, given the
    /// incoming `request_type`. The base LFU policy ignores the type and
    /// always takes the smallest identifier.
    fn choose_victim(&self, _request_type: i32) -> u64 {
        *self.min_set.iter().next().expect("store is full, min_set non-empty")
    }

    fn evict_if_full(&mut self, request_type: i32) {
        if self.store.size() >= self.store.capacity() {
            let victim = self.choose_victim(request_type);
            policy_trace!(key = victim, "lfu real eviction");
            self.evict_key(victim);
        }
    }

    fn evict_key(&mut self, key: u64) {
        self.store.delete(key);
        self.freq_map.remove(&key);
        self.min_set.remove(&key);
    }

    /// Admit `key` as a fresh miss: frequency 1, always the new minimum.
    fn admit_fresh(&mut self, key: u64) {
        self.store.add(key);
        self.freq_map.insert(key, 1);

        if self.min_freq > 1 {
            self.min_set.clear();
        }
        self.min_freq = 1;
        self.min_set.insert(key);
    }

    fn record_miss(&mut self, key: u64, request_type: i32) {
        self.evict_if_full(request_type);
        self.admit_fresh(key);
    }
}

impl Policy for Lfu {
    fn access(&mut self, key: u64, _request_prefix_ids: &[u64], request_type: i32) -> bool {
        if self.store.contains(key) {
            self.record_hit(key);
            return true;
        }
        self.record_miss(key, request_type);
        false
    }

    fn current_keys(&self) -> ResidentSnapshot {
        ResidentSnapshot::Flat(self.freq_map.keys().copied().collect())
    }
}

/// Type-aware LFU: diversifies residency across request-type classes by
/// preferring a differently-typed victim among frequency ties.
pub struct LfuTyped {
    inner: Lfu,
    type_map: HashMap<u64, i32>,
}

impl LfuTyped {
    /// Build a new policy over a store of the given `capacity`.
    ///
    /// # Errors
    /// Returns an error if `capacity` is zero.
    pub fn new(capacity: usize, config: LfuConfig) -> PolicyResult<Self> {
        Ok(Self {
            inner: Lfu::new(capacity, config)?,
            type_map: HashMap::new(),
        })
    }
}

impl Policy for LfuTyped {
    fn access(&mut self, key: u64, _request_prefix_ids: &[u64], request_type: i32) -> bool {
        if self.inner.store.contains(key) {
            self.inner.record_hit(key);
            self.type_map.insert(key, request_type);
            return true;
        }

        if self.inner.store.size() >= self.inner.store.capacity() {
            let victim = self
                .inner
                .min_set
                .iter()
                .find(|&&k| self.type_map.get(&k) != Some(&request_type))
                .copied()
                .unwrap_or_else(|| self.inner.choose_victim(request_type));
            policy_trace!(key = victim, "lfu_typed real eviction");
            self.inner.evict_key(victim);
            self.type_map.remove(&victim);
        }

        self.inner.admit_fresh(key);
        self.type_map.insert(key, request_type);
        false
    }

    fn current_keys(&self) -> ResidentSnapshot {
        self.inner.current_keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(Lfu::new(0, LfuConfig).is_err());
    }

    #[test]
    fn first_access_is_always_a_miss() {
        let mut p = Lfu::new(2, LfuConfig).unwrap();
        assert!(!p.access(1, &[], 0));
    }

    #[test]
    fn repeated_access_is_a_hit() {
        let mut p = Lfu::new(2, LfuConfig).unwrap();
        p.access(1, &[], 0);
        assert!(p.access(1, &[], 0));
    }

    #[test]
    fn scenario_c_evicts_the_least_frequently_used() {
        let mut p = Lfu::new(2, LfuConfig).unwrap();
        p.access(1, &[], 1);
        p.access(1, &[], 1); // freq[1] = 2
        p.access(2, &[], 1); // admits 2, freq[2] = 1, not full yet
        p.access(3, &[], 1); // full: evicts min_set member (key 2)

        let ResidentSnapshot::Flat(mut keys) = p.current_keys() else {
            unreachable!()
        };
        keys.sort_unstable();
        assert_eq!(keys, vec![1, 3]);
    }

    #[test]
    fn invariant_min_freq_matches_min_set_after_each_access() {
        let mut p = Lfu::new(3, LfuConfig).unwrap();
        let trace = [1, 1, 2, 3, 1, 4, 2, 2, 5];
        for &id in &trace {
            p.access(id, &[], 0);
            let expected: BTreeSet<u64> = p
                .freq_map
                .iter()
                .filter(|&(_, &f)| f == p.min_freq)
                .map(|(&k, _)| k)
                .collect();
            assert_eq!(p.min_set, expected);
            assert!(p.min_freq >= 1);
        }
    }

    #[test]
    fn typed_variant_prefers_a_differently_typed_victim_on_tie() {
        let mut p = LfuTyped::new(2, LfuConfig).unwrap();
        p.access(1, &[], 1);
        p.access(2, &[], 2);
        // Both at freq 1, min_set = {1, 2}; incoming type 2 should evict
        // key 1 (type 1), preserving key 2 (also type 2).
        p.access(3, &[], 2);
        let ResidentSnapshot::Flat(mut keys) = p.current_keys() else {
            unreachable!()
        };
        keys.sort_unstable();
        assert_eq!(keys, vec![2, 3]);
    }

    #[test]
    fn typed_variant_falls_back_to_smallest_when_all_types_match() {
        let mut p = LfuTyped::new(2, LfuConfig).unwrap();
        p.access(1, &[], 9);
        p.access(2, &[], 9);
        p.access(3, &[], 9);
        let ResidentSnapshot::Flat(mut keys) = p.current_keys() else {
            unreachable!()
        };
        keys.sort_unstable();
        assert_eq!(keys, vec![2, 3]);
    }
}
