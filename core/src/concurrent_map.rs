//! Sharded map used to aggregate per-document values from many threads.
//!
//! The key space is split over a fixed number of partitions, each behind its
//! own mutex. A key always lands in partition `key mod shard_count`, so two
//! writers only contend when their keys share a partition. No lock spans more
//! than one partition.

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use std::collections::BTreeMap;

/// Integer keys that can be routed to a partition.
pub trait ShardKey: Copy + Ord {
    fn shard_index(self, shard_count: usize) -> usize;
}

macro_rules! impl_shard_key {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ShardKey for $ty {
                #[inline]
                fn shard_index(self, shard_count: usize) -> usize {
                    (self as u64 % shard_count as u64) as usize
                }
            }
        )*
    };
}

impl_shard_key!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Exclusive handle to one value; its partition stays locked while it lives.
pub type Access<'a, V> = MappedMutexGuard<'a, V>;

pub struct ConcurrentMap<K, V> {
    shards: Vec<Mutex<BTreeMap<K, V>>>,
}

impl<K: ShardKey, V> ConcurrentMap<K, V> {
    /// # Panics
    /// Panics if `shard_count` is zero.
    pub fn new(shard_count: usize) -> Self {
        assert!(shard_count > 0, "ConcurrentMap needs at least one shard");
        Self {
            shards: (0..shard_count).map(|_| Mutex::new(BTreeMap::new())).collect(),
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Moves every entry into one ordinary map, leaving all partitions empty.
    ///
    /// Partitions are locked one after another, so writers still running
    /// against already drained partitions would be lost. Callers drain only
    /// once all writers are done.
    pub fn drain_to_map(&self) -> BTreeMap<K, V> {
        let mut merged = BTreeMap::new();
        for shard in &self.shards {
            let mut guard = shard.lock();
            merged.append(&mut *guard);
        }
        merged
    }

    pub fn into_map(self) -> BTreeMap<K, V> {
        let mut merged = BTreeMap::new();
        for shard in self.shards {
            merged.append(&mut shard.into_inner());
        }
        merged
    }
}

impl<K: ShardKey, V: Default> ConcurrentMap<K, V> {
    /// Locks the partition owning `key` and returns its value, inserting
    /// `V::default()` first if the key is new.
    pub fn access(&self, key: K) -> Access<'_, V> {
        let shard = &self.shards[key.shard_index(self.shards.len())];
        MutexGuard::map(shard.lock(), |map| map.entry(key).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn keys_route_by_modulo() {
        assert_eq!(17i32.shard_index(8), 1);
        assert_eq!(16u64.shard_index(8), 0);
        assert_eq!(99usize.shard_index(100), 99);
    }

    #[test]
    fn access_inserts_default_and_accumulates() {
        let map: ConcurrentMap<i32, f64> = ConcurrentMap::new(4);
        *map.access(3) += 0.5;
        *map.access(3) += 0.25;
        *map.access(7) += 1.0;

        let merged = map.drain_to_map();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[&3], 0.75);
        assert_eq!(merged[&7], 1.0);
    }

    #[test]
    fn drain_leaves_partitions_empty() {
        let map: ConcurrentMap<u32, u32> = ConcurrentMap::new(3);
        for key in 0..10 {
            *map.access(key) += 1;
        }
        assert_eq!(map.drain_to_map().len(), 10);
        assert!(map.drain_to_map().is_empty());
    }

    #[test]
    fn negative_keys_are_routed_deterministically() {
        let map: ConcurrentMap<i32, i32> = ConcurrentMap::new(5);
        *map.access(-4) += 1;
        *map.access(-4) += 1;
        assert_eq!(map.into_map()[&-4], 2);
    }

    #[test]
    fn parallel_writers_do_not_lose_updates() {
        let map: ConcurrentMap<i32, u64> = ConcurrentMap::new(8);
        (0..20_000i32).into_par_iter().for_each(|i| {
            *map.access(i % 37) += 1;
        });

        let merged = map.drain_to_map();
        assert_eq!(merged.len(), 37);
        assert_eq!(merged.values().sum::<u64>(), 20_000);
    }

    #[test]
    fn single_shard_serializes_all_keys() {
        let map: ConcurrentMap<u8, u32> = ConcurrentMap::new(1);
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for key in 0..50u8 {
                        *map.access(key) += 1;
                    }
                });
            }
        });
        let merged = map.into_map();
        assert!(merged.values().all(|&count| count == 4));
    }

    #[test]
    #[should_panic(expected = "at least one shard")]
    fn zero_shards_panics() {
        let _map: ConcurrentMap<i32, i32> = ConcurrentMap::new(0);
    }
}
