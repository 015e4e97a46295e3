//! Storage implementations for throttle entries.
//!
//! Provides concurrent, sharded storage for the last-seen time of each
//! fingerprint.

use crate::application::ports::Storage;
use ahash::RandomState;
use dashmap::DashMap;
use std::hash::Hash;

/// Thread-safe sharded storage backed by DashMap.
///
/// DashMap provides fine-grained locking per shard, so concurrent log call
/// sites deciding on different fingerprints rarely contend.
#[derive(Debug)]
pub struct ShardedStorage<K, V>
where
    K: Eq + Hash,
{
    map: DashMap<K, V, RandomState>,
}

impl<K, V> ShardedStorage<K, V>
where
    K: Eq + Hash,
{
    /// Create a new sharded storage instance.
    pub fn new() -> Self {
        Self {
            map: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Get a copy of the value stored under `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.map.get(key).map(|entry| entry.value().clone())
    }

    /// Check if a key exists.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }
}

impl<K, V> Default for ShardedStorage<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Storage<K, V> for ShardedStorage<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + std::fmt::Debug,
    V: Send + Sync + std::fmt::Debug,
{
    fn insert(&self, key: K, value: V) -> Option<V> {
        self.map.insert(key, value)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn clear(&self) {
        self.map.clear()
    }

    fn retain<F>(&self, f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        self.map.retain(f);
    }
}

// Implement Storage for Arc<ShardedStorage> so clones share one map
impl<K, V> Storage<K, V> for std::sync::Arc<ShardedStorage<K, V>>
where
    K: Hash + Eq + Clone + Send + Sync + std::fmt::Debug,
    V: Send + Sync + std::fmt::Debug,
{
    fn insert(&self, key: K, value: V) -> Option<V> {
        (**self).insert(key, value)
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    fn clear(&self) {
        (**self).clear()
    }

    fn retain<F>(&self, f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        (**self).retain(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_insert_returns_previous() {
        let storage: ShardedStorage<String, u64> = ShardedStorage::new();

        assert_eq!(storage.insert("a".to_string(), 1), None);
        assert_eq!(storage.insert("a".to_string(), 2), Some(1));
        assert_eq!(storage.get("a"), Some(2));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_retain() {
        let storage: ShardedStorage<String, u64> = ShardedStorage::new();
        for i in 0..10 {
            storage.insert(format!("k{}", i), i);
        }

        storage.retain(|_, value| *value % 2 == 0);

        assert_eq!(storage.len(), 5);
        assert!(storage.contains_key("k4"));
        assert!(!storage.contains_key("k5"));
    }

    #[test]
    fn test_clear() {
        let storage: ShardedStorage<String, u64> = ShardedStorage::new();
        storage.insert("a".to_string(), 1);
        storage.clear();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_arc_storage_shares_state() {
        let storage = Arc::new(ShardedStorage::<String, u64>::new());
        let other = Arc::clone(&storage);

        Storage::insert(&other, "shared".to_string(), 7);
        assert_eq!(Storage::len(&storage), 1);
    }
}
