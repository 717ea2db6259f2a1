use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

/// Bounded in-memory cache in front of a store. When full, the least recently
/// touched eighth of the entries is evicted.
pub struct Cache<K, V> {
    capacity: usize,
    map: RwLock<HashMap<K, CacheEntry<V>>>,
    tick: AtomicU64,
}

struct CacheEntry<V> {
    value: V,
    last_access: AtomicU64,
}

impl<K: Hash + Eq + Clone, V: Clone> Cache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, map: RwLock::new(HashMap::with_capacity(capacity.min(1 << 16))), tick: AtomicU64::new(0) }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let map = self.map.read();
        map.get(key).map(|entry| {
            entry.last_access.store(self.next_tick(), Ordering::Relaxed);
            entry.value.clone()
        })
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.map.read().contains_key(key)
    }

    pub fn insert(&self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        let mut map = self.map.write();
        if map.len() >= self.capacity && !map.contains_key(&key) {
            Self::evict(&mut map, self.capacity / 8 + 1);
        }
        map.insert(key, CacheEntry { value, last_access: AtomicU64::new(self.next_tick()) });
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.map.write().remove(key).map(|e| e.value)
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.map.write().clear();
    }

    fn next_tick(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::Relaxed)
    }

    fn evict(map: &mut HashMap<K, CacheEntry<V>>, count: usize) {
        let mut by_age: Vec<(u64, K)> = map.iter().map(|(k, e)| (e.last_access.load(Ordering::Relaxed), k.clone())).collect();
        by_age.sort_unstable_by_key(|(tick, _)| *tick);
        for (_, key) in by_age.into_iter().take(count) {
            map.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_cache() {
        let c = Cache::new(2);
        c.insert(1u32, "one");
        c.insert(2u32, "two");
        assert_eq!(c.len(), 2);
        assert_eq!(c.get(&1u32), Some("one"));
        c.insert(3u32, "three");
        assert_eq!(c.len(), 2);
        // 2 was the least recently touched entry
        assert!(c.contains_key(&1) && c.contains_key(&3) && !c.contains_key(&2));
    }

    #[test]
    fn zero_capacity_cache_stores_nothing() {
        let c = Cache::new(0);
        c.insert(1u32, 1u32);
        assert!(c.is_empty());
    }
}
