use lru::LruCache;
use serde::Serialize;
use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

/// A stored value and the moment it was written.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: Instant,
}

impl<V> CacheEntry<V> {
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created_at) <= ttl
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

/// Size-bounded, time-expiring map with least-recently-used eviction.
///
/// `get` and `put` both move an entry to the most-recently-used position.
/// Expired entries stay stored until they are next looked up (or evicted);
/// there is no background sweep. Not synchronized: wrap in a lock to share.
/// A bound of zero is treated as one.
pub struct BoundedCache<K: Hash + Eq, V> {
    ttl: Duration,
    entries: LruCache<K, CacheEntry<V>>,
    stats: CacheStats,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        let cap = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl,
            entries: LruCache::new(cap),
            stats: CacheStats::default(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_entries(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&mut self, key: &K, now: Instant) -> Option<V> {
        let fresh = match self.entries.peek(key) {
            None => {
                self.stats.misses += 1;
                return None;
            }
            Some(entry) => entry.is_fresh(now, self.ttl),
        };
        if !fresh {
            self.entries.pop(key);
            self.stats.expirations += 1;
            self.stats.misses += 1;
            return None;
        }
        self.stats.hits += 1;
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn put(&mut self, key: K, value: V) {
        self.put_at(key, value, Instant::now());
    }

    /// Inserts or overwrites; a new key at capacity evicts the least-recently-used entry.
    pub fn put_at(&mut self, key: K, value: V, now: Instant) {
        let evicts = !self.entries.contains(&key) && self.entries.len() >= self.max_entries();
        self.entries.put(
            key,
            CacheEntry {
                value,
                created_at: now,
            },
        );
        if evicts {
            self.stats.evictions += 1;
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.pop(key).map(|entry| entry.value)
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            ..self.stats
        }
    }
}

impl<K: Hash + Eq, V> fmt::Debug for BoundedCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedCache")
            .field("ttl", &self.ttl)
            .field("len", &self.entries.len())
            .field("cap", &self.entries.cap())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(ttl_secs: u64, n: usize) -> BoundedCache<String, u32> {
        BoundedCache::new(Duration::from_secs(ttl_secs), n)
    }

    #[test]
    fn fresh_until_ttl_inclusive() {
        let mut c = cache(300, 4);
        let t0 = Instant::now();
        c.put_at("k".into(), 1, t0);

        assert_eq!(c.get_at(&"k".into(), t0 + Duration::from_secs(299)), Some(1));
        assert_eq!(c.get_at(&"k".into(), t0 + Duration::from_secs(300)), Some(1));
    }

    #[test]
    fn expired_entry_is_absent_once_then_gone() {
        let mut c = cache(300, 4);
        let t0 = Instant::now();
        c.put_at("k".into(), 1, t0);

        let later = t0 + Duration::from_secs(301);
        // still physically present until accessed
        assert_eq!(c.len(), 1);
        assert_eq!(c.get_at(&"k".into(), later), None);
        assert_eq!(c.len(), 0);
        assert_eq!(c.stats().expirations, 1);

        assert_eq!(c.get_at(&"k".into(), later), None);
        assert_eq!(c.stats().expirations, 1);
    }

    #[test]
    fn overwrite_restamps_creation_time() {
        let mut c = cache(10, 4);
        let t0 = Instant::now();
        c.put_at("k".into(), 1, t0);
        c.put_at("k".into(), 2, t0 + Duration::from_secs(8));
        assert_eq!(c.get_at(&"k".into(), t0 + Duration::from_secs(15)), Some(2));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn evicts_first_inserted_when_over_bound() {
        let n = 32;
        let mut c = cache(300, n);
        for i in 0..=n {
            c.put(format!("k{i}"), i as u32);
        }
        assert_eq!(c.len(), n);
        assert_eq!(c.get(&"k0".into()), None);
        for i in 1..=n {
            assert_eq!(c.get(&format!("k{i}")), Some(i as u32));
        }
        assert_eq!(c.stats().evictions, 1);
    }

    #[test]
    fn get_refreshes_recency() {
        let mut c = cache(300, 2);
        c.put("a".into(), 1);
        c.put("b".into(), 2);
        assert_eq!(c.get(&"a".into()), Some(1));
        c.put("c".into(), 3);

        assert_eq!(c.get(&"b".into()), None);
        assert_eq!(c.get(&"a".into()), Some(1));
        assert_eq!(c.get(&"c".into()), Some(3));
    }

    #[test]
    fn clear_and_remove() {
        let mut c = cache(300, 4);
        c.put("a".into(), 1);
        c.put("b".into(), 2);
        assert_eq!(c.remove(&"a".into()), Some(1));
        assert_eq!(c.len(), 1);
        c.clear();
        assert!(c.is_empty());
        assert_eq!(c.get(&"b".into()), None);
    }

    #[test]
    fn counts_hits_and_misses() {
        let mut c = cache(300, 4);
        c.put("a".into(), 1);
        c.get(&"a".into());
        c.get(&"missing".into());
        let s = c.stats();
        assert_eq!((s.hits, s.misses, s.entries), (1, 1, 1));
    }

    #[test]
    fn zero_bound_keeps_latest_entry() {
        let mut c = cache(300, 0);
        assert_eq!(c.max_entries(), 1);
        c.put("a".into(), 1);
        c.put("b".into(), 2);
        assert_eq!(c.len(), 1);
        assert_eq!(c.get(&"b".into()), Some(2));
        assert_eq!(c.stats().evictions, 1);
    }

    #[test]
    fn overwrite_at_capacity_does_not_evict() {
        let mut c = cache(300, 2);
        c.put("a".into(), 1);
        c.put("b".into(), 2);
        c.put("a".into(), 3);
        assert_eq!(c.len(), 2);
        assert_eq!(c.stats().evictions, 0);
        assert_eq!(c.get(&"b".into()), Some(2));
    }
}
