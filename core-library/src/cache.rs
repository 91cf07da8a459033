//! Generic in-memory TTL cache with oldest-first eviction.
//!
//! Decouples cache policy from any particular fetch source: consumers inject
//! an instance wherever a keyed read-through store is needed (track
//! projections, version lists) instead of sharing module-level state.
//!
//! Expiry is lazy: `get` on an expired key removes the entry and reports a
//! miss, so callers can never observe stale data and no background sweep is
//! needed for this cache. Size is bounded cooperatively via
//! [`CacheManager::evict_oldest`], which set-heavy callers run after bulk
//! inserts.

use bridge_traits::time::{Clock, SystemClock};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Default time-to-live for cached values (5 minutes).
///
/// Balances staleness against request volume for read-models that the
/// realtime feed keeps mostly current anyway.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

struct CacheEntry<T> {
    data: T,
    /// Insertion/refresh time in Unix epoch milliseconds.
    timestamp_ms: i64,
    /// Monotonic insertion counter; stabilizes eviction order for entries
    /// sharing a timestamp.
    seq: u64,
}

/// Keyed value store with TTL expiry and oldest-first eviction.
pub struct CacheManager<T> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
    next_seq: Mutex<u64>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> CacheManager<T> {
    /// Create a cache with the given time-to-live.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create a cache with an injected time source.
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            next_seq: Mutex::new(0),
            ttl,
            clock,
        }
    }

    /// Insert or overwrite the value under `key`, stamping it with the
    /// current time.
    pub fn set(&self, key: impl Into<String>, data: T) {
        let key = key.into();
        let seq = {
            let mut next = self.next_seq.lock();
            let seq = *next;
            *next += 1;
            seq
        };
        let entry = CacheEntry {
            data,
            timestamp_ms: self.clock.unix_timestamp_millis(),
            seq,
        };
        self.entries.lock().insert(key, entry);
    }

    /// Look up `key`, returning `None` when missing or expired.
    ///
    /// Reading an expired key evicts it; that eviction is the only way a
    /// read mutates storage.
    pub fn get(&self, key: &str) -> Option<T> {
        let now_ms = self.clock.unix_timestamp_millis();
        let mut entries = self.entries.lock();

        let expired = match entries.get(key) {
            None => return None,
            Some(entry) => self.is_expired(entry.timestamp_ms, now_ms),
        };

        if expired {
            trace!(key, "cache entry expired, evicting");
            entries.remove(key);
            return None;
        }

        entries.get(key).map(|entry| entry.data.clone())
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Remove the entry under `key`, if present.
    pub fn remove(&self, key: &str) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    /// Shrink the cache to at most `max_size` entries by dropping the oldest.
    ///
    /// No-op when the cache already fits. Otherwise the `len - max_size`
    /// entries with the smallest timestamps are removed, ties broken by
    /// insertion order.
    pub fn evict_oldest(&self, max_size: usize) {
        let mut entries = self.entries.lock();
        if entries.len() <= max_size {
            return;
        }

        let excess = entries.len() - max_size;
        let mut order: Vec<(String, i64, u64)> = entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.timestamp_ms, entry.seq))
            .collect();
        order.sort_by(|a, b| (a.1, a.2).cmp(&(b.1, b.2)));

        for (key, _, _) in order.into_iter().take(excess) {
            entries.remove(&key);
        }
        trace!(evicted = excess, "cache shrunk to size bound");
    }

    /// Number of stored entries, including not-yet-collected expired ones.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn is_expired(&self, timestamp_ms: i64, now_ms: i64) -> bool {
        now_ms.saturating_sub(timestamp_ms) > self.ttl.as_millis() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use parking_lot::Mutex as PlMutex;

    /// Deterministic clock advanced by hand.
    struct TestClock {
        now_ms: PlMutex<i64>,
    }

    impl TestClock {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                now_ms: PlMutex::new(1_000),
            })
        }

        fn advance(&self, delta: Duration) {
            *self.now_ms.lock() += delta.as_millis() as i64;
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> DateTime<Utc> {
            Utc.timestamp_millis_opt(*self.now_ms.lock()).unwrap()
        }
    }

    #[test]
    fn get_before_ttl_returns_value_unchanged() {
        let clock = TestClock::new();
        let cache = CacheManager::with_clock(Duration::from_secs(60), clock.clone());

        cache.set("a", 42u32);
        clock.advance(Duration::from_secs(59));
        assert_eq!(cache.get("a"), Some(42));
        // No mutation on a fresh read.
        assert_eq!(cache.get("a"), Some(42));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn get_after_ttl_misses_and_evicts() {
        let clock = TestClock::new();
        let cache = CacheManager::with_clock(Duration::from_secs(60), clock.clone());

        cache.set("a", "value".to_string());
        clock.advance(Duration::from_secs(61));
        assert_eq!(cache.get("a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn set_refreshes_timestamp() {
        let clock = TestClock::new();
        let cache = CacheManager::with_clock(Duration::from_secs(60), clock.clone());

        cache.set("a", 1u32);
        clock.advance(Duration::from_secs(50));
        cache.set("a", 2u32);
        clock.advance(Duration::from_secs(50));
        // 100s since first set, 50s since refresh: still live.
        assert_eq!(cache.get("a"), Some(2));
    }

    #[test]
    fn evict_oldest_keeps_newest_entries() {
        let clock = TestClock::new();
        let cache = CacheManager::with_clock(Duration::from_secs(600), clock.clone());

        for (i, key) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            cache.set(*key, i);
            clock.advance(Duration::from_secs(1));
        }

        cache.evict_oldest(2);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("c"), None);
        assert_eq!(cache.get("d"), Some(3));
        assert_eq!(cache.get("e"), Some(4));
    }

    #[test]
    fn evict_oldest_breaks_timestamp_ties_by_insertion_order() {
        let clock = TestClock::new();
        let cache = CacheManager::with_clock(Duration::from_secs(600), clock.clone());

        // All three share one timestamp.
        cache.set("first", 1);
        cache.set("second", 2);
        cache.set("third", 3);

        cache.evict_oldest(1);
        assert_eq!(cache.get("first"), None);
        assert_eq!(cache.get("second"), None);
        assert_eq!(cache.get("third"), Some(3));
    }

    #[test]
    fn evict_oldest_is_noop_within_bound() {
        let cache: CacheManager<u32> = CacheManager::new(DEFAULT_CACHE_TTL);
        cache.set("a", 1);
        cache.set("b", 2);

        cache.evict_oldest(2);
        assert_eq!(cache.len(), 2);
        cache.evict_oldest(10);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn clear_empties_storage() {
        let cache: CacheManager<u32> = CacheManager::new(DEFAULT_CACHE_TTL);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }
}
