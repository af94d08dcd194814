//! Generic in-memory cache with per-entry TTL and lazy expiry.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::warn;

/// A cached value with its storage time and lifetime.
///
/// An entry is live iff `now - stored_at <= ttl`. Reading a non-live entry
/// is equivalent to absence and evicts it.
#[derive(Debug)]
struct CacheEntry<T> {
    value: T,
    stored_at: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn is_live(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) <= self.ttl
    }
}

/// Cache introspection snapshot.
///
/// Reports raw entries without a liveness check: keys whose entries have
/// expired but were not yet lazily evicted are still counted. This is a
/// known approximation, kept so that `stats()` stays a cheap read.
#[derive(Clone, Debug, Serialize)]
pub struct CacheStats {
    /// Number of entries currently in the map.
    pub size: usize,
    /// All keys currently in the map.
    pub keys: Vec<String>,
}

/// Generic key/value store with per-entry time-to-live.
///
/// Expiry is lazy: entries are evicted when a read finds them dead, never
/// by a background task. All operations synchronize on an internal mutex,
/// so a single instance can be shared across concurrent callers.
#[derive(Debug, Default)]
pub struct TtlCache<T> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Store a value under `key`, unconditionally overwriting any previous
    /// entry and resetting its stored time.
    pub fn set(&self, key: &str, value: T, ttl: Duration) {
        self.lock_entries().insert(
            key.to_string(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Fetch the live value under `key`, evicting it first if it expired.
    pub fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.lock_entries();
        let entry = entries.get(key)?;
        if !entry.is_live(Instant::now()) {
            entries.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    /// Whether a live value exists under `key`. Evicts expired entries,
    /// same as [`get`](Self::get).
    pub fn has(&self, key: &str) -> bool {
        let mut entries = self.lock_entries();
        match entries.get(key) {
            None => false,
            Some(entry) if entry.is_live(Instant::now()) => true,
            Some(_) => {
                entries.remove(key);
                false
            }
        }
    }

    /// Remove the entry under `key`, if any. Idempotent.
    pub fn delete(&self, key: &str) {
        self.lock_entries().remove(key);
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.lock_entries().clear();
    }

    /// Introspection snapshot of the raw map. See [`CacheStats`] for the
    /// liveness caveat.
    pub fn stats(&self) -> CacheStats {
        let entries = self.lock_entries();
        CacheStats {
            size: entries.len(),
            keys: entries.keys().cloned().collect(),
        }
    }

    /// Lock the entries mutex, recovering from poison if necessary.
    ///
    /// A poisoned cache mutex only means a panic happened mid-operation;
    /// the map itself is still structurally sound.
    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<T>>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("TTL cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    const LONG_TTL: Duration = Duration::from_secs(60);

    #[test]
    fn test_set_then_get() {
        let cache = TtlCache::new();
        cache.set("stock:INFY", 42u32, LONG_TTL);

        assert_eq!(cache.get("stock:INFY"), Some(42));
        assert!(cache.has("stock:INFY"));
    }

    #[test]
    fn test_get_missing_key() {
        let cache: TtlCache<u32> = TtlCache::new();

        assert_eq!(cache.get("stock:ABSENT"), None);
        assert!(!cache.has("stock:ABSENT"));
    }

    #[test]
    fn test_set_overwrites_and_resets_ttl() {
        let cache = TtlCache::new();
        cache.set("k", 1u32, Duration::from_millis(150));
        sleep(Duration::from_millis(100));

        // Overwrite restarts the clock; the value survives past the
        // original entry's deadline.
        cache.set("k", 2u32, Duration::from_millis(500));
        sleep(Duration::from_millis(100));
        assert_eq!(cache.get("k"), Some(2));
    }

    #[test]
    fn test_live_within_ttl_absent_after() {
        let cache = TtlCache::new();
        cache.set("k", 7u32, Duration::from_millis(500));

        sleep(Duration::from_millis(50));
        assert_eq!(cache.get("k"), Some(7));

        sleep(Duration::from_millis(500));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_expired_read_evicts() {
        let cache = TtlCache::new();
        cache.set("k", 7u32, Duration::from_millis(20));
        sleep(Duration::from_millis(60));

        assert_eq!(cache.stats().size, 1);
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_has_evicts_expired() {
        let cache = TtlCache::new();
        cache.set("k", 7u32, Duration::from_millis(20));
        sleep(Duration::from_millis(60));

        assert!(!cache.has("k"));
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let cache = TtlCache::new();
        cache.set("k", 7u32, LONG_TTL);

        cache.delete("k");
        cache.delete("k");
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_clear_removes_everything() {
        let cache = TtlCache::new();
        cache.set("a", 1u32, LONG_TTL);
        cache.set("b", 2u32, LONG_TTL);

        cache.clear();
        assert_eq!(cache.stats().size, 0);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn test_stats_reports_raw_entries() {
        let cache = TtlCache::new();
        cache.set("live", 1u32, LONG_TTL);
        cache.set("dead", 2u32, Duration::from_millis(20));
        sleep(Duration::from_millis(60));

        // No read has touched "dead" yet, so stats still reports it.
        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert!(stats.keys.contains(&"live".to_string()));
        assert!(stats.keys.contains(&"dead".to_string()));
    }
}
