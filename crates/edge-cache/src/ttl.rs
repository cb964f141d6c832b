//! Short-lived per-instance cache.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};

/// Status of a cache lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Fresh entry found.
    Hit,
    /// No entry.
    Miss,
    /// Entry found but past its TTL; it has been evicted.
    Expired,
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hit => write!(f, "HIT"),
            Self::Miss => write!(f, "MISS"),
            Self::Expired => write!(f, "EXPIRED"),
        }
    }
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// Per-instance cache with a single TTL and an injectable clock.
///
/// Values are cloned out, so `V` is usually an `Arc`. The lock is never held
/// across an await; two concurrent misses both load and the later insert
/// wins.
pub struct TtlCache<V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, Entry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache on the system clock.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create a cache on a given clock.
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a key, evicting it if expired.
    pub fn lookup(&self, key: &str) -> (Option<V>, CacheStatus) {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if now.saturating_duration_since(entry.stored_at) < self.ttl => {
                (Some(entry.value.clone()), CacheStatus::Hit)
            }
            Some(_) => {
                entries.remove(key);
                (None, CacheStatus::Expired)
            }
            None => (None, CacheStatus::Miss),
        }
    }

    /// Get a fresh value.
    pub fn get(&self, key: &str) -> Option<V> {
        self.lookup(key).0
    }

    /// Store a value, replacing any previous entry.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        let entry = Entry {
            value,
            stored_at: self.clock.now(),
        };
        self.entries.lock().insert(key.into(), entry);
    }

    /// Drop an entry.
    pub fn invalidate(&self, key: &str) {
        self.entries.lock().remove(key);
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of stored entries, including ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return a fresh value or load and cache it.
    ///
    /// Load errors are returned and nothing is cached.
    pub async fn get_or_try_insert_with<F, Fut, E>(
        &self,
        key: &str,
        load: F,
    ) -> Result<(V, CacheStatus), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let (cached, status) = self.lookup(key);
        if let Some(value) = cached {
            return Ok((value, status));
        }

        let value = load().await?;
        self.insert(key, value.clone());
        Ok((value, status))
    }
}

impl<V> std::fmt::Debug for TtlCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn cache(ttl_secs: u64) -> (TtlCache<String>, ManualClock) {
        let clock = ManualClock::new();
        let cache = TtlCache::with_clock(Duration::from_secs(ttl_secs), Arc::new(clock.clone()));
        (cache, clock)
    }

    #[test]
    fn test_hit_within_ttl() {
        let (cache, clock) = cache(300);
        cache.insert("routes", "v1".to_string());
        clock.advance(Duration::from_secs(299));
        assert_eq!(cache.lookup("routes"), (Some("v1".to_string()), CacheStatus::Hit));
    }

    #[test]
    fn test_expires_at_ttl() {
        let (cache, clock) = cache(300);
        cache.insert("routes", "v1".to_string());
        clock.advance(Duration::from_secs(300));
        assert_eq!(cache.lookup("routes"), (None, CacheStatus::Expired));
        assert!(cache.is_empty());
        assert_eq!(cache.lookup("routes").1, CacheStatus::Miss);
    }

    #[test]
    fn test_zero_ttl_never_hits() {
        let (cache, _clock) = cache(0);
        cache.insert("k", "v".to_string());
        assert_eq!(cache.get("k"), None);
    }

    #[tokio::test]
    async fn test_get_or_insert_serves_stale_window_then_reloads() {
        let (cache, clock) = cache(60);

        let (v, status) = cache
            .get_or_try_insert_with("m", || async { Ok::<_, ()>("old".to_string()) })
            .await
            .unwrap();
        assert_eq!((v.as_str(), status), ("old", CacheStatus::Miss));

        // a deploy happened; the cached copy is still served inside the window
        clock.advance(Duration::from_secs(30));
        let (v, status) = cache
            .get_or_try_insert_with("m", || async { Ok::<_, ()>("new".to_string()) })
            .await
            .unwrap();
        assert_eq!((v.as_str(), status), ("old", CacheStatus::Hit));

        clock.advance(Duration::from_secs(31));
        let (v, status) = cache
            .get_or_try_insert_with("m", || async { Ok::<_, ()>("new".to_string()) })
            .await
            .unwrap();
        assert_eq!((v.as_str(), status), ("new", CacheStatus::Expired));
    }

    #[tokio::test]
    async fn test_load_error_is_not_cached() {
        let (cache, _clock) = cache(60);
        let result = cache
            .get_or_try_insert_with("m", || async { Err::<String, _>("boom") })
            .await;
        assert_eq!(result.unwrap_err(), "boom");
        assert!(cache.is_empty());
    }
}
