//! Per-instance manifest cache.

use std::sync::Arc;
use std::time::Duration;

use edge_cache::{CacheStatus, Clock, TtlCache};
use edge_core::RouteManifest;
use edge_store::ObjectStore;
use tracing::debug;

use crate::error::DecisionError;

/// Reads the persisted route manifest, keeping it for a short TTL.
///
/// A deploy that replaces the manifest is seen by this instance at most
/// one TTL later. Read failures are never cached.
pub struct ManifestCache {
    store: Arc<dyn ObjectStore>,
    key: String,
    cache: TtlCache<Arc<RouteManifest>>,
}

impl ManifestCache {
    pub fn new(store: Arc<dyn ObjectStore>, key: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            key: key.into(),
            cache: TtlCache::new(ttl),
        }
    }

    pub fn with_clock(
        store: Arc<dyn ObjectStore>,
        key: impl Into<String>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            key: key.into(),
            cache: TtlCache::with_clock(ttl, clock),
        }
    }

    /// Store key of the manifest.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The current manifest.
    pub async fn load(&self) -> Result<(Arc<RouteManifest>, CacheStatus), DecisionError> {
        let (manifest, status) = self
            .cache
            .get_or_try_insert_with(&self.key, || self.fetch())
            .await?;
        debug!(key = %self.key, cache = %status, routes = manifest.len(), "route manifest");
        Ok((manifest, status))
    }

    /// Forget the cached manifest.
    pub fn invalidate(&self) {
        self.cache.invalidate(&self.key);
    }

    async fn fetch(&self) -> Result<Arc<RouteManifest>, DecisionError> {
        let bytes = self
            .store
            .get(&self.key)
            .await?
            .ok_or_else(|| DecisionError::ManifestMissing {
                key: self.key.clone(),
            })?;
        Ok(Arc::new(RouteManifest::from_json(&bytes)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_cache::ManualClock;
    use edge_store::{MemoryStore, ObjectStoreExt};

    const KEY: &str = "_isr/routes.json";

    async fn publish(store: &MemoryStore, patterns: &[&str]) {
        let manifest = RouteManifest::compile(patterns).unwrap();
        store.put_string(KEY, &manifest.to_json().unwrap()).await.unwrap();
    }

    #[tokio::test]
    async fn test_staleness_window() {
        let store = Arc::new(MemoryStore::new("site"));
        publish(&store, &["/product/:id"]).await;
        let clock = Arc::new(ManualClock::new());
        let cache = ManifestCache::with_clock(store.clone(), KEY, Duration::from_secs(300), clock.clone());

        let (manifest, status) = cache.load().await.unwrap();
        assert_eq!(status, CacheStatus::Miss);
        assert!(manifest.match_path("/product/42").is_some());

        publish(&store, &["/blog/:slug"]).await;

        clock.advance(Duration::from_secs(299));
        let (stale, status) = cache.load().await.unwrap();
        assert_eq!(status, CacheStatus::Hit);
        assert!(stale.match_path("/product/42").is_some());
        assert!(stale.match_path("/blog/hello").is_none());

        clock.advance(Duration::from_secs(2));
        let (fresh, status) = cache.load().await.unwrap();
        assert_eq!(status, CacheStatus::Expired);
        assert!(fresh.match_path("/product/42").is_none());
        assert!(fresh.match_path("/blog/hello").is_some());
    }

    #[tokio::test]
    async fn test_missing_manifest_is_not_cached() {
        let store = Arc::new(MemoryStore::new("site"));
        let cache = ManifestCache::new(store.clone(), KEY, Duration::from_secs(300));

        assert!(matches!(
            cache.load().await.unwrap_err(),
            DecisionError::ManifestMissing { .. }
        ));

        publish(&store, &["/product/:id"]).await;
        assert_eq!(cache.load().await.unwrap().0.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_manifest() {
        let store = Arc::new(MemoryStore::new("site"));
        store
            .put_string(KEY, r#"{"version":2,"routes":[]}"#)
            .await
            .unwrap();
        let cache = ManifestCache::new(store, KEY, Duration::from_secs(300));
        assert!(matches!(cache.load().await.unwrap_err(), DecisionError::Manifest(_)));
    }
}
