//! Fallback template loading with a per-instance TTL cache.

use std::sync::Arc;
use std::time::Duration;

use edge_cache::{CacheStatus, Clock, TtlCache};
use edge_core::{template_key, RoutePattern};
use edge_store::{ObjectStore, ObjectStoreExt};
use edge_template::TemplateInfo;
use tracing::{debug, warn};

use crate::error::{RenderError, RenderResult};

/// A template as read from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedTemplate {
    /// Store key.
    pub key: String,
    /// Template document.
    pub html: String,
    /// Sidecar, if one was stored and parses.
    pub info: Option<TemplateInfo>,
}

/// Reads templates, caching hits for a short TTL. Misses are never cached,
/// so a template deployed after a miss is picked up on the next read.
pub struct TemplateLoader {
    store: Arc<dyn ObjectStore>,
    filename: String,
    cache: TtlCache<Arc<LoadedTemplate>>,
}

impl TemplateLoader {
    /// Create a loader.
    pub fn new(store: Arc<dyn ObjectStore>, filename: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            filename: filename.into(),
            cache: TtlCache::new(ttl),
        }
    }

    /// Create a loader with an explicit clock.
    pub fn with_clock(
        store: Arc<dyn ObjectStore>,
        filename: impl Into<String>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            filename: filename.into(),
            cache: TtlCache::with_clock(ttl, clock),
        }
    }

    /// Store key of a route's template.
    pub fn key_for(&self, route: &RoutePattern) -> String {
        template_key(route, &self.filename)
    }

    /// Load a route's template.
    pub async fn load(&self, route: &RoutePattern) -> RenderResult<(Arc<LoadedTemplate>, CacheStatus)> {
        let key = self.key_for(route);
        let (template, status) = self
            .cache
            .get_or_try_insert_with(&key, || self.fetch(&key))
            .await?;
        debug!(key = %key, cache = %status, "loaded fallback template");
        Ok((template, status))
    }

    /// Drop every cached template.
    pub fn clear(&self) {
        self.cache.clear();
    }

    async fn fetch(&self, key: &str) -> RenderResult<Arc<LoadedTemplate>> {
        let html = self
            .store
            .get_string(key)
            .await?
            .ok_or_else(|| RenderError::TemplateMissing {
                key: key.to_string(),
            })?;

        let info_key = TemplateInfo::key_for(key);
        let info = match self.store.get(&info_key).await? {
            Some(bytes) => match TemplateInfo::from_json(&bytes) {
                Ok(info) => Some(info),
                Err(e) => {
                    warn!(key = %info_key, error = %e, "ignoring unreadable template sidecar");
                    None
                }
            },
            None => None,
        };

        Ok(Arc::new(LoadedTemplate {
            key: key.to_string(),
            html,
            info,
        }))
    }
}
