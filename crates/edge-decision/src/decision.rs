//! The per-request decision.
//!
//! ```text
//! START ── non-document extension ──────────────────────────> FORWARD (static asset)
//!   │
//!   └─ artifact in store ───────────────────────────────────> FORWARD (stored)
//!        │
//!        └─ no route match ─────────────────────────────────> FORWARD (no match)
//!             │
//!             └─ render (bounded) ── ok ────────────────────> FORWARD (rendered)
//!                                  └─ failed / timed out ───> FORWARD (render failed)
//! ```
//!
//! Every branch forwards to the store. Nothing is synthesized here, so the
//! store's own response stays cacheable by the delivery layer.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use edge_cache::Clock;
use edge_core::{artifact_key, RegenConfig, RequestId};
use edge_observability::DecisionMetrics;
use edge_render::{Render, RenderError, RenderOutcome, RenderRequest, RenderResponse};
use edge_store::ObjectStore;
use serde::Serialize;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::manifest::ManifestCache;
use crate::path::{classify_path, route_path, PathKind};

/// Header carrying an upstream request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Why a request was forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForwardReason {
    /// The path names a static asset.
    StaticAsset,
    /// The artifact was already stored.
    Stored,
    /// No dynamic route matches the path.
    NoMatch,
    /// The artifact was rendered and stored just now.
    Rendered,
    /// A render was attempted and did not produce the artifact.
    RenderFailed,
    /// The store could not be read.
    StoreUnavailable,
    /// The route manifest could not be read.
    ManifestUnavailable,
}

impl ForwardReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StaticAsset => "static_asset",
            Self::Stored => "stored",
            Self::NoMatch => "no_match",
            Self::Rendered => "rendered",
            Self::RenderFailed => "render_failed",
            Self::StoreUnavailable => "store_unavailable",
            Self::ManifestUnavailable => "manifest_unavailable",
        }
    }
}

impl fmt::Display for ForwardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one decision. The request is always forwarded to the store.
#[derive(Debug, Clone)]
pub struct Decision {
    pub request_id: RequestId,
    pub reason: ForwardReason,
    /// Artifact key for document requests.
    pub key: Option<String>,
    /// Matched route pattern, when a render was attempted.
    pub pattern: Option<String>,
    /// Renderer reply, when a render was attempted.
    pub render: Option<RenderResponse>,
    pub elapsed: Duration,
}

/// Decision function for one edge instance.
///
/// Holds only per-instance state: the manifest cache and counters.
pub struct EdgeDecision {
    store: Arc<dyn ObjectStore>,
    renderer: Arc<dyn Render>,
    manifest: ManifestCache,
    bucket: String,
    document_extensions: Vec<String>,
    render_timeout: Duration,
    metrics: Arc<DecisionMetrics>,
}

impl EdgeDecision {
    /// Create a decision function from configuration.
    pub fn new(store: Arc<dyn ObjectStore>, renderer: Arc<dyn Render>, config: &RegenConfig) -> Self {
        Self {
            manifest: ManifestCache::new(
                store.clone(),
                config.routes.manifest_key.clone(),
                config.edge.manifest_ttl(),
            ),
            store,
            renderer,
            bucket: config.store.bucket.clone(),
            document_extensions: config.edge.document_extensions.clone(),
            render_timeout: config.render.timeout(),
            metrics: Arc::new(DecisionMetrics::new()),
        }
    }

    /// Use an explicit clock for the manifest cache.
    pub fn with_manifest_clock(mut self, config: &RegenConfig, clock: Arc<dyn Clock>) -> Self {
        self.manifest = ManifestCache::with_clock(
            self.store.clone(),
            config.routes.manifest_key.clone(),
            config.edge.manifest_ttl(),
            clock,
        );
        self
    }

    /// Share counters with another owner.
    pub fn with_metrics(mut self, metrics: Arc<DecisionMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<DecisionMetrics> {
        &self.metrics
    }

    pub fn manifest(&self) -> &ManifestCache {
        &self.manifest
    }

    /// Decide what to do with a request.
    pub async fn decide<B>(&self, request: &http::Request<B>) -> Decision {
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(RequestId::from_string)
            .unwrap_or_else(RequestId::generate);
        let path = request.uri().path().to_string();
        let span = info_span!("decision", request_id = %request_id, path = %path);

        async {
            let started = Instant::now();
            self.metrics.record_request();
            let mut decision = self.decide_path(request_id, &path).await;
            decision.elapsed = started.elapsed();
            info!(
                reason = %decision.reason,
                key = decision.key.as_deref().unwrap_or(""),
                elapsed_us = decision.elapsed.as_micros() as u64,
                "forwarding to store"
            );
            decision
        }
        .instrument(span)
        .await
    }

    async fn decide_path(&self, request_id: RequestId, path: &str) -> Decision {
        let mut decision = Decision {
            request_id,
            reason: ForwardReason::StaticAsset,
            key: None,
            pattern: None,
            render: None,
            elapsed: Duration::ZERO,
        };

        if classify_path(path, &self.document_extensions) == PathKind::Asset {
            self.metrics.record_static_asset();
            return decision;
        }

        // one extension-free page path drives the key, the match and the render
        let page = route_path(path, &self.document_extensions);
        let key = artifact_key(page);
        decision.key = Some(key.clone());
        match self.store.exists(&key).await {
            Ok(true) => {
                self.metrics.record_stored();
                decision.reason = ForwardReason::Stored;
                return decision;
            }
            Ok(false) => {}
            Err(e) => {
                error!(key = %key, error = %e, "artifact lookup failed");
                self.metrics.record_unavailable();
                decision.reason = ForwardReason::StoreUnavailable;
                return decision;
            }
        }

        let manifest = match self.manifest.load().await {
            Ok((manifest, _)) => manifest,
            Err(e) => {
                error!(key = %self.manifest.key(), error = %e, "route manifest unavailable");
                self.metrics.record_unavailable();
                decision.reason = ForwardReason::ManifestUnavailable;
                return decision;
            }
        };

        let Some(matched) = manifest.match_path(page) else {
            debug!("no route matches");
            self.metrics.record_no_match();
            decision.reason = ForwardReason::NoMatch;
            return decision;
        };

        let render = RenderRequest::from_match(page, &self.bucket, &matched);
        decision.pattern = Some(render.pattern.clone());
        let response = self.render(&render).await;
        decision.reason = if response.is_success() {
            ForwardReason::Rendered
        } else {
            ForwardReason::RenderFailed
        };
        decision.render = Some(response);
        decision
    }

    async fn render(&self, request: &RenderRequest) -> RenderResponse {
        self.metrics.record_render_started();
        let started = Instant::now();
        match tokio::time::timeout(self.render_timeout, self.renderer.render(request)).await {
            Ok(response) => {
                let success = response.is_success();
                self.metrics.record_render(started.elapsed(), success);
                if !success {
                    warn!(
                        pattern = %request.pattern,
                        status = response.status_code,
                        body = %response.body,
                        "render produced no artifact"
                    );
                }
                response
            }
            Err(_) => {
                self.metrics.record_render_timeout(started.elapsed());
                let err = RenderError::Timeout(self.render_timeout);
                warn!(pattern = %request.pattern, error = %err, "render abandoned");
                RenderOutcome::Failed(err).into_response()
            }
        }
    }
}

impl fmt::Debug for EdgeDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeDecision")
            .field("bucket", &self.bucket)
            .field("manifest_key", &self.manifest.key())
            .field("render_timeout", &self.render_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use edge_core::RouteManifest;
    use edge_render::NotFoundReason;
    use edge_store::{MemoryStore, ObjectStoreExt};
    use std::sync::Mutex;

    /// Renderer stub that records requests.
    struct Recorder {
        succeed: bool,
        delay: Duration,
        seen: Mutex<Vec<RenderRequest>>,
    }

    impl Recorder {
        fn new(succeed: bool) -> Arc<Self> {
            Self::slow(succeed, Duration::ZERO)
        }

        fn slow(succeed: bool, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                succeed,
                delay,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Render for Recorder {
        async fn render(&self, request: &RenderRequest) -> RenderResponse {
            self.seen.lock().unwrap().push(request.clone());
            tokio::time::sleep(self.delay).await;
            if self.succeed {
                RenderOutcome::Rendered {
                    key: artifact_key(&request.path),
                    html: "<html></html>".to_string(),
                }
            } else {
                RenderOutcome::NotFound(NotFoundReason::NoMetadata)
            }
            .into_response()
        }
    }

    async fn store_with_manifest() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new("site"));
        let manifest = RouteManifest::compile(["/product/:id"]).unwrap();
        store
            .put_string("_isr/routes.json", &manifest.to_json().unwrap())
            .await
            .unwrap();
        store
    }

    fn get(path: &str) -> http::Request<()> {
        http::Request::get(path).body(()).unwrap()
    }

    fn edge(store: Arc<MemoryStore>, renderer: Arc<Recorder>) -> EdgeDecision {
        EdgeDecision::new(store, renderer, &RegenConfig::default())
    }

    #[tokio::test]
    async fn test_static_asset_forwards_without_lookup() {
        let renderer = Recorder::new(true);
        let edge = edge(Arc::new(MemoryStore::new("site")), renderer.clone());

        let decision = edge.decide(&get("/_next/static/app.js")).await;
        assert_eq!(decision.reason, ForwardReason::StaticAsset);
        assert!(decision.key.is_none());
        assert_eq!(renderer.calls(), 0);
    }

    #[tokio::test]
    async fn test_stored_artifact_forwards() {
        let store = store_with_manifest().await;
        store.put_string("product/42.html", "<html></html>").await.unwrap();
        let renderer = Recorder::new(true);
        let edge = edge(store, renderer.clone());

        let decision = edge.decide(&get("/product/42/")).await;
        assert_eq!(decision.reason, ForwardReason::Stored);
        assert_eq!(decision.key.as_deref(), Some("product/42.html"));
        assert_eq!(renderer.calls(), 0);
    }

    #[tokio::test]
    async fn test_no_match_forwards() {
        let renderer = Recorder::new(true);
        let edge = edge(store_with_manifest().await, renderer.clone());

        let decision = edge.decide(&get("/about?ref=nav")).await;
        assert_eq!(decision.reason, ForwardReason::NoMatch);
        assert_eq!(decision.key.as_deref(), Some("about.html"));
        assert_eq!(renderer.calls(), 0);
    }

    #[tokio::test]
    async fn test_match_invokes_renderer() {
        let renderer = Recorder::new(true);
        let edge = edge(store_with_manifest().await, renderer.clone());

        let decision = edge.decide(&get("/product/42.html")).await;
        assert_eq!(decision.reason, ForwardReason::Rendered);
        assert_eq!(decision.pattern.as_deref(), Some("/product/:id"));

        let seen = renderer.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].bucket, "site");
        assert_eq!(seen[0].params["id"], "42");
    }

    #[tokio::test]
    async fn test_document_extensions_share_one_key() {
        let store = store_with_manifest().await;
        store.put_string("product/7.html", "<html></html>").await.unwrap();
        let renderer = Recorder::new(true);
        let edge = edge(store, renderer.clone());

        let stored = edge.decide(&get("/product/7.HTM")).await;
        assert_eq!(stored.reason, ForwardReason::Stored);
        assert_eq!(stored.key.as_deref(), Some("product/7.html"));

        let rendered = edge.decide(&get("/product/42.htm")).await;
        assert_eq!(rendered.reason, ForwardReason::Rendered);
        assert_eq!(rendered.key.as_deref(), Some("product/42.html"));

        let seen = renderer.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].path, "/product/42");
        assert_eq!(artifact_key(&seen[0].path), "product/42.html");
    }

    #[tokio::test]
    async fn test_render_failure_still_forwards() {
        let edge = edge(store_with_manifest().await, Recorder::new(false));

        let decision = edge.decide(&get("/product/404")).await;
        assert_eq!(decision.reason, ForwardReason::RenderFailed);
        assert_eq!(decision.render.unwrap().status_code, 404);
        assert_eq!(edge.metrics().snapshot().renders_failed, 1);
    }

    #[tokio::test]
    async fn test_render_timeout() {
        let mut config = RegenConfig::default();
        config.render.timeout_ms = 20;
        let renderer = Recorder::slow(true, Duration::from_secs(30));
        let edge = EdgeDecision::new(store_with_manifest().await, renderer, &config);

        let decision = edge.decide(&get("/product/42")).await;
        assert_eq!(decision.reason, ForwardReason::RenderFailed);
        let response = decision.render.unwrap();
        assert_eq!(response.status_code, 500);
        assert!(response.body.contains("timed out"));

        let snapshot = edge.metrics().snapshot();
        assert_eq!(snapshot.render_timeouts, 1);
        assert_eq!(snapshot.renders_started, 1);
    }

    #[tokio::test]
    async fn test_missing_manifest_forwards() {
        let edge = edge(Arc::new(MemoryStore::new("site")), Recorder::new(true));
        let decision = edge.decide(&get("/product/42")).await;
        assert_eq!(decision.reason, ForwardReason::ManifestUnavailable);
        assert_eq!(edge.metrics().snapshot().unavailable, 1);
    }

    #[tokio::test]
    async fn test_request_id_header() {
        let edge = edge(store_with_manifest().await, Recorder::new(true));
        let request = http::Request::get("/about")
            .header(REQUEST_ID_HEADER, "req-123")
            .body(())
            .unwrap();
        let decision = edge.decide(&request).await;
        assert_eq!(decision.request_id.to_string(), "req-123");
    }
}
