use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use edge_cache::Clock;
use edge_core::{
    artifact_key, payload_key, RenderConfig, RoutePattern, DEFAULT_TEMPLATE_FILENAME,
};
use edge_patch::{patch_document, substitute_document, Document, DocumentPatch};
use edge_store::{ObjectStore, ObjectStoreExt};
use tracing::{debug, error, info, warn};

use crate::error::{NotFoundReason, RenderResult};
use crate::hooks::RouteRegistry;
use crate::request::{RenderOutcome, RenderRequest, RenderResponse};
use crate::segments::{derive_segments, SegmentTarget};
use crate::template::TemplateLoader;

/// Anything that can materialize a route instance.
#[async_trait]
pub trait Render: Send + Sync {
    async fn render(&self, request: &RenderRequest) -> RenderResponse;
}

/// The on-demand renderer.
///
/// Every body is built before anything is written. Writes go straight to
/// the store with no locking: two concurrent renders of the same path both
/// complete and the last write wins. The document is written first and its
/// plain payload and segment files follow; a failed write removes what the
/// render already wrote.
pub struct Renderer {
    store: Arc<dyn ObjectStore>,
    routes: RouteRegistry,
    patterns: BTreeMap<String, RoutePattern>,
    templates: TemplateLoader,
    template_filename: String,
    config: RenderConfig,
}

impl Renderer {
    /// Create a renderer with default configuration.
    pub fn new(store: Arc<dyn ObjectStore>, routes: RouteRegistry) -> Self {
        Self::with_config(store, routes, RenderConfig::default(), DEFAULT_TEMPLATE_FILENAME)
    }

    /// Create a renderer.
    pub fn with_config(
        store: Arc<dyn ObjectStore>,
        routes: RouteRegistry,
        config: RenderConfig,
        template_filename: impl Into<String>,
    ) -> Self {
        let template_filename = template_filename.into();
        let mut patterns = BTreeMap::new();
        for pattern in routes.patterns() {
            match RoutePattern::compile(pattern) {
                Ok(route) => {
                    patterns.insert(pattern.to_string(), route);
                }
                Err(e) => warn!(pattern, error = %e, "ignoring hooks for invalid pattern"),
            }
        }
        let templates = TemplateLoader::new(
            store.clone(),
            template_filename.clone(),
            config.template_ttl(),
        );
        Self {
            store,
            routes,
            patterns,
            templates,
            template_filename,
            config,
        }
    }

    /// Use an explicit clock for the template cache.
    pub fn with_template_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.templates = TemplateLoader::with_clock(
            self.store.clone(),
            self.template_filename.clone(),
            self.config.template_ttl(),
            clock,
        );
        self
    }

    /// Renderer configuration.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// The store artifacts are written to.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Render one instance, reporting the detailed outcome.
    pub async fn render_outcome(&self, request: &RenderRequest) -> RenderOutcome {
        let outcome = match self.try_render(request).await {
            Ok(outcome) => outcome,
            Err(e) => RenderOutcome::Failed(e),
        };

        match &outcome {
            RenderOutcome::Rendered { key, .. } => {
                info!(path = %request.path, pattern = %request.pattern, key = %key, "rendered instance");
            }
            RenderOutcome::Existing { key, .. } => {
                debug!(path = %request.path, key = %key, "instance already rendered");
            }
            RenderOutcome::NotFound(reason) => {
                info!(path = %request.path, pattern = %request.pattern, reason = %reason, "nothing to render");
            }
            RenderOutcome::Failed(e) => {
                error!(path = %request.path, pattern = %request.pattern, error = %e, "render failed");
            }
        }
        outcome
    }

    async fn try_render(&self, request: &RenderRequest) -> RenderResult<RenderOutcome> {
        let (Some(route), Some(hooks)) = (
            self.patterns.get(&request.pattern),
            self.routes.get(&request.pattern),
        ) else {
            return Ok(RenderOutcome::NotFound(NotFoundReason::UnknownPattern(
                request.pattern.clone(),
            )));
        };

        if let Some(name) = route
            .param_names()
            .iter()
            .find(|name| !request.params.contains_key(*name))
        {
            return Ok(RenderOutcome::NotFound(NotFoundReason::MissingParam(name.clone())));
        }

        if !hooks.accepts(&request.params) {
            return Ok(RenderOutcome::NotFound(NotFoundReason::ValidationRejected));
        }

        let key = artifact_key(&request.path);
        if let Some(html) = self.store.get_string(&key).await? {
            return Ok(RenderOutcome::Existing { key, html });
        }

        let (template, cache) = self.templates.load(route).await?;
        debug!(key = %template.key, cache = %cache, "using fallback template");
        let html = substitute_document(&template.html, &request.params)?;

        let meta = match hooks.generator.generate(&request.params).await {
            Ok(Some(meta)) => meta,
            Ok(None) => return Ok(RenderOutcome::NotFound(NotFoundReason::NoMetadata)),
            Err(e) => {
                warn!(pattern = %request.pattern, error = %e, "metadata generator failed");
                return Ok(RenderOutcome::NotFound(NotFoundReason::GeneratorFailed(
                    e.to_string(),
                )));
            }
        };

        let patch = DocumentPatch::from(&meta);
        let html = patch_document(&html, &patch)?;

        let doc = Document::parse(&html)?;
        let payload = if doc.has_payload() {
            Some(doc.payload_text()?)
        } else {
            None
        };

        let mut siblings = Vec::new();
        if self.config.emit_payload_variant {
            if let Some(text) = &payload {
                siblings.push((payload_key(&request.path), text.clone().into_bytes()));
            }
        }

        if self.config.derive_segments {
            if let Some(info) = template.info.as_ref().filter(|i| i.pattern == request.pattern) {
                let segments = derive_segments(
                    self.store.as_ref(),
                    SegmentTarget {
                        route,
                        reference_path: &info.reference_path,
                        reference_params: &info.reference_params,
                        path: &request.path,
                        params: &request.params,
                        patch: &patch,
                        payload: payload.as_deref().unwrap_or_default(),
                    },
                )
                .await?;
                siblings.extend(segments);
            }
        }

        self.persist(&key, &html, siblings).await?;
        Ok(RenderOutcome::Rendered { key, html })
    }

    /// Write the document, then its siblings. If any write fails, everything
    /// this call wrote is removed again.
    async fn persist(
        &self,
        key: &str,
        html: &str,
        siblings: Vec<(String, Vec<u8>)>,
    ) -> RenderResult<()> {
        self.store.put_string(key, html).await?;
        let mut written = vec![key.to_string()];
        for (sibling, body) in siblings {
            if let Err(e) = self.store.put(&sibling, body).await {
                self.remove_partial(&written).await;
                return Err(e.into());
            }
            written.push(sibling);
        }
        debug!(key = %key, siblings = written.len() - 1, "persisted instance");
        Ok(())
    }

    async fn remove_partial(&self, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.store.delete(key).await {
                warn!(key = %key, error = %e, "could not remove partial artifact");
            }
        }
    }
}

#[async_trait]
impl Render for Renderer {
    async fn render(&self, request: &RenderRequest) -> RenderResponse {
        self.render_outcome(request).await.into_response()
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("patterns", &self.patterns.keys().collect::<Vec<_>>())
            .field("template_filename", &self.template_filename)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::generator::{from_fn, MetadataGenerator};
    use edge_core::RouteParams;
    use edge_patch::Metadata;
    use edge_store::{MemoryStore, StoreError, StoreResult};
    use edge_template::{TemplateGenerator, TemplateInfo};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const EXAMPLE: &str = concat!(
        r#"<!DOCTYPE html><html><head><meta charSet="utf-8"/><title>Widget 9</title>"#,
        r#"<meta name="description" content="The ninth widget"/></head>"#,
        r#"<body><main><h1>Widget 9</h1></main>"#,
        r#"<script>self.__next_f.push([1,"0:{\"c\":[\"\",\"product\",\"9\"],\"t\":[\"id\",\"9\",\"d\"]}\n"])</script>"#,
        r#"<script>self.__next_f.push([1,"1:[\"$\",\"$L2\",null,{\"params\":{\"id\":\"9\"}}]\n2:[[\"$\",\"meta\",\"0\",{\"charSet\":\"utf-8\"}],[\"$\",\"title\",\"1\",{\"children\":\"Widget 9\"}]]\n"])</script>"#,
        r#"</body></html>"#
    );

    // Same page with rows 1 and 2 split across payload chunks.
    const SPLIT_EXAMPLE: &str = concat!(
        r#"<!DOCTYPE html><html><head><meta charSet="utf-8"/><title>Widget 9</title></head>"#,
        r#"<body><main><h1>Widget 9</h1></main>"#,
        r#"<script>self.__next_f.push([1,"0:{\"c\":[\"\",\"product\",\"9\"],\"t\":[\"id\",\"9\",\"d\"]}\n1:[\"$\",\"$L2\",null,{\"par"])</script>"#,
        r#"<script>self.__next_f.push([1,"ams\":{\"id\":\"9\"}}]\n2:[[\"$\",\"meta\",\"0\",{\"charSet\":\"utf-8\"}],[\"$\",\"title\",\"1\",{\"chil"])</script>"#,
        r#"<script>self.__next_f.push([1,"dren\":\"Widget 9\"}]]\n"])</script>"#,
        r#"</body></html>"#
    );

    /// Memory store whose puts fail for keys with a given suffix.
    struct FailingPuts {
        inner: MemoryStore,
        suffix: &'static str,
    }

    #[async_trait]
    impl ObjectStore for FailingPuts {
        fn bucket(&self) -> &str {
            self.inner.bucket()
        }

        async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, body: Vec<u8>) -> StoreResult<()> {
            if key.ends_with(self.suffix) {
                return Err(StoreError::Backend(format!("put {} refused", key)));
            }
            self.inner.put(key, body).await
        }

        async fn exists(&self, key: &str) -> StoreResult<bool> {
            self.inner.exists(key).await
        }

        async fn list(&self, prefix: &str) -> StoreResult<Vec<String>> {
            self.inner.list(prefix).await
        }

        async fn delete(&self, key: &str) -> StoreResult<()> {
            self.inner.delete(key).await
        }
    }

    fn params(id: &str) -> RouteParams {
        [("id".to_string(), id.to_string())].into()
    }

    fn request(id: &str) -> RenderRequest {
        RenderRequest::new(format!("/product/{}", id), "site", "/product/:id", params(id))
    }

    async fn deployed_store() -> Arc<MemoryStore> {
        deployed_store_from(EXAMPLE).await
    }

    async fn deployed_store_from(example: &str) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new("site"));
        let route = RoutePattern::compile("/product/:id").unwrap();
        let template = TemplateGenerator::default()
            .templatize(example, &route, &params("9"))
            .unwrap();
        let info = TemplateInfo {
            pattern: "/product/:id".to_string(),
            param_names: vec!["id".to_string()],
            reference_path: "/product/9".to_string(),
            reference_params: params("9"),
        };
        store.put_string("product/_fallback.html", &template).await.unwrap();
        store
            .put_string("product/_fallback.json", &info.to_json().unwrap())
            .await
            .unwrap();
        store
    }

    fn counting_generator(calls: Arc<AtomicUsize>) -> Arc<dyn MetadataGenerator> {
        Arc::new(from_fn(move |params: RouteParams| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let id = params.get("id").cloned().unwrap_or_default();
                anyhow::Ok(Some(
                    Metadata::new(format!("Widget {}", id))
                        .with_description(format!("Widget number {}", id)),
                ))
            }
        }))
    }

    fn renderer(store: Arc<MemoryStore>, calls: Arc<AtomicUsize>) -> Renderer {
        let routes = RouteRegistry::new().route("/product/:id", counting_generator(calls));
        Renderer::new(store, routes)
    }

    #[tokio::test]
    async fn test_render_then_existing() {
        let store = deployed_store().await;
        let calls = Arc::new(AtomicUsize::new(0));
        let renderer = renderer(store.clone(), calls.clone());

        let first = renderer.render_outcome(&request("42")).await;
        let RenderOutcome::Rendered { key, html } = first else {
            panic!("expected rendered, got {:?}", first);
        };
        assert_eq!(key, "product/42.html");
        assert!(html.contains("<title>Widget 42</title>"));
        assert!(html.contains(r#"<meta name="description" content="Widget number 42"/>"#));
        assert!(!html.contains("ISR_PARAM"));
        assert_eq!(store.get_string(&key).await.unwrap().unwrap(), html);

        let payload = Document::parse(&html).unwrap().payload_text().unwrap();
        assert!(payload.contains(r#"{"c":["","product","42"],"t":["id","42","d"]}"#));
        assert!(payload.contains(r#"{"params":{"id":"42"}}"#));
        assert!(payload.contains(r#""children":"Widget 42""#));

        let second = renderer.render_outcome(&request("42")).await;
        let RenderOutcome::Existing { key: again, html: same } = second else {
            panic!("expected existing, got {:?}", second);
        };
        assert_eq!(again, key);
        assert_eq!(same, html);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_renders_both_succeed() {
        let store = deployed_store().await;
        let renderer = renderer(store.clone(), Arc::new(AtomicUsize::new(0)));
        let req = request("42");

        let (a, b) = tokio::join!(renderer.render(&req), renderer.render(&req));
        assert!(a.is_success());
        assert!(b.is_success());

        let stored = store.get_string("product/42.html").await.unwrap().unwrap();
        assert_eq!(Some(stored), a.html);
        assert_eq!(a.html, b.html);
    }

    #[tokio::test]
    async fn test_payload_variant_and_segments() {
        let store = deployed_store().await;
        store
            .put_string("product/9.segments/_tree.segment.rsc", "0:{\"c\":[\"\",\"product\",\"9\"]}\n")
            .await
            .unwrap();
        store
            .put_string("product/9.segments/_full.segment.rsc", "stale")
            .await
            .unwrap();
        let renderer = renderer(store.clone(), Arc::new(AtomicUsize::new(0)));

        let response = renderer.render(&request("42")).await;
        assert_eq!(response.status_code, 200);

        let html = response.html.unwrap();
        let payload = Document::parse(&html).unwrap().payload_text().unwrap();
        assert_eq!(store.get_string("product/42.txt").await.unwrap().unwrap(), payload);
        assert_eq!(
            store
                .get_string("product/42.segments/_full.segment.rsc")
                .await
                .unwrap()
                .unwrap(),
            payload
        );
        assert_eq!(
            store
                .get_string("product/42.segments/_tree.segment.rsc")
                .await
                .unwrap()
                .unwrap(),
            "0:{\"c\":[\"\",\"product\",\"42\"]}\n"
        );
    }

    #[tokio::test]
    async fn test_variants_can_be_disabled() {
        let store = deployed_store().await;
        store
            .put_string("product/9.segments/_tree.segment.rsc", "0:{}\n")
            .await
            .unwrap();
        let routes = RouteRegistry::new()
            .route("/product/:id", counting_generator(Arc::new(AtomicUsize::new(0))));
        let config = RenderConfig {
            emit_payload_variant: false,
            derive_segments: false,
            ..RenderConfig::default()
        };
        let renderer = Renderer::with_config(store.clone(), routes, config, "_fallback.html");

        assert!(renderer.render(&request("42")).await.is_success());
        assert!(!store.exists("product/42.txt").await.unwrap());
        assert!(store.list("product/42.segments/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_template_fails_without_writing() {
        let store = Arc::new(MemoryStore::new("site"));
        let renderer = renderer(store.clone(), Arc::new(AtomicUsize::new(0)));

        let outcome = renderer.render_outcome(&request("42")).await;
        assert!(matches!(outcome, RenderOutcome::Failed(RenderError::TemplateMissing { .. })));
        assert!(store.is_empty());

        let response = renderer.render(&request("42")).await;
        assert_eq!(response.status_code, 500);
    }

    #[tokio::test]
    async fn test_no_metadata_is_not_found() {
        let store = deployed_store().await;
        let before = store.keys();
        let routes = RouteRegistry::new().route(
            "/product/:id",
            Arc::new(from_fn(|_: RouteParams| async { anyhow::Ok(None::<Metadata>) })),
        );
        let renderer = Renderer::new(store.clone(), routes);

        let outcome = renderer.render_outcome(&request("404")).await;
        assert!(matches!(outcome, RenderOutcome::NotFound(NotFoundReason::NoMetadata)));
        assert_eq!(store.keys(), before);
    }

    #[tokio::test]
    async fn test_generator_error_is_not_found() {
        let store = deployed_store().await;
        let before = store.keys();
        let routes = RouteRegistry::new().route(
            "/product/:id",
            Arc::new(from_fn(|_: RouteParams| async {
                Err::<Option<Metadata>, _>(anyhow::anyhow!("catalog unavailable"))
            })),
        );
        let renderer = Renderer::new(store.clone(), routes);

        let response = renderer.render(&request("42")).await;
        assert_eq!(response.status_code, 404);
        assert!(response.body.contains("catalog unavailable"));
        assert_eq!(store.keys(), before);
    }

    #[tokio::test]
    async fn test_validator_rejects_before_reading() {
        let store = deployed_store().await;
        let calls = Arc::new(AtomicUsize::new(0));
        let routes = RouteRegistry::new()
            .route("/product/:id", counting_generator(calls.clone()))
            .validate(
                "/product/:id",
                Arc::new(|p: &RouteParams| {
                    p.get("id").is_some_and(|id| id.chars().all(|c| c.is_ascii_digit()))
                }),
            );
        let renderer = Renderer::new(store.clone(), routes);

        let outcome = renderer.render_outcome(&request("abc")).await;
        assert!(matches!(outcome, RenderOutcome::NotFound(NotFoundReason::ValidationRejected)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!store.exists("product/abc.html").await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_pattern_and_missing_param() {
        let store = deployed_store().await;
        let renderer = renderer(store, Arc::new(AtomicUsize::new(0)));

        let unknown = RenderRequest::new("/blog/x", "site", "/blog/:slug", RouteParams::new());
        assert!(matches!(
            renderer.render_outcome(&unknown).await,
            RenderOutcome::NotFound(NotFoundReason::UnknownPattern(_))
        ));

        let missing = RenderRequest::new("/product/1", "site", "/product/:id", RouteParams::new());
        assert!(matches!(
            renderer.render_outcome(&missing).await,
            RenderOutcome::NotFound(NotFoundReason::MissingParam(ref name)) if name == "id"
        ));
    }

    #[tokio::test]
    async fn test_split_payload_rows_are_retargeted() {
        let store = deployed_store_from(SPLIT_EXAMPLE).await;
        let renderer = renderer(store.clone(), Arc::new(AtomicUsize::new(0)));

        let response = renderer.render(&request("42")).await;
        assert_eq!(response.status_code, 200);

        let html = response.html.unwrap();
        let payload = Document::parse(&html).unwrap().payload_text().unwrap();
        assert!(payload.contains(r#"{"params":{"id":"42"}}"#));
        assert!(payload.contains(r#""children":"Widget 42""#));
        assert!(!payload.contains(r#""id":"9""#));
        assert!(!payload.contains("Widget 9"));
    }

    async fn assert_failed_write_leaves_nothing(suffix: &'static str) {
        let deployed = deployed_store().await;
        store_segments(&deployed).await;
        let before = deployed.keys();
        let store = Arc::new(FailingPuts {
            inner: (*deployed).clone(),
            suffix,
        });
        let routes = RouteRegistry::new()
            .route("/product/:id", counting_generator(Arc::new(AtomicUsize::new(0))));
        let renderer = Renderer::new(store, routes);

        let outcome = renderer.render_outcome(&request("42")).await;
        assert!(matches!(outcome, RenderOutcome::Failed(RenderError::Store(_))));
        assert_eq!(deployed.keys(), before);
    }

    async fn store_segments(store: &MemoryStore) {
        store
            .put_string("product/9.segments/_tree.segment.rsc", "0:{\"c\":[\"\",\"product\",\"9\"]}\n")
            .await
            .unwrap();
        store
            .put_string("product/9.segments/_full.segment.rsc", "full")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_failed_document_write_persists_nothing() {
        assert_failed_write_leaves_nothing(".html").await;
    }

    #[tokio::test]
    async fn test_failed_sibling_write_removes_document() {
        assert_failed_write_leaves_nothing(".txt").await;
        assert_failed_write_leaves_nothing("_tree.segment.rsc").await;
    }
}
