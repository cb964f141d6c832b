//! Metadata generator contract.

use std::future::Future;

use async_trait::async_trait;
use edge_core::RouteParams;
use edge_patch::Metadata;
use serde_json::Value;

/// Integrator-supplied metadata source for one route.
///
/// Must be safe to call repeatedly with the same parameters. `Ok(None)`
/// means the instance does not exist; an error is treated the same way.
#[async_trait]
pub trait MetadataGenerator: Send + Sync {
    async fn generate(&self, params: &RouteParams) -> anyhow::Result<Option<Metadata>>;
}

/// Generator backed by an async closure.
pub struct FnGenerator<F> {
    f: F,
}

/// Wrap an async closure as a generator.
///
/// ```rust,ignore
/// let generator = from_fn(|params| async move {
///     Ok(Some(Metadata::new(format!("Product {}", params["id"]))))
/// });
/// ```
pub fn from_fn<F, Fut>(f: F) -> FnGenerator<F>
where
    F: Fn(RouteParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Option<Metadata>>> + Send + 'static,
{
    FnGenerator { f }
}

#[async_trait]
impl<F, Fut> MetadataGenerator for FnGenerator<F>
where
    F: Fn(RouteParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Option<Metadata>>> + Send + 'static,
{
    async fn generate(&self, params: &RouteParams) -> anyhow::Result<Option<Metadata>> {
        (self.f)(params.clone()).await
    }
}

/// Generator that fills a static JSON metadata document.
///
/// Every string in the document may reference parameters as `{name}`.
/// A `null` document yields no metadata.
#[derive(Debug, Clone)]
pub struct JsonMetadataGenerator {
    document: Value,
}

impl JsonMetadataGenerator {
    /// Create a generator from a metadata document.
    pub fn new(document: Value) -> Self {
        Self { document }
    }

    /// The document before interpolation.
    pub fn document(&self) -> &Value {
        &self.document
    }
}

#[async_trait]
impl MetadataGenerator for JsonMetadataGenerator {
    async fn generate(&self, params: &RouteParams) -> anyhow::Result<Option<Metadata>> {
        if self.document.is_null() {
            return Ok(None);
        }
        let mut document = self.document.clone();
        interpolate(&mut document, params);
        Ok(Some(serde_json::from_value(document)?))
    }
}

fn interpolate(value: &mut Value, params: &RouteParams) {
    match value {
        Value::String(s) if s.contains('{') => {
            for (name, v) in params {
                *s = s.replace(&format!("{{{}}}", name), v);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|v| interpolate(v, params)),
        Value::Object(map) => map.values_mut().for_each(|v| interpolate(v, params)),
        _ => {}
    }
}
