//! Per-route hooks: metadata generator and optional parameter validator.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use edge_core::RouteParams;
use serde_json::Value;

use crate::generator::{JsonMetadataGenerator, MetadataGenerator};

/// Accepts or rejects parameters before anything is rendered.
pub trait ParamValidator: Send + Sync {
    fn validate(&self, params: &RouteParams) -> bool;
}

impl<F> ParamValidator for F
where
    F: Fn(&RouteParams) -> bool + Send + Sync,
{
    fn validate(&self, params: &RouteParams) -> bool {
        self(params)
    }
}

/// Hooks registered for one route pattern.
#[derive(Clone)]
pub struct RouteHooks {
    pub generator: Arc<dyn MetadataGenerator>,
    pub validator: Option<Arc<dyn ParamValidator>>,
}

impl RouteHooks {
    /// Hooks with a generator and no validator.
    pub fn new(generator: Arc<dyn MetadataGenerator>) -> Self {
        Self {
            generator,
            validator: None,
        }
    }

    /// Add a validator.
    pub fn with_validator(mut self, validator: Arc<dyn ParamValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Whether the parameters pass validation. Routes without a validator
    /// accept everything.
    pub fn accepts(&self, params: &RouteParams) -> bool {
        self.validator
            .as_ref()
            .map(|v| v.validate(params))
            .unwrap_or(true)
    }
}

impl fmt::Debug for RouteHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteHooks")
            .field("validator", &self.validator.is_some())
            .finish_non_exhaustive()
    }
}

/// Route pattern -> hooks.
#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    routes: BTreeMap<String, RouteHooks>,
}

impl RouteRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a generator for a pattern.
    pub fn route(mut self, pattern: impl Into<String>, generator: Arc<dyn MetadataGenerator>) -> Self {
        self.routes.insert(pattern.into(), RouteHooks::new(generator));
        self
    }

    /// Register full hooks for a pattern.
    pub fn insert(&mut self, pattern: impl Into<String>, hooks: RouteHooks) {
        self.routes.insert(pattern.into(), hooks);
    }

    /// Attach a validator to an already registered pattern.
    pub fn validate(mut self, pattern: &str, validator: Arc<dyn ParamValidator>) -> Self {
        if let Some(hooks) = self.routes.get_mut(pattern) {
            hooks.validator = Some(validator);
        }
        self
    }

    /// Hooks for a pattern.
    pub fn get(&self, pattern: &str) -> Option<&RouteHooks> {
        self.routes.get(pattern)
    }

    /// Registered patterns.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    /// Number of registered patterns.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no pattern is registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Build a registry of [`JsonMetadataGenerator`]s from a JSON object
    /// mapping patterns to metadata documents.
    pub fn from_metadata_json(bytes: &[u8]) -> serde_json::Result<Self> {
        let documents: BTreeMap<String, Value> = serde_json::from_slice(bytes)?;
        let mut registry = Self::new();
        for (pattern, document) in documents {
            registry.insert(
                pattern,
                RouteHooks::new(Arc::new(JsonMetadataGenerator::new(document))),
            );
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_validator() {
        let hooks = RouteHooks::new(Arc::new(JsonMetadataGenerator::new(Value::Null)))
            .with_validator(Arc::new(|p: &RouteParams| {
                p.get("id").is_some_and(|id| id.chars().all(|c| c.is_ascii_digit()))
            }));
        assert!(hooks.accepts(&[("id".to_string(), "42".to_string())].into()));
        assert!(!hooks.accepts(&[("id".to_string(), "abc".to_string())].into()));
    }

    #[test]
    fn test_registry_from_json() {
        let registry = RouteRegistry::from_metadata_json(
            br#"{"/product/:id": {"title": "Product {id}"}, "/blog/:slug": null}"#,
        )
        .unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.patterns().collect::<Vec<_>>(),
            vec!["/blog/:slug", "/product/:id"]
        );
        assert!(registry.get("/product/:id").unwrap().accepts(&RouteParams::new()));
        assert!(registry.get("/missing/:id").is_none());
    }
}
