//! Versioned route manifest.
//!
//! Persisted as a single JSON object:
//!
//! ```json
//! { "version": 1, "routes": [{ "pattern": "/product/:id", "paramNames": ["id"], "regex": "^/product/([^/]+)$" }] }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::route::{RouteMatch, RoutePattern};

/// The only manifest version this crate reads and writes.
pub const MANIFEST_VERSION: u32 = 1;

/// Ordered table of compiled route patterns. First match wins.
#[derive(Debug, Clone, Default)]
pub struct RouteManifest {
    routes: Vec<RoutePattern>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ManifestDocument {
    version: u32,
    routes: Vec<RouteEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteEntry {
    pattern: String,
    param_names: Vec<String>,
    regex: String,
}

impl RouteManifest {
    /// Compile a manifest from pattern strings, preserving order.
    pub fn compile<I, S>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let routes = patterns
            .into_iter()
            .map(|p| RoutePattern::compile(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { routes })
    }

    /// Parse a persisted manifest.
    ///
    /// Patterns are recompiled; the stored parameter names must agree with
    /// the recompiled ones.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        let doc: ManifestDocument = serde_json::from_slice(bytes)?;
        if doc.version != MANIFEST_VERSION {
            return Err(ConfigError::UnsupportedManifestVersion(doc.version));
        }

        let mut routes = Vec::with_capacity(doc.routes.len());
        for entry in doc.routes {
            let route = RoutePattern::compile(&entry.pattern)?;
            if route.param_names() != entry.param_names.as_slice() {
                return Err(ConfigError::InvalidPattern {
                    pattern: entry.pattern,
                    reason: "stored paramNames do not match the pattern".to_string(),
                });
            }
            routes.push(route);
        }
        Ok(Self { routes })
    }

    /// Serialize to the persisted JSON form.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        let doc = ManifestDocument {
            version: MANIFEST_VERSION,
            routes: self
                .routes
                .iter()
                .map(|r| RouteEntry {
                    pattern: r.pattern().to_string(),
                    param_names: r.param_names().to_vec(),
                    regex: r.regex().as_str().to_string(),
                })
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    /// Compiled routes in manifest order.
    pub fn routes(&self) -> &[RoutePattern] {
        &self.routes
    }

    /// Find a route by its pattern string.
    pub fn find(&self, pattern: &str) -> Option<&RoutePattern> {
        self.routes.iter().find(|r| r.pattern() == pattern)
    }

    /// Match a path against the routes in order; first match wins.
    pub fn match_path(&self, path: &str) -> Option<RouteMatch> {
        self.routes.iter().find_map(|r| r.match_path(path))
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the manifest has no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
