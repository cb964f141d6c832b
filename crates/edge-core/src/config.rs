//! Deploy and runtime configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::key::DEFAULT_TEMPLATE_FILENAME;
use crate::manifest::RouteManifest;

/// Top-level configuration file (`edge.toml` or `edge.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegenConfig {
    /// Object store location.
    #[serde(default)]
    pub store: StoreConfig,

    /// Dynamic routes.
    #[serde(default)]
    pub routes: RoutesConfig,

    /// Fallback template generation.
    #[serde(default)]
    pub template: TemplateConfig,

    /// On-demand rendering.
    #[serde(default)]
    pub render: RenderConfig,

    /// Edge decision function.
    #[serde(default)]
    pub edge: EdgeConfig,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RegenConfig {
    /// Load config from a file. `.json` files are parsed as JSON, anything
    /// else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        if path.extension().is_some_and(|ext| ext == "json") {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(toml::from_str(&content)?)
        }
    }

    /// Serialize as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check the configuration and compile the route manifest.
    pub fn validate(&self) -> Result<RouteManifest, ConfigError> {
        if self.store.bucket.trim().is_empty() {
            return Err(ConfigError::Missing("store.bucket".to_string()));
        }
        if self.template.filename.trim().is_empty() || self.template.filename.contains('/') {
            return Err(ConfigError::Missing("template.filename".to_string()));
        }
        if self.routes.manifest_key.trim().is_empty() {
            return Err(ConfigError::Missing("routes.manifest_key".to_string()));
        }
        RouteManifest::compile(&self.routes.patterns)
    }
}

/// Object store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory of the filesystem store.
    #[serde(default = "default_store_root")]
    pub root: String,

    /// Store identifier passed to the renderer.
    #[serde(default = "default_bucket")]
    pub bucket: String,
}

fn default_store_root() -> String {
    ".edge/store".to_string()
}

fn default_bucket() -> String {
    "site".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_store_root(),
            bucket: default_bucket(),
        }
    }
}

/// Route configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesConfig {
    /// Dynamic route patterns, in match order.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Store key of the persisted manifest.
    #[serde(default = "default_manifest_key")]
    pub manifest_key: String,
}

fn default_manifest_key() -> String {
    "_isr/routes.json".to_string()
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            manifest_key: default_manifest_key(),
        }
    }
}

/// Fallback template configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Template filename appended to the static-segment directory.
    #[serde(default = "default_template_filename")]
    pub filename: String,

    /// Generic title written into templates.
    #[serde(default = "default_loading_title")]
    pub loading_title: String,

    /// Markup replacing the primary content region.
    #[serde(default = "default_loading_markup")]
    pub loading_markup: String,
}

fn default_template_filename() -> String {
    DEFAULT_TEMPLATE_FILENAME.to_string()
}

fn default_loading_title() -> String {
    "Loading...".to_string()
}

fn default_loading_markup() -> String {
    r#"<div class="isr-loading" aria-busy="true">Loading...</div>"#.to_string()
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            filename: default_template_filename(),
            loading_title: default_loading_title(),
            loading_markup: default_loading_markup(),
        }
    }
}

/// Renderer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Upper bound on a single render, enforced by the caller.
    #[serde(default = "default_render_timeout_ms")]
    pub timeout_ms: u64,

    /// Persist the plain-payload variant next to the document.
    #[serde(default = "default_true")]
    pub emit_payload_variant: bool,

    /// Derive per-segment artifacts from a reference instance.
    #[serde(default = "default_true")]
    pub derive_segments: bool,

    /// Lifetime of locally cached templates.
    #[serde(default = "default_ttl_secs")]
    pub template_ttl_secs: u64,
}

fn default_render_timeout_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

fn default_ttl_secs() -> u64 {
    300
}

impl RenderConfig {
    /// Render timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Template cache lifetime as a duration.
    pub fn template_ttl(&self) -> Duration {
        Duration::from_secs(self.template_ttl_secs)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_render_timeout_ms(),
            emit_payload_variant: true,
            derive_segments: true,
            template_ttl_secs: default_ttl_secs(),
        }
    }
}

/// Edge decision function configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeConfig {
    /// Lifetime of the locally cached manifest.
    #[serde(default = "default_ttl_secs")]
    pub manifest_ttl_secs: u64,

    /// Extensions treated as documents rather than static assets.
    #[serde(default = "default_document_extensions")]
    pub document_extensions: Vec<String>,
}

fn default_document_extensions() -> Vec<String> {
    vec!["html".to_string(), "htm".to_string()]
}

impl EdgeConfig {
    /// Manifest cache lifetime as a duration.
    pub fn manifest_ttl(&self) -> Duration {
        Duration::from_secs(self.manifest_ttl_secs)
    }
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            manifest_ttl_secs: default_ttl_secs(),
            document_extensions: default_document_extensions(),
        }
    }
}

/// Output format for logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (for production/log aggregation).
    Json,
    /// Human-readable format (for development).
    #[default]
    Human,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Default filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: default_level(),
        }
    }
}

/// Generate a default `edge.toml`.
pub fn generate_default_config() -> String {
    r#"# On-demand regeneration configuration

[store]
root = ".edge/store"
bucket = "site"

[routes]
patterns = ["/product/:id"]
manifest_key = "_isr/routes.json"

[template]
filename = "_fallback.html"
loading_title = "Loading..."

[render]
timeout_ms = 10000
emit_payload_variant = true
derive_segments = true
template_ttl_secs = 300

[edge]
manifest_ttl_secs = 300
document_extensions = ["html", "htm"]

[logging]
format = "human"
level = "info"
"#
    .to_string()
}
