//! Deploy-time configuration errors.

use thiserror::Error;

/// Configuration errors. These surface at deploy/build time and never
/// reach request handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("route pattern '{pattern}' declares parameter '{name}' twice")]
    DuplicateParam { pattern: String, name: String },

    #[error("unsupported manifest version {0}")]
    UnsupportedManifestVersion(u32),

    #[error("missing required setting: {0}")]
    Missing(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}
