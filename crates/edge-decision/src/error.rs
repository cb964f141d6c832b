use edge_core::ConfigError;
use edge_store::StoreError;
use thiserror::Error;

/// Failures reading the inputs a decision depends on. None of them is
/// surfaced to the client; the request is forwarded regardless.
#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("route manifest not found at {key}")]
    ManifestMissing { key: String },

    #[error("route manifest unreadable: {0}")]
    Manifest(#[from] ConfigError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
