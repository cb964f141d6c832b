//! Template generation errors.

use std::path::PathBuf;

use edge_patch::PatchError;
use edge_store::StoreError;
use thiserror::Error;

/// Result type for template generation.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors raised while generating templates.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("build directory not found: {0}")]
    BuildDirMissing(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("patch error: {0}")]
    Patch(#[from] PatchError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
