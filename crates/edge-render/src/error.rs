//! Render errors and not-found reasons.

use std::fmt;
use std::time::Duration;

use edge_patch::PatchError;
use edge_store::StoreError;
use thiserror::Error;

/// Result type for render internals.
pub type RenderResult<T> = Result<T, RenderError>;

/// A render that could not complete. Nothing is persisted at the artifact
/// key when one of these is raised.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("fallback template not found at {key}")]
    TemplateMissing { key: String },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("patch error: {0}")]
    Patch(#[from] PatchError),

    #[error("render timed out after {0:?}")]
    Timeout(Duration),
}

/// Why a render produced no artifact without anything going wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundReason {
    /// The pattern is not a registered route.
    UnknownPattern(String),
    /// A parameter declared by the pattern is missing from the request.
    MissingParam(String),
    /// The route's validator rejected the parameters.
    ValidationRejected,
    /// The metadata generator returned no metadata.
    NoMetadata,
    /// The metadata generator failed.
    GeneratorFailed(String),
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPattern(p) => write!(f, "unknown route pattern {}", p),
            Self::MissingParam(name) => write!(f, "missing parameter {}", name),
            Self::ValidationRejected => write!(f, "parameters rejected by validator"),
            Self::NoMetadata => write!(f, "no metadata for parameters"),
            Self::GeneratorFailed(e) => write!(f, "metadata generator failed: {}", e),
        }
    }
}
