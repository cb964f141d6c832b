//! Patch errors.

use thiserror::Error;

/// Result type for patch operations.
pub type PatchResult<T> = Result<T, PatchError>;

/// Errors raised while patching a document.
#[derive(Debug, Error)]
pub enum PatchError {
    /// A payload chunk is not a valid escaped string literal.
    #[error("malformed payload chunk at region {index}: {reason}")]
    MalformedPayload { index: usize, reason: String },

    /// The document has no `</head>` to insert tags into.
    #[error("document has no <head> element")]
    MissingHead,
}
