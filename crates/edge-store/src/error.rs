//! Store error types.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur when using the store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Key is empty, absolute, or escapes the store root.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Object content is not valid UTF-8.
    #[error("object {0} is not valid UTF-8")]
    NotUtf8(String),

    /// I/O failure.
    #[error("store I/O error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Backend-specific failure.
    #[error("store operation failed: {0}")]
    Backend(String),
}

impl StoreError {
    pub(crate) fn io(key: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            key: key.into(),
            source,
        }
    }
}
