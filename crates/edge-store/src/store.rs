//! Object store capability.

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};

/// Durable key-value object storage.
///
/// Keys are `/`-separated relative paths such as `product/42.html`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store identifier (bucket name).
    fn bucket(&self) -> &str;

    /// Read an object. Returns `None` if the key does not exist.
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Write an object, replacing any previous value atomically.
    async fn put(&self, key: &str, body: Vec<u8>) -> StoreResult<()>;

    /// Check whether an object exists.
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// List keys under a prefix, sorted.
    async fn list(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Delete an object. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> StoreResult<()>;
}

/// Convenience helpers over any store.
#[async_trait]
pub trait ObjectStoreExt: ObjectStore {
    /// Read an object as UTF-8 text.
    async fn get_string(&self, key: &str) -> StoreResult<Option<String>> {
        match self.get(key).await? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| StoreError::NotUtf8(key.to_string())),
            None => Ok(None),
        }
    }

    /// Write UTF-8 text.
    async fn put_string(&self, key: &str, body: &str) -> StoreResult<()> {
        self.put(key, body.as_bytes().to_vec()).await
    }
}

impl<T: ObjectStore + ?Sized> ObjectStoreExt for T {}

/// Reject keys that are empty, absolute, or contain `.`/`..` components.
pub fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() || key.starts_with('/') || key.contains('\\') || key.contains('\0') {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    if key
        .split('/')
        .any(|part| part.is_empty() || part == "." || part == "..")
    {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Content type served for a key, by extension.
pub fn content_type_for(key: &str) -> &'static str {
    let ext = key.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    match ext {
        "html" | "htm" => "text/html; charset=utf-8",
        "txt" | "rsc" => "text/x-component",
        "json" => "application/json",
        "js" => "application/javascript",
        "css" => "text/css",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "ico" => "image/x-icon",
        _ => "application/octet-stream",
    }
}
