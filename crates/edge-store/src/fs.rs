//! Filesystem-backed object store.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};
use crate::store::{validate_key, ObjectStore};

const TEMP_MARKER: &str = ".tmp-";

/// Object store rooted at a local directory.
///
/// Writes go to a temporary sibling file that is renamed into place, so a
/// reader sees either the old or the new object, never a partial one.
#[derive(Debug, Clone)]
pub struct FsStore {
    bucket: String,
    root: PathBuf,
}

impl FsStore {
    /// Open a store at `root`. The directory is created on first write.
    pub fn new(bucket: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            bucket: bucket.into(),
            root: root.into(),
        }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    fn temp_path(path: &Path) -> PathBuf {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        path.with_file_name(format!(".{}{}{}-{}", name, TEMP_MARKER, std::process::id(), seq))
    }
}

#[async_trait]
impl ObjectStore for FsStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(key, e)),
        }
    }

    async fn put(&self, key: &str, body: Vec<u8>) -> StoreResult<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(key, e))?;
        }

        let temp = Self::temp_path(&path);
        if let Err(e) = tokio::fs::write(&temp, &body).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(StoreError::io(key, e));
        }
        if let Err(e) = tokio::fs::rename(&temp, &path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(StoreError::io(key, e));
        }
        tracing::trace!(key, bytes = body.len(), "object written");
        Ok(())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let path = self.path_for(key)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(key, e)),
        }
    }

    async fn list(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let root = self.root.clone();
        let prefix = prefix.to_string();
        tokio::task::spawn_blocking(move || list_keys(&root, &prefix))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(key, e)),
        }
    }
}

fn list_keys(root: &Path, prefix: &str) -> StoreResult<Vec<String>> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut keys = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| StoreError::Backend(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().contains(TEMP_MARKER) {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let key = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if key.starts_with(prefix) {
            keys.push(key);
        }
    }
    keys.sort();
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ObjectStoreExt;

    #[tokio::test]
    async fn test_roundtrip_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new("site", dir.path());

        assert_eq!(store.get("product/42.html").await.unwrap(), None);
        store.put_string("product/42.html", "<html></html>").await.unwrap();
        assert!(dir.path().join("product/42.html").is_file());
        assert!(store.exists("product/42.html").await.unwrap());
        assert!(!store.exists("product").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_skips_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new("site", dir.path());
        store.put_string("a/1.html", "1").await.unwrap();
        store.put_string("a/2.html", "2").await.unwrap();
        std::fs::write(dir.path().join("a/.3.html.tmp-1-1"), "partial").unwrap();

        assert_eq!(store.list("a/").await.unwrap(), vec!["a/1.html", "a/2.html"]);
    }

    #[tokio::test]
    async fn test_concurrent_puts_leave_one_whole_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new("site", dir.path());
        let a = "A".repeat(256 * 1024);
        let b = "B".repeat(256 * 1024);

        let (ra, rb) = tokio::join!(store.put_string("p.html", &a), store.put_string("p.html", &b));
        ra.unwrap();
        rb.unwrap();

        let body = store.get_string("p.html").await.unwrap().unwrap();
        assert!(body == a || body == b);
        assert_eq!(store.list("").await.unwrap(), vec!["p.html"]);
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new("site", dir.path());
        assert!(matches!(
            store.put("../escape.html", vec![]).await,
            Err(StoreError::InvalidKey(_))
        ));
    }
}
