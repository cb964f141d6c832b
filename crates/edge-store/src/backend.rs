//! Swappable deployment backend.
//!
//! Provisioning is kept apart from route, render and decision logic; they
//! only ever see an `ObjectStore`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};
use crate::fs::FsStore;
use crate::store::ObjectStore;

/// Summary of an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployReport {
    /// Number of objects written.
    pub objects: usize,
    /// Total bytes written.
    pub bytes: u64,
}

/// Deployment capability for a hosting backend.
#[async_trait]
pub trait DeployBackend: Send + Sync {
    /// Provision the backing storage.
    async fn setup(&self) -> StoreResult<()>;

    /// Upload a static-export build directory, preserving relative paths.
    async fn deploy(&self, build_dir: &Path) -> StoreResult<DeployReport>;

    /// Whether the backing storage has been provisioned.
    async fn exists(&self) -> StoreResult<bool>;

    /// Remove the backing storage and everything in it.
    async fn teardown(&self) -> StoreResult<()>;
}

/// Deployment backend that provisions a local directory store.
#[derive(Debug, Clone)]
pub struct FsBackend {
    store: FsStore,
}

impl FsBackend {
    /// Create a backend for a directory store.
    pub fn new(bucket: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            store: FsStore::new(bucket, root),
        }
    }

    /// The store this backend provisions.
    pub fn store(&self) -> &FsStore {
        &self.store
    }
}

#[async_trait]
impl DeployBackend for FsBackend {
    async fn setup(&self) -> StoreResult<()> {
        let root = self.store.root();
        tokio::fs::create_dir_all(root)
            .await
            .map_err(|e| StoreError::io(root.display().to_string(), e))?;
        tracing::info!(root = %root.display(), "store provisioned");
        Ok(())
    }

    async fn deploy(&self, build_dir: &Path) -> StoreResult<DeployReport> {
        let build_dir = build_dir.to_path_buf();
        let files = tokio::task::spawn_blocking(move || collect_files(&build_dir))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))??;

        let mut report = DeployReport::default();
        for (key, path) in files {
            let body = tokio::fs::read(&path)
                .await
                .map_err(|e| StoreError::io(path.display().to_string(), e))?;
            report.bytes += body.len() as u64;
            self.store.put(&key, body).await?;
            report.objects += 1;
        }
        tracing::info!(objects = report.objects, bytes = report.bytes, "build output uploaded");
        Ok(report)
    }

    async fn exists(&self) -> StoreResult<bool> {
        Ok(tokio::fs::metadata(self.store.root())
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }

    async fn teardown(&self) -> StoreResult<()> {
        let root = self.store.root();
        match tokio::fs::remove_dir_all(root).await {
            Ok(()) => {
                tracing::info!(root = %root.display(), "store removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(root.display().to_string(), e)),
        }
    }
}

fn collect_files(build_dir: &Path) -> StoreResult<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(build_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| StoreError::Backend(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(build_dir) else {
            continue;
        };
        let key = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push((key, entry.into_path()));
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ObjectStoreExt;

    #[tokio::test]
    async fn test_lifecycle() {
        let build = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(build.path().join("product")).unwrap();
        std::fs::write(build.path().join("index.html"), "home").unwrap();
        std::fs::write(build.path().join("product/7.html"), "seven").unwrap();

        let target = tempfile::tempdir().unwrap();
        let backend = FsBackend::new("site", target.path().join("store"));

        assert!(!backend.exists().await.unwrap());
        backend.setup().await.unwrap();
        assert!(backend.exists().await.unwrap());

        let report = backend.deploy(build.path()).await.unwrap();
        assert_eq!(report, DeployReport { objects: 2, bytes: 9 });
        assert_eq!(
            backend.store().get_string("product/7.html").await.unwrap().as_deref(),
            Some("seven")
        );

        backend.teardown().await.unwrap();
        assert!(!backend.exists().await.unwrap());
        backend.teardown().await.unwrap();
    }
}
