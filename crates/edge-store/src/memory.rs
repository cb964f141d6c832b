//! In-memory object store (for development/testing).

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::StoreResult;
use crate::store::{validate_key, ObjectStore};

/// In-memory store. Clones share the same objects.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    bucket: String,
    objects: Arc<RwLock<BTreeMap<String, Arc<Vec<u8>>>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.objects.read().keys().cloned().collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self.objects.read().get(key).map(|b| b.as_ref().clone()))
    }

    async fn put(&self, key: &str, body: Vec<u8>) -> StoreResult<()> {
        validate_key(key)?;
        self.objects.write().insert(key.to_string(), Arc::new(body));
        Ok(())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        validate_key(key)?;
        Ok(self.objects.read().contains_key(key))
    }

    async fn list(&self, prefix: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .objects
            .read()
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        validate_key(key)?;
        self.objects.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ObjectStoreExt;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryStore::new("site");
        assert_eq!(store.get("a.html").await.unwrap(), None);

        store.put_string("a.html", "<p>a</p>").await.unwrap();
        assert!(store.exists("a.html").await.unwrap());
        assert_eq!(store.get_string("a.html").await.unwrap().as_deref(), Some("<p>a</p>"));

        store.delete("a.html").await.unwrap();
        assert!(!store.exists("a.html").await.unwrap());
        store.delete("a.html").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_prefix() {
        let store = MemoryStore::new("site");
        for key in ["p/1.segments/a", "p/1.segments/b", "p/10.html", "q.html"] {
            store.put_string(key, "x").await.unwrap();
        }
        assert_eq!(
            store.list("p/1.segments/").await.unwrap(),
            vec!["p/1.segments/a", "p/1.segments/b"]
        );
        assert_eq!(store.list("").await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let store = MemoryStore::new("site");
        assert!(store.put("../x", vec![]).await.is_err());
    }
}
