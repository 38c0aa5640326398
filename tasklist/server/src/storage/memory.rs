use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{Blob, BlobStore, PutCondition, StorageError, Version, check_condition};

#[derive(Debug, Default)]
struct Inner {
    blobs: HashMap<String, Blob>,
    next_version: u64,
}

/// Blob store backed by a process-local map. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    inner: RwLock<Inner>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the bytes stored under `key`, if any.
    pub async fn snapshot(&self, key: &str) -> Option<Vec<u8>> {
        let inner = self.inner.read().await;
        inner.blobs.get(key).map(|blob| blob.bytes.clone())
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner.blobs.contains_key(key))
    }

    async fn get(&self, key: &str) -> Result<Blob, StorageError> {
        let inner = self.inner.read().await;
        inner
            .blobs
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        condition: PutCondition,
    ) -> Result<Version, StorageError> {
        let mut inner = self.inner.write().await;
        let current = inner.blobs.get(key).map(|blob| blob.version);
        check_condition(key, current, condition)?;

        inner.next_version += 1;
        let version = Version::new(inner.next_version);
        inner
            .blobs
            .insert(key.to_string(), Blob { bytes, version });
        Ok(version)
    }
}
