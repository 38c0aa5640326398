use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{Blob, BlobStore, PutCondition, StorageError, Version, check_condition};

/// Blob store keeping each blob as a file under `<root>/<container>/<key>`.
///
/// Writes go to a temporary file that is then renamed over the target, so a
/// reader never observes a half-written document. Conditional writes are
/// serialized within this process only.
#[derive(Debug)]
pub struct FsBlobStore {
    container: PathBuf,
    write_lock: Mutex<()>,
}

impl FsBlobStore {
    pub fn new(root: impl AsRef<Path>, container: &str) -> Self {
        Self {
            container: root.as_ref().join(container),
            write_lock: Mutex::new(()),
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let is_plain_name = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains(['/', '\\']);
        if !is_plain_name {
            return Err(StorageError::Io(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("invalid blob key '{key}'"),
            )));
        }
        Ok(self.container.join(key))
    }

    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::Io(err)),
        }
    }
}

fn version_of(bytes: &[u8]) -> Version {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    Version::new(hasher.finish())
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn get(&self, key: &str) -> Result<Blob, StorageError> {
        let bytes = self
            .read(key)
            .await?
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        let version = version_of(&bytes);
        Ok(Blob { bytes, version })
    }

    #[tracing::instrument(skip(self, bytes), fields(len = bytes.len()))]
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        condition: PutCondition,
    ) -> Result<Version, StorageError> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock().await;

        if condition != PutCondition::None {
            let current = self.read(key).await?.map(|stored| version_of(&stored));
            check_condition(key, current, condition)?;
        }

        tokio::fs::create_dir_all(&self.container).await?;
        let staging = self.container.join(format!(".{key}.tmp"));
        tokio::fs::write(&staging, &bytes).await?;
        tokio::fs::rename(&staging, &path).await?;
        tracing::debug!("Wrote blob to {}", path.display());

        Ok(version_of(&bytes))
    }
}
