//! Whole-document persistence of the task collection.
//!
//! The collection lives as one JSON array under one blob key. Every mutation
//! reads the full array, changes it in memory and writes the full array back.

use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tasklist_core::Task;
use thiserror::Error;

use crate::storage::{BlobStore, PutCondition, StorageError, Version};

/// How [`TaskRepository::save_all`] treats writes that happened after the load.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Overwrite unconditionally. Two overlapping read-modify-write cycles
    /// lose the first writer's change.
    #[default]
    Overwrite,
    /// Write only if the document is still at the loaded revision; otherwise
    /// fail with [`RepositoryError::Conflict`].
    Conditional,
}

/// Bounded retry for transient storage failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Backoff before retry `n` is `delay * n`.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Stored task list could not be decoded: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("Task list was modified by another request")]
    Conflict,
}

/// The task collection as loaded, with the revision it was read at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    /// `None` when nothing was stored yet.
    pub version: Option<Version>,
}

#[derive(Clone)]
pub struct TaskRepository {
    store: Arc<dyn BlobStore>,
    key: String,
    write_mode: WriteMode,
    retry: RetryPolicy,
}

impl TaskRepository {
    pub fn new(store: Arc<dyn BlobStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            write_mode: WriteMode::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_write_mode(mut self, write_mode: WriteMode) -> Self {
        self.write_mode = write_mode;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Checks that the backend answers. Reports whether the task document has been created.
    pub async fn exists(&self) -> Result<bool, RepositoryError> {
        Ok(self.retrying("exists", || self.store.exists(&self.key)).await?)
    }

    /// Loads the full collection. A missing document is an empty collection.
    #[tracing::instrument(skip(self), fields(key = %self.key))]
    pub async fn load_all(&self) -> Result<Snapshot, RepositoryError> {
        match self.retrying("get", || self.store.get(&self.key)).await {
            Ok(blob) => {
                let tasks = decode(&blob.bytes)?;
                tracing::debug!("Loaded {} tasks", tasks.len());
                Ok(Snapshot {
                    tasks,
                    version: Some(blob.version),
                })
            }
            Err(StorageError::NotFound(_)) => {
                tracing::debug!("No task document stored yet");
                Ok(Snapshot::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Writes the full collection back.
    ///
    /// `loaded` is the revision returned by [`load_all`](Self::load_all); it is
    /// only consulted in [`WriteMode::Conditional`].
    #[tracing::instrument(skip(self, tasks), fields(key = %self.key, count = tasks.len()))]
    pub async fn save_all(
        &self,
        tasks: &[Task],
        loaded: Option<Version>,
    ) -> Result<Version, RepositoryError> {
        let condition = match (self.write_mode, loaded) {
            (WriteMode::Overwrite, _) => PutCondition::None,
            (WriteMode::Conditional, Some(version)) => PutCondition::IfMatch(version),
            (WriteMode::Conditional, None) => PutCondition::IfAbsent,
        };
        self.write(tasks, condition).await
    }

    /// Overwrites the stored collection regardless of write mode.
    #[tracing::instrument(skip(self, tasks), fields(key = %self.key, count = tasks.len()))]
    pub async fn replace_all(&self, tasks: &[Task]) -> Result<Version, RepositoryError> {
        self.write(tasks, PutCondition::None).await
    }

    async fn write(
        &self,
        tasks: &[Task],
        condition: PutCondition,
    ) -> Result<Version, RepositoryError> {
        let bytes = serde_json::to_vec(tasks)?;
        let result = self
            .retrying("put", || self.store.put(&self.key, bytes.clone(), condition))
            .await;
        match result {
            Ok(version) => Ok(version),
            Err(StorageError::PreconditionFailed(_)) => {
                tracing::warn!("Task list changed since it was loaded");
                Err(RepositoryError::Conflict)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn retrying<T, F, Fut>(&self, operation: &str, mut attempt: F) -> Result<T, StorageError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StorageError>>,
    {
        let mut retries = 0;
        loop {
            match attempt().await {
                Err(err) if err.is_transient() && retries < self.retry.max_retries => {
                    retries += 1;
                    tracing::warn!(
                        "Storage {} failed ({}), retry {} of {}",
                        operation,
                        err,
                        retries,
                        self.retry.max_retries
                    );
                    tokio::time::sleep(self.retry.delay * retries).await;
                }
                result => return result,
            }
        }
    }
}

/// Parses a stored document. A blank body or `null` is an empty collection.
fn decode(bytes: &[u8]) -> Result<Vec<Task>, serde_json::Error> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let tasks: Option<Vec<Task>> = serde_json::from_slice(bytes)?;
    Ok(tasks.unwrap_or_default())
}
