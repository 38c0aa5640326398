//! Blob storage adapters.
//!
//! The task list is persisted as a single document in a key-value blob store.
//! This module defines the adapter trait the rest of the server depends on and
//! ships two backends:
//! - [`FsBlobStore`]: one file per key under a container directory
//! - [`InMemoryBlobStore`]: a process-local map, used by tests and ephemeral runs
//!
//! Every stored blob carries a [`Version`] that changes whenever its bytes
//! change, which lets callers opt into conditional writes.

use async_trait::async_trait;
use thiserror::Error;

mod fs;
mod memory;

pub use fs::FsBlobStore;
pub use memory::InMemoryBlobStore;

/// Opaque token identifying one revision of a stored blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version(u64);

impl Version {
    pub fn new(value: u64) -> Self {
        Self(value)
    }
}

/// A stored blob and the revision it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub version: Version,
}

/// Precondition attached to a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutCondition {
    /// Overwrite whatever is stored.
    None,
    /// Write only if the stored blob is still at this revision.
    IfMatch(Version),
    /// Write only if nothing is stored under the key.
    IfAbsent,
}

/// Errors raised by blob storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Nothing is stored under the key.
    #[error("Blob '{0}' not found")]
    NotFound(String),
    /// A conditional write found a different revision than expected.
    #[error("Blob '{0}' was modified concurrently")]
    PreconditionFailed(String),
    /// The backend could not be reached; the operation may succeed if retried.
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Returns true if retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            StorageError::Unavailable(_) => true,
            StorageError::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::WouldBlock
            ),
            StorageError::NotFound(_) | StorageError::PreconditionFailed(_) => false,
        }
    }
}

/// Key-value blob backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Returns whether a blob is stored under `key`.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Reads the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] when nothing is stored under `key`.
    async fn get(&self, key: &str) -> Result<Blob, StorageError>;

    /// Writes `bytes` under `key`, honouring `condition`, and returns the new revision.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::PreconditionFailed`] when `condition` does not hold.
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        condition: PutCondition,
    ) -> Result<Version, StorageError>;
}

/// Checks a write precondition against the revision currently stored.
pub(crate) fn check_condition(
    key: &str,
    current: Option<Version>,
    condition: PutCondition,
) -> Result<(), StorageError> {
    let holds = match condition {
        PutCondition::None => true,
        PutCondition::IfMatch(expected) => current == Some(expected),
        PutCondition::IfAbsent => current.is_none(),
    };
    if holds {
        Ok(())
    } else {
        Err(StorageError::PreconditionFailed(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_accept_matching_conditions() {
        let version = Version::new(7);

        assert!(check_condition("k", Some(version), PutCondition::None).is_ok());
        assert!(check_condition("k", None, PutCondition::None).is_ok());
        assert!(check_condition("k", Some(version), PutCondition::IfMatch(version)).is_ok());
        assert!(check_condition("k", None, PutCondition::IfAbsent).is_ok());
    }

    #[test]
    fn can_reject_stale_conditions() {
        let stored = Version::new(8);

        assert!(matches!(
            check_condition("k", Some(stored), PutCondition::IfMatch(Version::new(7))),
            Err(StorageError::PreconditionFailed(_))
        ));
        assert!(matches!(
            check_condition("k", None, PutCondition::IfMatch(stored)),
            Err(StorageError::PreconditionFailed(_))
        ));
        assert!(matches!(
            check_condition("k", Some(stored), PutCondition::IfAbsent),
            Err(StorageError::PreconditionFailed(_))
        ));
    }

    #[test]
    fn can_classify_transient_errors() {
        assert!(StorageError::Unavailable("down".to_string()).is_transient());
        assert!(
            StorageError::Io(std::io::Error::from(std::io::ErrorKind::TimedOut)).is_transient()
        );
        assert!(
            !StorageError::Io(std::io::Error::from(std::io::ErrorKind::PermissionDenied))
                .is_transient()
        );
        assert!(!StorageError::NotFound("k".to_string()).is_transient());
    }
}
