//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use std::path::Path;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage directory unavailable: {0}")]
    DirectoryUnavailable(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Destination already exists: {0}")]
    AlreadyExists(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// Both operations are awaited by the caller; they are the only points where an
/// upload request yields. Timeouts are the backend's concern.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Create `path` and any missing parents.
    ///
    /// A directory that already exists is success; any other failure is
    /// `DirectoryUnavailable`.
    async fn ensure_directory(&self, path: &Path) -> StorageResult<()>;

    /// Write everything `reader` yields to a new file at `path`.
    ///
    /// Never overwrites: an existing destination is `AlreadyExists`. Returns the
    /// number of bytes written.
    async fn write_stream(
        &self,
        path: &Path,
        reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<u64>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
