//! In-memory storage backend.
//!
//! Keeps every written file in process memory. Useful for ephemeral
//! deployments and for tests that should not touch the filesystem.

use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::RwLock;

#[derive(Default)]
struct MemoryState {
    directories: HashSet<PathBuf>,
    files: HashMap<PathBuf, Bytes>,
}

/// In-memory storage implementation
#[derive(Clone, Default)]
pub struct MemoryStorage {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents of the file at `path`, if one was written
    pub async fn get(&self, path: &Path) -> Option<Bytes> {
        self.state.read().await.files.get(path).cloned()
    }

    /// Number of files written so far
    pub async fn file_count(&self) -> usize {
        self.state.read().await.files.len()
    }

    pub async fn has_directory(&self, path: &Path) -> bool {
        self.state.read().await.directories.contains(path)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn ensure_directory(&self, path: &Path) -> StorageResult<()> {
        let mut state = self.state.write().await;
        if state.files.contains_key(path) {
            return Err(StorageError::DirectoryUnavailable(format!(
                "{} exists and is not a directory",
                path.display()
            )));
        }
        for ancestor in path.ancestors() {
            if !ancestor.as_os_str().is_empty() {
                state.directories.insert(ancestor.to_path_buf());
            }
        }
        Ok(())
    }

    async fn write_stream(
        &self,
        path: &Path,
        mut reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<u64> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to read stream for {}: {}", path.display(), e))
        })?;

        let mut state = self.state.write().await;
        let parent_exists = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => state.directories.contains(parent),
            _ => true,
        };
        if !parent_exists {
            return Err(StorageError::WriteFailed(format!(
                "Parent directory of {} does not exist",
                path.display()
            )));
        }
        if state.files.contains_key(path) {
            return Err(StorageError::AlreadyExists(path.display().to_string()));
        }

        let size = buffer.len() as u64;
        state.files.insert(path.to_path_buf(), Bytes::from(buffer));

        tracing::debug!(
            path = %path.display(),
            size_bytes = size,
            "Memory storage write successful"
        );

        Ok(size)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
