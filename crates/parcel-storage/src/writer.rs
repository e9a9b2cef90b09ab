//! Persists accepted uploads under the storage root.

use crate::naming::NameGenerator;
use crate::traits::{Storage, StorageError};
use futures::future::join_all;
use parcel_core::models::{IncomingFile, StoredFile};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Attempts per file before an `AlreadyExists` collision is reported as a failure
const MAX_NAME_ATTEMPTS: usize = 3;

/// Why a file could not be persisted
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Storage root unavailable: {0}")]
    RootUnavailable(#[source] StorageError),

    #[error("Failed to store '{original_name}' from field '{field_name}': {source}")]
    WriteFailed {
        field_name: String,
        original_name: String,
        #[source]
        source: StorageError,
    },
}

/// Writes validated files to a fixed root through a [`Storage`] backend
#[derive(Clone)]
pub struct StorageWriter {
    storage: Arc<dyn Storage>,
    root: PathBuf,
    names: NameGenerator,
}

impl StorageWriter {
    pub fn new(storage: Arc<dyn Storage>, root: impl Into<PathBuf>) -> Self {
        Self::with_names(storage, root, NameGenerator::default())
    }

    pub fn with_names(
        storage: Arc<dyn Storage>,
        root: impl Into<PathBuf>,
        names: NameGenerator,
    ) -> Self {
        Self {
            storage,
            root: root.into(),
            names,
        }
    }

    /// Directory every file of this writer lands in
    pub fn resolve_destination_directory(&self) -> &Path {
        &self.root
    }

    /// Create the storage root if it is missing
    pub async fn ensure_root(&self) -> Result<(), PersistError> {
        self.storage
            .ensure_directory(&self.root)
            .await
            .map_err(PersistError::RootUnavailable)
    }

    /// Persist one file, ensuring the root first
    #[tracing::instrument(skip(self, file), fields(field = %file.field_name, original = %file.original_name))]
    pub async fn persist(&self, file: IncomingFile) -> Result<StoredFile, PersistError> {
        self.ensure_root().await?;
        self.write_file(file).await
    }

    /// Persist a batch concurrently.
    ///
    /// The root is ensured once. On failure the first error in arrival order is
    /// returned; files already written by sibling tasks stay on disk.
    pub async fn persist_all(
        &self,
        files: Vec<IncomingFile>,
    ) -> Result<Vec<StoredFile>, PersistError> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        self.ensure_root().await?;

        let results = join_all(files.into_iter().map(|file| self.write_file(file))).await;
        results.into_iter().collect()
    }

    async fn write_file(&self, file: IncomingFile) -> Result<StoredFile, PersistError> {
        let IncomingFile {
            field_name,
            original_name,
            content,
            ..
        } = file;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let generated_name = self.names.generate(&field_name, &original_name);
            let storage_path = self.root.join(&generated_name);
            let reader = Box::pin(Cursor::new(content.clone()));

            match self.storage.write_stream(&storage_path, reader).await {
                Ok(size_bytes) => {
                    return Ok(StoredFile {
                        field_name,
                        generated_name,
                        storage_path,
                        size_bytes,
                    });
                }
                Err(StorageError::AlreadyExists(path)) if attempt < MAX_NAME_ATTEMPTS => {
                    tracing::warn!(path = %path, attempt, "Generated name collided, retrying");
                }
                Err(source) => {
                    tracing::error!(
                        field = %field_name,
                        original = %original_name,
                        error = %source,
                        "Failed to persist upload"
                    );
                    return Err(PersistError::WriteFailed {
                        field_name,
                        original_name,
                        source,
                    });
                }
            }
        }
    }
}

impl std::fmt::Debug for StorageWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageWriter")
            .field("backend", &self.storage.backend_type())
            .field("root", &self.root)
            .finish()
    }
}

#[cfg(all(test, feature = "storage-local", feature = "storage-memory"))]
mod tests {
    use super::*;
    use crate::naming::{Clock, RandomSource, MAX_NAME_LENGTH};
    use crate::{LocalStorage, MemoryStorage};
    use bytes::Bytes;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tempfile::tempdir;

    struct FixedClock;

    impl Clock for FixedClock {
        fn now_millis(&self) -> i64 {
            1700000000000
        }
    }

    struct Sequence(AtomicU64);

    impl RandomSource for Sequence {
        fn next_u64(&self) -> u64 {
            self.0.fetch_add(1, Ordering::Relaxed)
        }
    }

    struct Constant;

    impl RandomSource for Constant {
        fn next_u64(&self) -> u64 {
            9
        }
    }

    fn file(field: &str, name: &str, size: usize) -> IncomingFile {
        IncomingFile::new(field, name, "text/plain", Bytes::from(vec![b'x'; size]))
    }

    #[tokio::test]
    async fn test_persist_creates_root_and_copies_bytes() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("uploads");
        let writer = StorageWriter::new(Arc::new(LocalStorage::new()), &root);

        let content = Bytes::from_static(b"\x89PNG\r\n\x1a\nbody");
        let stored = writer
            .persist(IncomingFile::new("file", "pic.png", "image/png", content.clone()))
            .await
            .unwrap();

        assert_eq!(stored.field_name, "file");
        assert_eq!(stored.size_bytes, content.len() as u64);
        assert!(stored.generated_name.starts_with("file-"));
        assert!(stored.generated_name.ends_with("-pic.png"));
        assert_eq!(stored.storage_path.parent().unwrap(), root.as_path());
        assert_eq!(std::fs::read(&stored.storage_path).unwrap(), content.as_ref());
    }

    #[tokio::test]
    async fn test_persist_all_produces_distinct_names_in_same_millisecond() {
        let storage = Arc::new(MemoryStorage::new());
        let names = NameGenerator::new(Arc::new(FixedClock), Arc::new(Sequence(AtomicU64::new(0))));
        let writer = StorageWriter::with_names(storage.clone(), "uploads", names);

        let stored = writer
            .persist_all(vec![
                file("files", "same.txt", 5000),
                file("files", "same.txt", 5000),
                file("files", "same.txt", 5000),
            ])
            .await
            .unwrap();

        let distinct: HashSet<_> = stored.iter().map(|s| s.generated_name.clone()).collect();
        assert_eq!(distinct.len(), 3);
        assert_eq!(storage.file_count().await, 3);
    }

    #[tokio::test]
    async fn test_long_original_name_is_written_to_disk() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("uploads");
        let writer = StorageWriter::new(Arc::new(LocalStorage::new()), &root);

        let original = format!("{}.txt", "a".repeat(250));
        let stored = writer.persist(file("files", &original, 2)).await.unwrap();

        assert!(stored.generated_name.len() <= MAX_NAME_LENGTH);
        assert!(stored.generated_name.ends_with(".txt"));
        assert_eq!(std::fs::read(&stored.storage_path).unwrap(), b"xx");
    }

    #[tokio::test]
    async fn test_collision_is_reported_as_write_failure() {
        let storage = Arc::new(MemoryStorage::new());
        let names = NameGenerator::new(Arc::new(FixedClock), Arc::new(Constant));
        let writer = StorageWriter::with_names(storage.clone(), "uploads", names);

        writer.persist(file("file", "a.txt", 3)).await.unwrap();
        let result = writer.persist(file("file", "a.txt", 3)).await;

        match result {
            Err(PersistError::WriteFailed {
                field_name,
                original_name,
                source: StorageError::AlreadyExists(_),
            }) => {
                assert_eq!(field_name, "file");
                assert_eq!(original_name, "a.txt");
            }
            other => panic!("expected collision failure, got {:?}", other),
        }
        assert_eq!(storage.file_count().await, 1);
    }

    #[tokio::test]
    async fn test_unusable_root_is_root_unavailable() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("uploads");
        std::fs::write(&blocker, b"occupied").unwrap();
        let writer = StorageWriter::new(Arc::new(LocalStorage::new()), &blocker);

        let result = writer.persist_all(vec![file("files", "a.txt", 1)]).await;
        assert!(matches!(result, Err(PersistError::RootUnavailable(_))));
    }

    #[tokio::test]
    async fn test_persist_all_empty_batch_touches_nothing() {
        let storage = Arc::new(MemoryStorage::new());
        let writer = StorageWriter::new(storage.clone(), "uploads");

        let stored = writer.persist_all(Vec::new()).await.unwrap();
        assert!(stored.is_empty());
        assert!(!storage.has_directory(Path::new("uploads")).await);
    }
}
