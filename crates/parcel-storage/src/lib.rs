//! Parcel Storage Library
//!
//! This crate provides the storage abstraction, the local filesystem and in-memory
//! backends, collision-resistant name generation and the [`StorageWriter`] that
//! persists accepted uploads.
//!
//! # Naming
//!
//! Every stored file is written under the storage root as
//! `{field}-{timestamp_millis}-{random}-{original}`. Names are never reused, so the
//! root is append-only from this crate's point of view and concurrent writers need
//! no coordination.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-memory")]
pub mod memory;
pub mod naming;
pub mod traits;
pub mod writer;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-memory")]
pub use memory::MemoryStorage;
pub use naming::{generate_name, Clock, NameGenerator, RandomSource, SystemClock, ThreadRandom};
pub use parcel_core::StorageBackend;
pub use traits::{Storage, StorageError, StorageResult};
pub use writer::{PersistError, StorageWriter};
