//! Storage setup and initialization

use anyhow::Result;
use parcel_core::Config;
use parcel_storage::{create_storage, Storage};
use std::sync::Arc;

/// Create the configured backend and try to create the storage root.
///
/// A root that cannot be created yet is not fatal here; every request ensures it
/// again and fails with `STORAGE_UNAVAILABLE` while it stays unusable.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!("Initializing storage abstraction...");
    let storage = create_storage(config)?;
    tracing::info!(
        backend = %storage.backend_type(),
        root = %config.upload_root().display(),
        "Storage abstraction initialized successfully"
    );

    if let Err(e) = storage.ensure_directory(config.upload_root()).await {
        tracing::warn!(
            error = %e,
            root = %config.upload_root().display(),
            "Storage root is not available yet"
        );
    }

    Ok(storage)
}
