//! Parcel Core Library
//!
//! This crate provides the upload data model, error types and configuration
//! shared across all Parcel components.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, UploadLimits};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
