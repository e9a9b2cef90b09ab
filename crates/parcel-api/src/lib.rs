//! Parcel API Library
//!
//! This crate provides the HTTP handlers, multipart decoding and application setup.

// Module declarations
mod api_doc;
mod handlers;
mod services;
pub mod setup;
mod telemetry;
mod utils;

// Public modules
pub mod error;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::{AppState, EndpointPolicies};
