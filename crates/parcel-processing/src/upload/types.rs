//! Types for the upload pipeline.

use parcel_core::models::{IncomingFile, ValidationError};

/// Disjoint split of a batch after every file has run its validator chain.
///
/// Both sides keep multipart arrival order.
#[derive(Debug, Default)]
pub struct Partition {
    pub accepted: Vec<IncomingFile>,
    pub rejected: Vec<ValidationError>,
}
