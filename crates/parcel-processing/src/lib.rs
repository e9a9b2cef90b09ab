//! Parcel Processing Library
//!
//! Turns decoded multipart files into stored files for one endpoint policy:
//! slot assignment, validator chains and the batch outcome decision.

pub mod selection;
pub mod upload;
pub mod validator;

pub use selection::select_files;
pub use upload::pipeline::persist_error_to_app_error;
pub use upload::{Partition, ValidationPipeline};
pub use validator::{mime_matches, normalize_mime, FileValidator};
