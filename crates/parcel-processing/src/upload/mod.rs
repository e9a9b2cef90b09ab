//! Upload pipeline: select → validate → decide outcome → store.

pub mod pipeline;
pub mod types;

pub use pipeline::ValidationPipeline;
pub use types::Partition;
