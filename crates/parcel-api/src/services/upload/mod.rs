//! Upload service: decode → validate → store for one route

mod service;

pub use service::UploadService;
