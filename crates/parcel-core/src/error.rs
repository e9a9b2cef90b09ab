//! Error types module
//!
//! This module provides the core error types used throughout Parcel. All request-level
//! failures are unified under the `AppError` enum. The upload kinds keep the offending
//! field, file and violated limit so the HTTP layer can render a structured payload.

use crate::models::{StoredFile, ValidationError, ViolatedLimit};

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like a missing storage root
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "SIZE_EXCEEDED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Too many files in field '{field_name}' (max: {max_count})")]
    TooManyFiles { field_name: String, max_count: usize },

    /// All-or-nothing rejection. `rejection` is the first failure in arrival order;
    /// `also_rejected` holds the failures of later files in the same batch.
    #[error("{rejection}")]
    FileRejected {
        rejection: ValidationError,
        also_rejected: Vec<ValidationError>,
    },

    #[error("{} file(s) rejected, {} stored", rejected.len(), stored.len())]
    PartiallyRejected {
        rejected: Vec<ValidationError>,
        stored: Vec<StoredFile>,
    },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Failed to store '{original_name}' from field '{field_name}': {message}")]
    StorageWriteFailed {
        field_name: String,
        original_name: String,
        message: String,
    },

    #[error("A file is required in field '{field_name}'")]
    FileRequired { field_name: String },

    #[error("Unexpected file field '{field_name}'")]
    UnexpectedField { field_name: String },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::FileRejected {
            rejection: err,
            also_rejected: Vec::new(),
        }
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::TooManyFiles { .. } => (
            400,
            "TOO_MANY_FILES",
            false,
            Some("Send fewer files for this field"),
            false,
            LogLevel::Debug,
        ),
        AppError::FileRejected { rejection, .. } => (
            400,
            match rejection.reason {
                crate::models::RejectionReason::SizeExceeded => "SIZE_EXCEEDED",
                crate::models::RejectionReason::TypeRejected => "TYPE_REJECTED",
            },
            false,
            Some("Check file size and type against the endpoint limits"),
            false,
            LogLevel::Debug,
        ),
        AppError::PartiallyRejected { .. } => (
            400,
            "FILES_REJECTED",
            false,
            Some("Re-send only the rejected files after fixing them"),
            false,
            LogLevel::Debug,
        ),
        AppError::StorageUnavailable(_) => (
            503,
            "STORAGE_UNAVAILABLE",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::StorageWriteFailed { .. } => (
            500,
            "STORAGE_WRITE_FAILED",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::FileRequired { .. } => (
            400,
            "FILE_REQUIRED",
            false,
            Some("Attach a file under the named field"),
            false,
            LogLevel::Debug,
        ),
        AppError::UnexpectedField { .. } => (
            400,
            "UNEXPECTED_FIELD",
            false,
            Some("Send files only under the fields this endpoint declares"),
            false,
            LogLevel::Debug,
        ),
        AppError::BadRequest(_) => (
            400,
            "BAD_REQUEST",
            false,
            Some("Check request format and parameters"),
            false,
            LogLevel::Debug,
        ),
        AppError::PayloadTooLarge(_) => (
            413,
            "PAYLOAD_TOO_LARGE",
            false,
            Some("Reduce request size"),
            false,
            LogLevel::Debug,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::TooManyFiles { .. } => "TooManyFiles",
            AppError::FileRejected { rejection, .. } => match rejection.reason {
                crate::models::RejectionReason::SizeExceeded => "SizeExceeded",
                crate::models::RejectionReason::TypeRejected => "TypeRejected",
            },
            AppError::PartiallyRejected { .. } => "PartiallyRejected",
            AppError::StorageUnavailable(_) => "StorageUnavailable",
            AppError::StorageWriteFailed { .. } => "StorageWriteFailed",
            AppError::FileRequired { .. } => "FileRequired",
            AppError::UnexpectedField { .. } => "UnexpectedField",
            AppError::BadRequest(_) => "BadRequest",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }

    /// Field that caused the failure, when the failure is tied to one
    pub fn field_name(&self) -> Option<&str> {
        match self {
            AppError::TooManyFiles { field_name, .. } => Some(field_name),
            AppError::FileRejected { rejection, .. } => Some(&rejection.field_name),
            AppError::StorageWriteFailed { field_name, .. } => Some(field_name),
            AppError::FileRequired { field_name } => Some(field_name),
            AppError::UnexpectedField { field_name } => Some(field_name),
            _ => None,
        }
    }

    /// Client-supplied filename of the offending file
    pub fn original_name(&self) -> Option<&str> {
        match self {
            AppError::FileRejected { rejection, .. } => Some(&rejection.original_name),
            AppError::StorageWriteFailed { original_name, .. } => Some(original_name),
            _ => None,
        }
    }

    /// The threshold that was violated
    pub fn violated_limit(&self) -> Option<ViolatedLimit> {
        match self {
            AppError::TooManyFiles { max_count, .. } => Some(ViolatedLimit::MaxCount {
                max_count: *max_count,
            }),
            AppError::FileRejected { rejection, .. } => Some(rejection.limit.clone()),
            _ => None,
        }
    }

    /// Every rejection gathered before the error was raised, in arrival order
    pub fn rejections(&self) -> Vec<&ValidationError> {
        match self {
            AppError::FileRejected {
                rejection,
                also_rejected,
            } => std::iter::once(rejection).chain(also_rejected).collect(),
            AppError::PartiallyRejected { rejected, .. } => rejected.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Files already persisted when the error was raised (partial acceptance only)
    pub fn stored(&self) -> &[StoredFile] {
        match self {
            AppError::PartiallyRejected { stored, .. } => stored,
            _ => &[],
        }
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::TooManyFiles { .. } => self.to_string(),
            AppError::FileRejected { rejection, .. } => rejection.to_string(),
            AppError::PartiallyRejected { .. } => self.to_string(),
            AppError::StorageUnavailable(_) => "Storage is unavailable".to_string(),
            AppError::StorageWriteFailed { original_name, .. } => {
                format!("Failed to store '{}'", original_name)
            }
            AppError::FileRequired { .. } => self.to_string(),
            AppError::UnexpectedField { .. } => self.to_string(),
            AppError::BadRequest(ref msg) => msg.clone(),
            AppError::PayloadTooLarge(ref msg) => msg.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RejectionReason;

    fn size_rejection() -> ValidationError {
        ValidationError {
            field_name: "file".to_string(),
            original_name: "big.png".to_string(),
            reason: RejectionReason::SizeExceeded,
            limit: ViolatedLimit::MaxBytes { max_bytes: 1024 },
        }
    }

    #[test]
    fn test_error_metadata_size_exceeded() {
        let err = AppError::from(size_rejection());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "SIZE_EXCEEDED");
        assert_eq!(err.error_type(), "SizeExceeded");
        assert!(!err.is_recoverable());
        assert!(!err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Debug);
        assert_eq!(err.field_name(), Some("file"));
        assert_eq!(err.original_name(), Some("big.png"));
        assert_eq!(
            err.violated_limit(),
            Some(ViolatedLimit::MaxBytes { max_bytes: 1024 })
        );
        assert_eq!(err.rejections().len(), 1);
    }

    #[test]
    fn test_error_metadata_type_rejected() {
        let err = AppError::from(ValidationError {
            reason: RejectionReason::TypeRejected,
            limit: ViolatedLimit::AllowedTypes {
                allowed: vec!["image/png".to_string()],
            },
            ..size_rejection()
        });
        assert_eq!(err.error_code(), "TYPE_REJECTED");
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn test_error_metadata_too_many_files() {
        let err = AppError::TooManyFiles {
            field_name: "a-type-files".to_string(),
            max_count: 2,
        };
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "TOO_MANY_FILES");
        assert_eq!(err.field_name(), Some("a-type-files"));
        assert_eq!(
            err.violated_limit(),
            Some(ViolatedLimit::MaxCount { max_count: 2 })
        );
    }

    #[test]
    fn test_storage_errors_are_distinguishable_environment_faults() {
        let unavailable = AppError::StorageUnavailable("permission denied".to_string());
        let write_failed = AppError::StorageWriteFailed {
            field_name: "files".to_string(),
            original_name: "a.txt".to_string(),
            message: "disk full".to_string(),
        };

        assert_eq!(unavailable.http_status_code(), 503);
        assert_eq!(write_failed.http_status_code(), 500);
        assert_ne!(unavailable.error_code(), write_failed.error_code());
        assert!(unavailable.is_sensitive());
        assert!(write_failed.is_recoverable());
        assert_eq!(write_failed.client_message(), "Failed to store 'a.txt'");
        assert_eq!(unavailable.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_partially_rejected_carries_aggregate() {
        let stored = StoredFile {
            field_name: "files".to_string(),
            generated_name: "files-1-2-ok.txt".to_string(),
            storage_path: "uploads/files-1-2-ok.txt".into(),
            size_bytes: 10,
        };
        let err = AppError::PartiallyRejected {
            rejected: vec![size_rejection()],
            stored: vec![stored],
        };
        assert_eq!(err.error_code(), "FILES_REJECTED");
        assert_eq!(err.rejections().len(), 1);
        assert_eq!(err.stored().len(), 1);
        assert_eq!(err.to_string(), "1 file(s) rejected, 1 stored");
    }

    #[test]
    fn test_file_rejected_keeps_later_rejections_behind_the_primary() {
        let later = ValidationError {
            original_name: "second.png".to_string(),
            ..size_rejection()
        };
        let err = AppError::FileRejected {
            rejection: size_rejection(),
            also_rejected: vec![later],
        };
        let names: Vec<&str> = err
            .rejections()
            .iter()
            .map(|r| r.original_name.as_str())
            .collect();
        assert_eq!(names, vec!["big.png", "second.png"]);
        assert_eq!(err.original_name(), Some("big.png"));
        assert_eq!(err.error_code(), "SIZE_EXCEEDED");
    }

    #[test]
    fn test_error_metadata_file_required() {
        let err = AppError::FileRequired {
            field_name: "file".to_string(),
        };
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "FILE_REQUIRED");
        assert_eq!(err.field_name(), Some("file"));
        assert_eq!(err.client_message(), "A file is required in field 'file'");
        assert!(err.rejections().is_empty());
    }

    #[test]
    fn test_error_metadata_unexpected_field() {
        let err = AppError::UnexpectedField {
            field_name: "other".to_string(),
        };
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "UNEXPECTED_FIELD");
        assert_eq!(err.error_type(), "UnexpectedField");
        assert_eq!(err.field_name(), Some("other"));
    }

    #[test]
    fn test_error_metadata_suggested_actions() {
        let err = AppError::BadRequest("test".to_string());
        assert_eq!(
            err.suggested_action(),
            Some("Check request format and parameters")
        );

        let err = AppError::StorageUnavailable("test".to_string());
        assert_eq!(err.suggested_action(), Some("Retry after a short delay"));
    }
}
