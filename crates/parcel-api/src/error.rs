//! HTTP error response conversion
//!
//! This module provides HTTP-specific error response conversion for AppError.
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>` and use `?` on `AppError`
//! so every failure renders with the same status, body and logging.

use std::sync::OnceLock;

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use parcel_core::models::{StoredFile, ValidationError, ViolatedLimit};
use parcel_core::{AppError, ErrorMetadata, LogLevel};
use serde::Serialize;
use utoipa::ToSchema;

static HIDE_ERROR_DETAILS: OnceLock<bool> = OnceLock::new();

/// Hide error details and chains from clients. Set once at startup.
pub fn set_production_mode(is_production: bool) {
    if HIDE_ERROR_DETAILS.set(is_production).is_err() {
        tracing::debug!("Production mode already set; ignoring");
    }
}

fn is_production() -> bool {
    HIDE_ERROR_DETAILS.get().copied().unwrap_or(false)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    /// Suggested action for the client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
    /// Multipart field that caused the failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    /// Client-supplied filename of the offending file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    /// The threshold that was violated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<ViolatedLimit>,
    /// Every rejected file, in arrival order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejections: Vec<ValidationError>,
    /// Files that were stored despite the rejections (partial acceptance)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stored: Vec<StoredFile>,
}

impl ErrorResponse {
    /// Create a simple error response with default values
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            error_type: None,
            code: code.into(),
            recoverable: false,
            suggested_action: None,
            field_name: None,
            original_name: None,
            limit: None,
            rejections: Vec::new(),
            stored: Vec::new(),
        }
    }

    fn from_app_error(app_error: &AppError, hide_details: bool) -> Self {
        let (details, error_type) = if hide_details {
            (None, None)
        } else {
            (
                Some(app_error.detailed_message()),
                Some(app_error.error_type().to_string()),
            )
        };

        Self {
            details,
            error_type,
            recoverable: app_error.is_recoverable(),
            suggested_action: app_error.suggested_action().map(String::from),
            field_name: app_error.field_name().map(String::from),
            original_name: app_error.original_name().map(String::from),
            limit: app_error.violated_limit(),
            rejections: app_error.rejections().into_iter().cloned().collect(),
            stored: app_error.stored().to_vec(),
            ..Self::new(app_error.client_message(), app_error.error_code())
        }
    }
}

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from parcel-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

/// A request that is not `multipart/form-data` at all.
impl From<MultipartRejection> for HttpAppError {
    fn from(rejection: MultipartRejection) -> Self {
        HttpAppError(AppError::BadRequest(format!(
            "Invalid multipart request: {}",
            rejection.body_text()
        )))
    }
}

/// A multipart body that breaks off or exceeds the request body limit.
pub fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(format!("Failed to read multipart: {}", err.body_text()))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        // Field, file and limit are client data; only details and chains are hidden.
        let hide_details = is_production() || app_error.is_sensitive();
        let body = Json(ErrorResponse::from_app_error(app_error, hide_details));

        (status, body).into_response()
    }
}
