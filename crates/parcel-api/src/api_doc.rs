//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use parcel_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Parcel API",
        version = "0.1.0",
        description = "Multipart file upload service. Every route validates file count, size and declared type against its policy before anything is written to the storage root."
    ),
    paths(
        handlers::upload::index,
        handlers::upload::upload_single,
        handlers::upload::upload_multiple,
        handlers::upload::upload_multiple_with_specified_fields,
        handlers::upload::upload_multiple_with_fields,
    ),
    components(
        schemas(
            models::UploadResponse,
            models::StoredFile,
            models::ValidationError,
            models::RejectionReason,
            models::ViolatedLimit,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "uploads", description = "File upload endpoints")
    )
)]
pub struct ApiDoc;
