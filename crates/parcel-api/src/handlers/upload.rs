use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use parcel_core::models::{EndpointShape, UploadResponse};

use crate::error::{ErrorResponse, HttpAppError};
use crate::services::upload::UploadService;
use crate::state::AppState;

type UploadResult = Result<(StatusCode, Json<UploadResponse>), HttpAppError>;

async fn handle_upload(
    state: Arc<AppState>,
    shape: EndpointShape,
    multipart: Result<Multipart, MultipartRejection>,
) -> UploadResult {
    let multipart = multipart?;
    let response = UploadService::new(&state).upload(shape, multipart).await?;

    tracing::info!(
        stored = response.files.len(),
        fields = response.fields.len(),
        "Upload completed"
    );

    Ok((StatusCode::CREATED, Json(response)))
}

/// Greeting route
#[utoipa::path(
    get,
    path = "/",
    tag = "uploads",
    responses((status = 200, description = "Greeting", body = String))
)]
pub async fn index() -> &'static str {
    "Hello World!"
}

/// Upload one file under `file`
///
/// The file must fit the single-file ceiling and match its allow-list
/// (by default 1024 bytes and `image/png`). A missing file is `FILE_REQUIRED`,
/// a second file under `file` is `TOO_MANY_FILES` and a file under any other
/// field is `UNEXPECTED_FIELD`.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "uploads",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File stored", body = UploadResponse),
        (status = 400, description = "File rejected or malformed request", body = ErrorResponse),
        (status = 413, description = "Request body too large", body = ErrorResponse),
        (status = 500, description = "Storage write failed", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_single"))]
pub async fn upload_single(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> UploadResult {
    handle_upload(state, EndpointShape::Single, multipart).await
}

/// Upload up to `ARRAY_MAX_COUNT` files under `files`
///
/// All-or-nothing: one rejected file fails the request and nothing is stored.
/// Files under any other field are `UNEXPECTED_FIELD`.
#[utoipa::path(
    post,
    path = "/upload-multiple",
    tag = "uploads",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Files stored", body = UploadResponse),
        (status = 400, description = "Files rejected or malformed request", body = ErrorResponse),
        (status = 413, description = "Request body too large", body = ErrorResponse),
        (status = 500, description = "Storage write failed", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_array"))]
pub async fn upload_multiple(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> UploadResult {
    handle_upload(state, EndpointShape::Array, multipart).await
}

/// Upload files under the declared field groups
///
/// Each group has its own bound (by default `a-type-files` up to 2 and
/// `b-type-files` up to 3). Files on other fields are ignored.
#[utoipa::path(
    post,
    path = "/upload-multiple-with-specified-fields",
    tag = "uploads",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Files stored", body = UploadResponse),
        (status = 400, description = "Files rejected or malformed request", body = ErrorResponse),
        (status = 413, description = "Request body too large", body = ErrorResponse),
        (status = 500, description = "Storage write failed", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_fields"))]
pub async fn upload_multiple_with_specified_fields(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> UploadResult {
    handle_upload(state, EndpointShape::Fields, multipart).await
}

/// Upload any number of files under any field names
#[utoipa::path(
    post,
    path = "/upload-multiple-with-fields",
    tag = "uploads",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Files stored", body = UploadResponse),
        (status = 400, description = "Files rejected or malformed request", body = ErrorResponse),
        (status = 413, description = "Request body too large", body = ErrorResponse),
        (status = 500, description = "Storage write failed", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_any"))]
pub async fn upload_multiple_with_fields(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> UploadResult {
    handle_upload(state, EndpointShape::Any, multipart).await
}
