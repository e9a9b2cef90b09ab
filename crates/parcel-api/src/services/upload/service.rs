use std::sync::Arc;

use axum::extract::Multipart;
use parcel_core::models::{EndpointShape, UploadResponse};
use parcel_core::AppError;
use parcel_processing::ValidationPipeline;

use crate::state::AppState;
use crate::utils::multipart::decode_multipart;

/// Runs one upload request through the pipeline of its route.
///
/// A fresh [`ValidationPipeline`] is built per request from the route's policy,
/// so requests share nothing but the storage root.
pub struct UploadService {
    state: Arc<AppState>,
}

impl UploadService {
    pub fn new(state: &Arc<AppState>) -> Self {
        Self {
            state: state.clone(),
        }
    }

    /// Complete upload workflow: decode, select, validate, store
    pub async fn upload(
        &self,
        shape: EndpointShape,
        multipart: Multipart,
    ) -> Result<UploadResponse, AppError> {
        let decoded = decode_multipart(multipart).await?;

        if !decoded.fields.is_empty() {
            tracing::debug!(fields = ?decoded.fields, "Received text fields");
        }

        let pipeline = ValidationPipeline::new(self.state.policies.for_shape(shape).clone());
        let files = pipeline.run(decoded.files, &self.state.writer).await?;

        // The single-file route needs its file; the policy alone treats absence as empty.
        if shape == EndpointShape::Single && files.is_empty() {
            let field_name = pipeline
                .policy()
                .declared_fields()
                .first()
                .map(|field| field.name.clone())
                .unwrap_or_default();
            return Err(AppError::FileRequired { field_name });
        }

        Ok(UploadResponse {
            files,
            fields: decoded.fields,
        })
    }
}
