//! Multipart decoding for upload handlers

use std::collections::BTreeMap;

use axum::extract::Multipart;
use parcel_core::models::IncomingFile;
use parcel_core::AppError;

use crate::error::multipart_error;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Everything a multipart body carried, split into file and text parts
#[derive(Debug, Default)]
pub struct DecodedMultipart {
    /// File parts in arrival order
    pub files: Vec<IncomingFile>,
    /// Text parts by name; a repeated name keeps its last value
    pub fields: BTreeMap<String, String>,
}

/// Read every part of a multipart body.
///
/// A part with a filename is a file; anything else is a text field. Missing
/// content types default to `application/octet-stream`.
pub async fn decode_multipart(mut multipart: Multipart) -> Result<DecodedMultipart, AppError> {
    let mut decoded = DecodedMultipart::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match field.file_name().map(|s| s.to_string()) {
            Some(original_name) => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
                let data = field.bytes().await.map_err(multipart_error)?;

                tracing::debug!(
                    field = %field_name,
                    original = %original_name,
                    content_type = %content_type,
                    size_bytes = data.len(),
                    "Received file part"
                );
                decoded
                    .files
                    .push(IncomingFile::new(field_name, original_name, content_type, data));
            }
            None => {
                let value = field.text().await.map_err(multipart_error)?;
                decoded.fields.insert(field_name, value);
            }
        }
    }

    Ok(decoded)
}
