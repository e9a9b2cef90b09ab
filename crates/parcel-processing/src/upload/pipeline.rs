//! Per-request validation and persistence for one endpoint policy.
//!
//! The pipeline owns nothing shared: the policy is decided once per route and the
//! [`StorageWriter`] is handed in per call, so concurrent requests only meet at the
//! storage root.

use parcel_core::models::{EndpointPolicy, IncomingFile, OutcomeMode, StoredFile};
use parcel_core::AppError;
use parcel_storage::{PersistError, StorageWriter};

use super::types::Partition;
use crate::selection::select_files;
use crate::validator::FileValidator;

/// Map a persistence failure onto the request-level error taxonomy
pub fn persist_error_to_app_error(err: PersistError) -> AppError {
    match err {
        PersistError::RootUnavailable(source) => AppError::StorageUnavailable(source.to_string()),
        PersistError::WriteFailed {
            field_name,
            original_name,
            source,
        } => AppError::StorageWriteFailed {
            field_name,
            original_name,
            message: source.to_string(),
        },
    }
}

#[derive(Debug, Clone)]
pub struct ValidationPipeline {
    policy: EndpointPolicy,
    validator: FileValidator,
}

impl ValidationPipeline {
    pub fn new(policy: EndpointPolicy) -> Self {
        let validator = FileValidator::new(policy.validators().to_vec());
        Self { policy, validator }
    }

    pub fn policy(&self) -> &EndpointPolicy {
        &self.policy
    }

    /// Run every file's validator chain; a failing file never stops the others
    pub fn partition(&self, files: Vec<IncomingFile>) -> Partition {
        let mut partition = Partition::default();
        for file in files {
            match self.validator.validate(&file) {
                Ok(()) => partition.accepted.push(file),
                Err(rejection) => {
                    tracing::debug!(
                        field = %rejection.field_name,
                        original = %rejection.original_name,
                        reason = %rejection.reason,
                        limit = %rejection.limit,
                        "File rejected"
                    );
                    partition.rejected.push(rejection);
                }
            }
        }
        partition
    }

    /// Select, validate and persist one request's files.
    ///
    /// All-or-nothing: any rejection fails the request with the first rejection
    /// in arrival order and nothing is written. Partial: accepted files are
    /// written, then rejections are reported together with what was stored.
    #[tracing::instrument(
        skip(self, files, writer),
        fields(shape = %self.policy.shape(), outcome = %self.policy.outcome(), file_count = files.len())
    )]
    pub async fn run(
        &self,
        files: Vec<IncomingFile>,
        writer: &StorageWriter,
    ) -> Result<Vec<StoredFile>, AppError> {
        let selected = select_files(&self.policy, files)?;
        let Partition { accepted, rejected } = self.partition(selected);

        match self.policy.outcome() {
            OutcomeMode::AllOrNothing => {
                let mut rejected = rejected.into_iter();
                if let Some(rejection) = rejected.next() {
                    return Err(AppError::FileRejected {
                        rejection,
                        also_rejected: rejected.collect(),
                    });
                }
                let stored = writer
                    .persist_all(accepted)
                    .await
                    .map_err(persist_error_to_app_error)?;
                tracing::info!(stored = stored.len(), "Upload batch stored");
                Ok(stored)
            }
            OutcomeMode::Partial => {
                let stored = writer
                    .persist_all(accepted)
                    .await
                    .map_err(persist_error_to_app_error)?;
                tracing::info!(
                    stored = stored.len(),
                    rejected = rejected.len(),
                    "Upload batch stored with partial acceptance"
                );
                if rejected.is_empty() {
                    Ok(stored)
                } else {
                    Err(AppError::PartiallyRejected { rejected, stored })
                }
            }
        }
    }
}
