pub mod upload;

pub use upload::{
    EndpointPolicy, EndpointShape, IncomingFile, MaxCount, OutcomeMode, PolicyError,
    RejectionReason, StoredFile, UploadField, UploadResponse, ValidationError, ValidatorSpec,
    ViolatedLimit,
};
