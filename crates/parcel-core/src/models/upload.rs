//! Upload endpoint policies and the records that flow through the upload pipeline.
//!
//! An [`EndpointPolicy`] is decided once per route: its [`EndpointShape`] says how
//! multipart fields map to file slots, its validator chain says what every accepted
//! file must satisfy, and its [`OutcomeMode`] says what happens to a batch when some
//! files fail.

use std::collections::{BTreeMap, HashSet};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Errors raised while declaring an endpoint policy
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("Field name must not be empty")]
    EmptyFieldName,

    #[error("Field '{0}' is declared more than once")]
    DuplicateField(String),

    #[error("Field '{0}' must allow at least one file")]
    ZeroMaxCount(String),

    #[error("Partial acceptance is not allowed for {0} endpoints")]
    PartialNotAllowed(EndpointShape),
}

/// Upper bound on how many files a field may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MaxCount {
    Bounded(usize),
    Unbounded,
}

impl MaxCount {
    pub fn allows(&self, count: usize) -> bool {
        match self {
            MaxCount::Bounded(max) => count <= *max,
            MaxCount::Unbounded => true,
        }
    }
}

impl Display for MaxCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MaxCount::Bounded(max) => write!(f, "{}", max),
            MaxCount::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// A named multipart field that carries files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadField {
    pub name: String,
    pub max_count: MaxCount,
}

impl UploadField {
    pub fn new(name: impl Into<String>, max_count: MaxCount) -> Self {
        Self {
            name: name.into(),
            max_count,
        }
    }

    pub fn bounded(name: impl Into<String>, max_count: usize) -> Self {
        Self::new(name, MaxCount::Bounded(max_count))
    }
}

/// One constraint in a validator chain.
///
/// Order within a chain is significant: the first failing validator decides the
/// rejection reason for a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ValidatorSpec {
    /// Fails when the file is strictly larger than `bytes`
    MaxSize { bytes: u64 },
    /// Fails when the declared MIME type matches none of `patterns`.
    /// Patterns are exact types (`image/png`) or type wildcards (`image/*`).
    AllowedType { patterns: Vec<String> },
}

impl ValidatorSpec {
    /// Build the default chain: size first, then type.
    ///
    /// An empty allow-list leaves the chain type-agnostic.
    pub fn default_chain(max_size_bytes: u64, allowed_types: &[String]) -> Vec<ValidatorSpec> {
        let mut chain = vec![ValidatorSpec::MaxSize {
            bytes: max_size_bytes,
        }];
        if !allowed_types.is_empty() {
            chain.push(ValidatorSpec::AllowedType {
                patterns: allowed_types.to_vec(),
            });
        }
        chain
    }
}

/// How multipart parts are assigned to file slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EndpointShape {
    /// At most one file under a single field
    Single,
    /// Zero to `max_count` files under a single field
    Array,
    /// Independent bounds for each declared field; undeclared fields are ignored
    Fields,
    /// Every file part is a candidate, whatever its field name
    Any,
}

impl Display for EndpointShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            EndpointShape::Single => write!(f, "single"),
            EndpointShape::Array => write!(f, "array"),
            EndpointShape::Fields => write!(f, "fields"),
            EndpointShape::Any => write!(f, "any"),
        }
    }
}

/// Batch acceptance policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeMode {
    /// Any rejection voids the whole batch; nothing is stored
    #[default]
    AllOrNothing,
    /// Accepted files are stored; rejections are reported together afterwards
    Partial,
}

impl FromStr for OutcomeMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all_or_nothing" | "all-or-nothing" => Ok(OutcomeMode::AllOrNothing),
            "partial" => Ok(OutcomeMode::Partial),
            _ => Err(anyhow::anyhow!("Invalid outcome mode: {}", s)),
        }
    }
}

impl Display for OutcomeMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            OutcomeMode::AllOrNothing => write!(f, "all_or_nothing"),
            OutcomeMode::Partial => write!(f, "partial"),
        }
    }
}

/// Per-route upload contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPolicy {
    shape: EndpointShape,
    fields: Vec<UploadField>,
    validators: Vec<ValidatorSpec>,
    outcome: OutcomeMode,
}

impl EndpointPolicy {
    /// Exactly one file expected under `field_name`. A missing file is not an
    /// error at this layer; a second file is.
    pub fn single(field_name: impl Into<String>) -> Result<Self, PolicyError> {
        Self::build(
            EndpointShape::Single,
            vec![UploadField::bounded(field_name, 1)],
        )
    }

    /// Zero to `max_count` files under `field_name`
    pub fn array(field_name: impl Into<String>, max_count: usize) -> Result<Self, PolicyError> {
        Self::build(
            EndpointShape::Array,
            vec![UploadField::bounded(field_name, max_count)],
        )
    }

    /// Independent bounds for each declared field
    pub fn fields(fields: Vec<UploadField>) -> Result<Self, PolicyError> {
        Self::build(EndpointShape::Fields, fields)
    }

    /// Unconstrained names and counts
    pub fn any() -> Self {
        Self {
            shape: EndpointShape::Any,
            fields: Vec::new(),
            validators: Vec::new(),
            outcome: OutcomeMode::AllOrNothing,
        }
    }

    fn build(shape: EndpointShape, fields: Vec<UploadField>) -> Result<Self, PolicyError> {
        let mut seen = HashSet::new();
        for field in &fields {
            if field.name.trim().is_empty() {
                return Err(PolicyError::EmptyFieldName);
            }
            if field.max_count == MaxCount::Bounded(0) {
                return Err(PolicyError::ZeroMaxCount(field.name.clone()));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(PolicyError::DuplicateField(field.name.clone()));
            }
        }

        Ok(Self {
            shape,
            fields,
            validators: Vec::new(),
            outcome: OutcomeMode::AllOrNothing,
        })
    }

    /// Replace the validator chain applied to every accepted file
    pub fn with_validators(mut self, validators: Vec<ValidatorSpec>) -> Self {
        self.validators = validators;
        self
    }

    /// Select the batch outcome mode.
    ///
    /// Single-file and array endpoints must stay all-or-nothing.
    pub fn with_outcome(mut self, outcome: OutcomeMode) -> Result<Self, PolicyError> {
        if outcome == OutcomeMode::Partial
            && matches!(self.shape, EndpointShape::Single | EndpointShape::Array)
        {
            return Err(PolicyError::PartialNotAllowed(self.shape));
        }
        self.outcome = outcome;
        Ok(self)
    }

    pub fn shape(&self) -> EndpointShape {
        self.shape
    }

    /// Fields this policy has slots for, in declaration order
    pub fn declared_fields(&self) -> &[UploadField] {
        &self.fields
    }

    pub fn validators(&self) -> &[ValidatorSpec] {
        &self.validators
    }

    pub fn outcome(&self) -> OutcomeMode {
        self.outcome
    }

    /// Look up the declared field with the given name
    pub fn field(&self, name: &str) -> Option<&UploadField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One file part produced by multipart decoding.
///
/// The declared MIME type is whatever the client sent; it is a label, not a guarantee.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub field_name: String,
    pub original_name: String,
    pub declared_mime_type: String,
    pub size_bytes: u64,
    pub content: Bytes,
}

impl IncomingFile {
    pub fn new(
        field_name: impl Into<String>,
        original_name: impl Into<String>,
        declared_mime_type: impl Into<String>,
        content: Bytes,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            original_name: original_name.into(),
            declared_mime_type: declared_mime_type.into(),
            size_bytes: content.len() as u64,
            content,
        }
    }
}

/// A file persisted under the storage root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StoredFile {
    pub field_name: String,
    pub generated_name: String,
    #[schema(value_type = String)]
    pub storage_path: PathBuf,
    pub size_bytes: u64,
}

/// Body of a successful upload request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    /// Files written for this request, in arrival order
    pub files: Vec<StoredFile>,
    /// Non-file multipart fields, by name
    pub fields: BTreeMap<String, String>,
}

/// Why a file failed its validator chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    SizeExceeded,
    TypeRejected,
}

impl Display for RejectionReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RejectionReason::SizeExceeded => write!(f, "File size exceeded"),
            RejectionReason::TypeRejected => write!(f, "File type rejected"),
        }
    }
}

/// The threshold a rejected file violated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ViolatedLimit {
    MaxBytes { max_bytes: u64 },
    AllowedTypes { allowed: Vec<String> },
    MaxCount { max_count: usize },
}

impl Display for ViolatedLimit {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ViolatedLimit::MaxBytes { max_bytes } => write!(f, "max {} bytes", max_bytes),
            ViolatedLimit::AllowedTypes { allowed } => {
                write!(f, "allowed types: {}", allowed.join(", "))
            }
            ViolatedLimit::MaxCount { max_count } => write!(f, "max {} files", max_count),
        }
    }
}

/// A file that failed its validator chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, thiserror::Error)]
#[error("{reason} for '{original_name}' in field '{field_name}' ({limit})")]
pub struct ValidationError {
    pub field_name: String,
    pub original_name: String,
    pub reason: RejectionReason,
    pub limit: ViolatedLimit,
}
