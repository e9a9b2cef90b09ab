use parcel_core::models::{
    IncomingFile, RejectionReason, ValidationError, ValidatorSpec, ViolatedLimit,
};

/// Lowercased media type with parameters (`; charset=...`) removed
pub fn normalize_mime(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}

/// Match a declared type against one allow-list pattern.
///
/// Patterns are exact types, `type/*` or `*/*`. Both sides are normalized first.
pub fn mime_matches(pattern: &str, mime: &str) -> bool {
    let pattern = normalize_mime(pattern);
    let mime = normalize_mime(mime);

    if pattern.is_empty() || mime.is_empty() {
        return false;
    }
    if pattern == "*/*" || pattern == mime {
        return true;
    }

    match pattern.strip_suffix("/*") {
        Some(top_level) => mime
            .split_once('/')
            .map(|(ty, subtype)| ty == top_level && !subtype.is_empty())
            .unwrap_or(false),
        None => false,
    }
}

/// Runs a validator chain against files.
///
/// Validators run in chain order and the first failure decides the file's
/// rejection; later validators are skipped for that file.
#[derive(Debug, Clone, Default)]
pub struct FileValidator {
    chain: Vec<ValidatorSpec>,
}

impl FileValidator {
    pub fn new(chain: Vec<ValidatorSpec>) -> Self {
        Self { chain }
    }

    /// Validate one file against the whole chain
    pub fn validate(&self, file: &IncomingFile) -> Result<(), ValidationError> {
        for spec in &self.chain {
            Self::check(spec, file)?;
        }
        Ok(())
    }

    /// Validate one file against a single validator
    pub fn check(spec: &ValidatorSpec, file: &IncomingFile) -> Result<(), ValidationError> {
        match spec {
            ValidatorSpec::MaxSize { bytes } => {
                if file.size_bytes > *bytes {
                    return Err(rejection(
                        file,
                        RejectionReason::SizeExceeded,
                        ViolatedLimit::MaxBytes { max_bytes: *bytes },
                    ));
                }
            }
            ValidatorSpec::AllowedType { patterns } => {
                if !patterns
                    .iter()
                    .any(|pattern| mime_matches(pattern, &file.declared_mime_type))
                {
                    return Err(rejection(
                        file,
                        RejectionReason::TypeRejected,
                        ViolatedLimit::AllowedTypes {
                            allowed: patterns.clone(),
                        },
                    ));
                }
            }
        }
        Ok(())
    }
}

fn rejection(file: &IncomingFile, reason: RejectionReason, limit: ViolatedLimit) -> ValidationError {
    ValidationError {
        field_name: file.field_name.clone(),
        original_name: file.original_name.clone(),
        reason,
        limit,
    }
}
