//! Configuration validation
//!
//! Validates configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use parcel_core::models::OutcomeMode;
use parcel_core::Config;

const LOG_FORMATS: [&str; 2] = ["compact", "json"];

/// Validate configuration values
///
/// Hard errors stop startup; questionable but workable settings only warn.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if !LOG_FORMATS.contains(&config.log_format()) {
        return Err(anyhow::anyhow!(
            "LOG_FORMAT must be one of {}, got '{}'",
            LOG_FORMATS.join(", "),
            config.log_format()
        ));
    }

    let limits = config.limits();
    let largest_ceiling = limits
        .single_max_file_size_bytes
        .max(limits.batch_max_file_size_bytes);
    if (config.max_request_body_bytes() as u64) < largest_ceiling {
        tracing::warn!(
            max_request_body_bytes = config.max_request_body_bytes(),
            largest_ceiling,
            "Request body limit is below a file size ceiling - large files fail with 413 instead of SIZE_EXCEEDED"
        );
    }

    if limits.fields_outcome == OutcomeMode::Partial {
        tracing::warn!(
            "FIELDS_OUTCOME_MODE=partial - accepted files are stored even when others in the batch are rejected"
        );
    }
    if limits.any_outcome == OutcomeMode::Partial {
        tracing::warn!(
            "ANY_OUTCOME_MODE=partial - accepted files are stored even when others in the batch are rejected"
        );
    }

    Ok(())
}
