//! Application state.
//!
//! Built once at startup from `Config`; handlers only read it.

use std::sync::Arc;

use parcel_core::models::{EndpointPolicy, EndpointShape, PolicyError, ValidatorSpec};
use parcel_core::{Config, UploadLimits};
use parcel_storage::{Storage, StorageWriter};

/// One policy per upload route
#[derive(Debug, Clone)]
pub struct EndpointPolicies {
    pub single: EndpointPolicy,
    pub array: EndpointPolicy,
    pub fields: EndpointPolicy,
    pub any: EndpointPolicy,
}

impl EndpointPolicies {
    /// Single-file route: `file`, small ceiling and allow-list. The three batch
    /// routes share the batch ceiling and allow-list.
    pub fn from_limits(limits: &UploadLimits) -> Result<Self, PolicyError> {
        let single_chain = ValidatorSpec::default_chain(
            limits.single_max_file_size_bytes,
            &limits.single_allowed_content_types,
        );
        let batch_chain = ValidatorSpec::default_chain(
            limits.batch_max_file_size_bytes,
            &limits.batch_allowed_content_types,
        );

        Ok(Self {
            single: EndpointPolicy::single("file")?.with_validators(single_chain),
            array: EndpointPolicy::array("files", limits.array_max_count)?
                .with_validators(batch_chain.clone()),
            fields: EndpointPolicy::fields(limits.field_groups.clone())?
                .with_validators(batch_chain.clone())
                .with_outcome(limits.fields_outcome)?,
            any: EndpointPolicy::any()
                .with_validators(batch_chain)
                .with_outcome(limits.any_outcome)?,
        })
    }

    pub fn for_shape(&self, shape: EndpointShape) -> &EndpointPolicy {
        match shape {
            EndpointShape::Single => &self.single,
            EndpointShape::Array => &self.array,
            EndpointShape::Fields => &self.fields,
            EndpointShape::Any => &self.any,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub writer: StorageWriter,
    pub policies: EndpointPolicies,
}

impl AppState {
    pub fn new(config: Config, storage: Arc<dyn Storage>) -> Result<Self, anyhow::Error> {
        let policies = EndpointPolicies::from_limits(config.limits())?;
        let writer = StorageWriter::new(storage, config.upload_root().clone());
        Ok(Self {
            config,
            writer,
            policies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcel_core::models::{MaxCount, OutcomeMode, UploadField};

    #[test]
    fn test_default_policies() {
        let policies = EndpointPolicies::from_limits(&UploadLimits::default()).unwrap();

        assert_eq!(policies.single.shape(), EndpointShape::Single);
        assert_eq!(policies.single.declared_fields(), &[UploadField::bounded("file", 1)]);
        assert_eq!(
            policies.single.validators(),
            &[
                ValidatorSpec::MaxSize { bytes: 1024 },
                ValidatorSpec::AllowedType {
                    patterns: vec!["image/png".to_string()]
                },
            ]
        );

        assert_eq!(policies.array.declared_fields()[0].max_count, MaxCount::Bounded(10));
        assert_eq!(
            policies.array.validators(),
            &[ValidatorSpec::MaxSize { bytes: 10240 }]
        );

        let names: Vec<_> = policies.fields.declared_fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a-type-files", "b-type-files"]);
        assert_eq!(policies.any.outcome(), OutcomeMode::AllOrNothing);
    }

    #[test]
    fn test_partial_outcome_is_applied_to_batch_routes() {
        let limits = UploadLimits {
            fields_outcome: OutcomeMode::Partial,
            any_outcome: OutcomeMode::Partial,
            ..UploadLimits::default()
        };
        let policies = EndpointPolicies::from_limits(&limits).unwrap();
        assert_eq!(policies.fields.outcome(), OutcomeMode::Partial);
        assert_eq!(policies.any.outcome(), OutcomeMode::Partial);
        assert_eq!(policies.array.outcome(), OutcomeMode::AllOrNothing);
    }
}
