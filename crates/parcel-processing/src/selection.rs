//! Assigns decoded file parts to the slots an endpoint policy declares.

use std::collections::HashMap;

use parcel_core::models::{EndpointPolicy, EndpointShape, IncomingFile, MaxCount};
use parcel_core::AppError;

/// Keep the files the policy has slots for, in arrival order.
///
/// A file on an undeclared field fails single-file and array endpoints with
/// `UnexpectedField`; named-field endpoints drop it. Counts are checked over
/// the whole batch before any file is validated: the first field whose count
/// goes past its bound fails the request with `TooManyFiles`.
pub fn select_files(
    policy: &EndpointPolicy,
    files: Vec<IncomingFile>,
) -> Result<Vec<IncomingFile>, AppError> {
    if policy.shape() == EndpointShape::Any {
        return Ok(files);
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut ignored = 0usize;

    for file in &files {
        let Some(field) = policy.field(&file.field_name) else {
            if policy.shape() == EndpointShape::Fields {
                ignored += 1;
                continue;
            }
            tracing::debug!(
                field = %file.field_name,
                shape = %policy.shape(),
                "File on undeclared field"
            );
            return Err(AppError::UnexpectedField {
                field_name: file.field_name.clone(),
            });
        };

        let count = counts.entry(field.name.as_str()).or_insert(0);
        *count += 1;

        if let MaxCount::Bounded(max_count) = field.max_count {
            if !field.max_count.allows(*count) {
                tracing::debug!(
                    field = %field.name,
                    max_count,
                    shape = %policy.shape(),
                    "Too many files for field"
                );
                return Err(AppError::TooManyFiles {
                    field_name: field.name.clone(),
                    max_count,
                });
            }
        }
    }

    if ignored > 0 {
        tracing::debug!(ignored, shape = %policy.shape(), "Ignoring files on undeclared fields");
    }

    Ok(files
        .into_iter()
        .filter(|file| policy.field(&file.field_name).is_some())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use parcel_core::models::UploadField;

    fn file(field: &str, name: &str) -> IncomingFile {
        IncomingFile::new(field, name, "text/plain", Bytes::from_static(b"abc"))
    }

    #[test]
    fn test_single_accepts_one_file() {
        let policy = EndpointPolicy::single("file").unwrap();
        let selected = select_files(&policy, vec![file("file", "a.png")]).unwrap();
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn test_single_missing_file_is_not_an_error() {
        let policy = EndpointPolicy::single("file").unwrap();
        let selected = select_files(&policy, Vec::new()).unwrap();
        assert!(selected.is_empty());
    }

    #[test]
    fn test_single_rejects_second_file() {
        let policy = EndpointPolicy::single("file").unwrap();
        let err = select_files(&policy, vec![file("file", "a.png"), file("file", "b.png")])
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::TooManyFiles { ref field_name, max_count: 1 } if field_name == "file"
        ));
    }

    #[test]
    fn test_array_accepts_exactly_max_count() {
        let policy = EndpointPolicy::array("files", 3).unwrap();
        let files = (0..3).map(|i| file("files", &format!("{i}.txt"))).collect();
        assert_eq!(select_files(&policy, files).unwrap().len(), 3);
    }

    #[test]
    fn test_array_rejects_over_max_count() {
        let policy = EndpointPolicy::array("files", 3).unwrap();
        let files = (0..4).map(|i| file("files", &format!("{i}.txt"))).collect();
        let err = select_files(&policy, files).unwrap_err();
        assert!(matches!(err, AppError::TooManyFiles { max_count: 3, .. }));
    }

    #[test]
    fn test_array_rejects_undeclared_field() {
        let policy = EndpointPolicy::array("files", 2).unwrap();
        let err = select_files(
            &policy,
            vec![file("files", "a.txt"), file("other", "b.txt"), file("files", "c.txt")],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AppError::UnexpectedField { ref field_name } if field_name == "other"
        ));
    }

    #[test]
    fn test_single_rejects_undeclared_field() {
        let policy = EndpointPolicy::single("file").unwrap();
        let err = select_files(&policy, vec![file("avatar", "a.png")]).unwrap_err();
        assert_eq!(err.field_name(), Some("avatar"));
    }

    #[test]
    fn test_fields_ignores_undeclared_fields() {
        let policy = EndpointPolicy::fields(vec![UploadField::bounded("a", 2)]).unwrap();
        let selected = select_files(
            &policy,
            vec![file("a", "1.txt"), file("other", "2.txt"), file("a", "3.txt")],
        )
        .unwrap();
        let names: Vec<_> = selected.iter().map(|f| f.original_name.as_str()).collect();
        assert_eq!(names, vec!["1.txt", "3.txt"]);
    }

    #[test]
    fn test_fields_bounds_are_independent() {
        let policy = EndpointPolicy::fields(vec![
            UploadField::bounded("a", 2),
            UploadField::bounded("b", 3),
        ])
        .unwrap();
        let selected = select_files(
            &policy,
            vec![
                file("a", "1"),
                file("b", "2"),
                file("b", "3"),
                file("a", "4"),
                file("b", "5"),
            ],
        )
        .unwrap();
        assert_eq!(selected.len(), 5);
    }

    #[test]
    fn test_fields_reports_the_field_that_overflowed() {
        let policy = EndpointPolicy::fields(vec![
            UploadField::bounded("a", 2),
            UploadField::bounded("b", 3),
        ])
        .unwrap();
        let err = select_files(
            &policy,
            vec![file("a", "1"), file("b", "2"), file("a", "3"), file("a", "4")],
        )
        .unwrap_err();
        assert_eq!(err.field_name(), Some("a"));
    }

    #[test]
    fn test_unbounded_field_never_overflows() {
        let policy =
            EndpointPolicy::fields(vec![UploadField::new("docs", MaxCount::Unbounded)]).unwrap();
        let files = (0..50).map(|i| file("docs", &format!("{i}"))).collect();
        assert_eq!(select_files(&policy, files).unwrap().len(), 50);
    }

    #[test]
    fn test_any_keeps_every_file() {
        let policy = EndpointPolicy::any();
        let selected = select_files(
            &policy,
            vec![file("x", "1"), file("y", "2"), file("x", "3")],
        )
        .unwrap();
        assert_eq!(selected.len(), 3);
    }
}
