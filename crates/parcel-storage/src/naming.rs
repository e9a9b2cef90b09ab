//! Collision-resistant storage names.
//!
//! `generate_name` is a pure function of its inputs; wall-clock time and randomness
//! come in through [`Clock`] and [`RandomSource`] so tests can pin both.

use std::sync::Arc;

/// Wall-clock source, in milliseconds since the Unix epoch
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Source of uniformly distributed 64-bit suffixes.
///
/// Collision avoidance only; cryptographic strength is not required.
pub trait RandomSource: Send + Sync {
    fn next_u64(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_u64(&self) -> u64 {
        rand::random::<u64>()
    }
}

/// Longest file name most filesystems accept (NAME_MAX), in bytes
pub const MAX_NAME_LENGTH: usize = 255;

/// Cap on the field part of a generated name so the original name keeps most of the budget
const MAX_FIELD_SEGMENT_LENGTH: usize = 64;

/// Reduce a client-supplied name to a single safe path segment.
///
/// Directory components are dropped and characters outside `[A-Za-z0-9._-]`
/// become `_`, so the result is always ASCII. Names that end up empty or made
/// only of dots become `file`.
pub fn sanitize_segment(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let sanitized: String = base
        .chars()
        .take(MAX_NAME_LENGTH)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.chars().all(|c| c == '.') {
        return "file".to_string();
    }

    sanitized
}

/// Shorten a sanitized segment to at most `budget` bytes, keeping its extension
/// when the extension itself fits.
fn fit_segment(segment: &str, budget: usize) -> String {
    if segment.len() <= budget {
        return segment.to_string();
    }

    match segment.rfind('.') {
        Some(dot) if dot > 0 && segment.len() - dot < budget => {
            let extension = &segment[dot..];
            let stem: String = segment[..dot]
                .chars()
                .take(budget - extension.len())
                .collect();
            format!("{stem}{extension}")
        }
        _ => segment.chars().take(budget).collect(),
    }
}

/// `{field}-{timestamp_millis}-{random}-{original}`, at most [`MAX_NAME_LENGTH`] bytes.
///
/// Long original names lose the end of their stem; the extension is kept.
pub fn generate_name(
    field_name: &str,
    original_name: &str,
    clock: &dyn Clock,
    random: &dyn RandomSource,
) -> String {
    let field = fit_segment(&sanitize_segment(field_name), MAX_FIELD_SEGMENT_LENGTH);
    let prefix = format!("{}-{}-{}-", field, clock.now_millis(), random.next_u64());
    let original = fit_segment(
        &sanitize_segment(original_name),
        MAX_NAME_LENGTH - prefix.len(),
    );

    format!("{prefix}{original}")
}

/// Injectable name generator shared by every writer of a storage root
#[derive(Clone)]
pub struct NameGenerator {
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
}

impl NameGenerator {
    pub fn new(clock: Arc<dyn Clock>, random: Arc<dyn RandomSource>) -> Self {
        Self { clock, random }
    }

    pub fn generate(&self, field_name: &str, original_name: &str) -> String {
        generate_name(
            field_name,
            original_name,
            self.clock.as_ref(),
            self.random.as_ref(),
        )
    }
}

impl Default for NameGenerator {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(ThreadRandom))
    }
}

impl std::fmt::Debug for NameGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameGenerator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct FixedClock(i64);

    impl Clock for FixedClock {
        fn now_millis(&self) -> i64 {
            self.0
        }
    }

    struct FixedRandom(u64);

    impl RandomSource for FixedRandom {
        fn next_u64(&self) -> u64 {
            self.0
        }
    }

    struct CountingRandom(AtomicU64);

    impl RandomSource for CountingRandom {
        fn next_u64(&self) -> u64 {
            self.0.fetch_add(1, Ordering::Relaxed)
        }
    }

    #[test]
    fn test_generate_name_layout() {
        let name = generate_name("file", "photo.png", &FixedClock(1700000000000), &FixedRandom(42));
        assert_eq!(name, "file-1700000000000-42-photo.png");
    }

    #[test]
    fn test_same_millisecond_names_differ() {
        let generator = NameGenerator::new(
            Arc::new(FixedClock(1700000000000)),
            Arc::new(CountingRandom(AtomicU64::new(7))),
        );
        let first = generator.generate("files", "same.txt");
        let second = generator.generate("files", "same.txt");
        assert_ne!(first, second);
    }

    #[test]
    fn test_system_sources_are_unique_in_practice() {
        let generator = NameGenerator::default();
        let names: HashSet<String> = (0..1000)
            .map(|_| generator.generate("files", "same.txt"))
            .collect();
        assert_eq!(names.len(), 1000);
    }

    #[test]
    fn test_sanitize_segment_strips_directories() {
        assert_eq!(sanitize_segment("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_segment("C:\\temp\\report.pdf"), "report.pdf");
    }

    #[test]
    fn test_sanitize_segment_replaces_unsafe_characters() {
        assert_eq!(sanitize_segment("my photo (1).png"), "my_photo__1_.png");
        assert_eq!(sanitize_segment("a-type-files"), "a-type-files");
    }

    #[test]
    fn test_long_original_name_fits_and_keeps_extension() {
        let original = format!("{}.txt", "a".repeat(250));
        let name = generate_name(
            "files",
            &original,
            &FixedClock(1700000000000),
            &FixedRandom(u64::MAX),
        );
        assert_eq!(name.len(), MAX_NAME_LENGTH);
        assert!(name.starts_with("files-1700000000000-18446744073709551615-aaa"));
        assert!(name.ends_with("a.txt"));
    }

    #[test]
    fn test_long_field_and_extensionless_name_fit() {
        let name = generate_name(
            &"f".repeat(300),
            &"b".repeat(300),
            &FixedClock(1700000000000),
            &FixedRandom(1),
        );
        assert_eq!(name.len(), MAX_NAME_LENGTH);
        assert!(name.starts_with(&format!("{}-1700000000000-1-", "f".repeat(64))));
    }

    #[test]
    fn test_oversized_extension_is_truncated_like_a_stem() {
        let original = format!("x.{}", "e".repeat(300));
        let name = generate_name("file", &original, &FixedClock(1), &FixedRandom(2));
        assert_eq!(name.len(), MAX_NAME_LENGTH);
        assert!(name.starts_with("file-1-2-x.eee"));
    }

    #[test]
    fn test_short_names_are_untouched() {
        assert_eq!(fit_segment("photo.png", 20), "photo.png");
    }

    #[test]
    fn test_sanitize_segment_falls_back_for_dot_names() {
        assert_eq!(sanitize_segment(".."), "file");
        assert_eq!(sanitize_segment(""), "file");
        assert_eq!(sanitize_segment("dir/"), "file");
    }
}
