//! Configuration module
//!
//! Configuration is loaded once at startup and threaded explicitly into storage
//! and policy construction. Nothing reads the environment after `from_env`.

use std::collections::HashSet;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;

use crate::models::{MaxCount, OutcomeMode, UploadField};
use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 3000;
const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;
const SINGLE_MAX_FILE_SIZE_BYTES: u64 = 1024;
const BATCH_MAX_FILE_SIZE_BYTES: u64 = 10 * 1024;
const ARRAY_MAX_COUNT: usize = 10;
const UPLOAD_DIR: &str = "uploads";

/// Settings shared by every route
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
    pub max_request_body_bytes: usize,
    pub http_concurrency_limit: usize,
    /// `compact` or `json`
    pub log_format: String,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            server_port: SERVER_PORT,
            environment: "development".to_string(),
            max_request_body_bytes: MAX_REQUEST_BODY_BYTES,
            http_concurrency_limit: HTTP_CONCURRENCY_LIMIT,
            log_format: "compact".to_string(),
        }
    }
}

/// Ceilings, allow-lists and count bounds for the upload routes
#[derive(Clone, Debug)]
pub struct UploadLimits {
    pub single_max_file_size_bytes: u64,
    pub single_allowed_content_types: Vec<String>,
    pub batch_max_file_size_bytes: u64,
    pub batch_allowed_content_types: Vec<String>,
    pub array_max_count: usize,
    pub field_groups: Vec<UploadField>,
    pub fields_outcome: OutcomeMode,
    pub any_outcome: OutcomeMode,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            single_max_file_size_bytes: SINGLE_MAX_FILE_SIZE_BYTES,
            single_allowed_content_types: vec!["image/png".to_string()],
            batch_max_file_size_bytes: BATCH_MAX_FILE_SIZE_BYTES,
            batch_allowed_content_types: Vec::new(),
            array_max_count: ARRAY_MAX_COUNT,
            field_groups: vec![
                UploadField::bounded("a-type-files", 2),
                UploadField::bounded("b-type-files", 3),
            ],
            fields_outcome: OutcomeMode::AllOrNothing,
            any_outcome: OutcomeMode::AllOrNothing,
        }
    }
}

/// Upload service configuration
#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub base: BaseConfig,
    pub storage_backend: StorageBackend,
    pub upload_root: PathBuf,
    pub limits: UploadLimits,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            base: BaseConfig::default(),
            storage_backend: StorageBackend::Local,
            upload_root: PathBuf::from(UPLOAD_DIR),
            limits: UploadLimits::default(),
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<UploadConfig>);

impl From<UploadConfig> for Config {
    fn from(config: UploadConfig) -> Self {
        Config(Box::new(config))
    }
}

impl Config {
    fn as_upload(&self) -> &UploadConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = UploadConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_upload().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.environment().to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.as_upload().base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.as_upload().base.environment
    }

    pub fn max_request_body_bytes(&self) -> usize {
        self.as_upload().base.max_request_body_bytes
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.as_upload().base.http_concurrency_limit
    }

    pub fn log_format(&self) -> &str {
        &self.as_upload().base.log_format
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_upload().storage_backend
    }

    pub fn upload_root(&self) -> &PathBuf {
        &self.as_upload().upload_root
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.as_upload().limits
    }
}

/// Read an environment variable and parse it, falling back to `default` when unset.
/// A value that is set but does not parse is an error.
fn env_parse<T>(key: &str, default: T) -> Result<T, anyhow::Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", key, raw, e)),
        Err(_) => Ok(default),
    }
}

fn env_list(key: &str, default: &[String]) -> Vec<String> {
    match env::var(key) {
        Ok(raw) => parse_list(&raw),
        Err(_) => default.to_vec(),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse `name:count` pairs, e.g. `a-type-files:2,b-type-files:3`.
/// A count of `*` leaves the field unbounded.
pub fn parse_field_groups(raw: &str) -> Result<Vec<UploadField>, anyhow::Error> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| -> Result<UploadField, anyhow::Error> {
            let (name, count) = entry
                .rsplit_once(':')
                .ok_or_else(|| anyhow::anyhow!("Field group '{}' must be name:count", entry))?;
            let name = name.trim();
            let max_count = match count.trim() {
                "*" => MaxCount::Unbounded,
                n => MaxCount::Bounded(
                    n.parse::<usize>()
                        .with_context(|| format!("Invalid max count in field group '{}'", entry))?,
                ),
            };
            Ok(UploadField::new(name, max_count))
        })
        .collect()
}

impl UploadConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let defaults = UploadLimits::default();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let base = BaseConfig {
            server_port: env_parse("PORT", SERVER_PORT)?,
            environment,
            max_request_body_bytes: env_parse("MAX_REQUEST_BODY_BYTES", MAX_REQUEST_BODY_BYTES)?,
            http_concurrency_limit: env_parse("HTTP_CONCURRENCY_LIMIT", HTTP_CONCURRENCY_LIMIT)?,
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        };

        let upload_root = match env::var("UPLOAD_ROOT") {
            Ok(root) => PathBuf::from(root),
            Err(_) => env::current_dir()
                .context("Failed to resolve current directory")?
                .join(UPLOAD_DIR),
        };

        let field_groups = match env::var("FIELD_GROUPS") {
            Ok(raw) => parse_field_groups(&raw)?,
            Err(_) => defaults.field_groups.clone(),
        };

        let limits = UploadLimits {
            single_max_file_size_bytes: env_parse(
                "SINGLE_MAX_FILE_SIZE_BYTES",
                defaults.single_max_file_size_bytes,
            )?,
            single_allowed_content_types: env_list(
                "SINGLE_ALLOWED_CONTENT_TYPES",
                &defaults.single_allowed_content_types,
            ),
            batch_max_file_size_bytes: env_parse(
                "BATCH_MAX_FILE_SIZE_BYTES",
                defaults.batch_max_file_size_bytes,
            )?,
            batch_allowed_content_types: env_list(
                "BATCH_ALLOWED_CONTENT_TYPES",
                &defaults.batch_allowed_content_types,
            ),
            array_max_count: env_parse("ARRAY_MAX_COUNT", defaults.array_max_count)?,
            field_groups,
            fields_outcome: env_parse("FIELDS_OUTCOME_MODE", defaults.fields_outcome)?,
            any_outcome: env_parse("ANY_OUTCOME_MODE", defaults.any_outcome)?,
        };

        let config = UploadConfig {
            base,
            storage_backend: env_parse("STORAGE_BACKEND", StorageBackend::Local)?,
            upload_root,
            limits,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.max_request_body_bytes == 0 {
            return Err(anyhow::anyhow!("Max request body size cannot be 0"));
        }

        if self.base.http_concurrency_limit == 0 {
            return Err(anyhow::anyhow!("HTTP_CONCURRENCY_LIMIT cannot be 0"));
        }

        if self.upload_root.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("UPLOAD_ROOT cannot be empty"));
        }

        let limits = &self.limits;
        if limits.single_max_file_size_bytes == 0 || limits.batch_max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("Max file size cannot be 0"));
        }

        if limits.array_max_count == 0 {
            return Err(anyhow::anyhow!("ARRAY_MAX_COUNT cannot be 0"));
        }

        let mut seen = HashSet::new();
        for field in &limits.field_groups {
            if field.name.is_empty() {
                return Err(anyhow::anyhow!("Field group names cannot be empty"));
            }
            if field.max_count == MaxCount::Bounded(0) {
                return Err(anyhow::anyhow!(
                    "Field group '{}' must allow at least one file",
                    field.name
                ));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(anyhow::anyhow!(
                    "Field group '{}' is declared more than once",
                    field.name
                ));
            }
        }

        Ok(())
    }
}
