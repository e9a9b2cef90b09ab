//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p parcel-api --test upload_test`.
//! Every test app gets its own temporary storage root.

#![allow(dead_code)]

use axum_test::multipart::Part;
use axum_test::TestServer;
use parcel_api::setup::routes;
use parcel_api::state::AppState;
use parcel_core::config::UploadConfig;
use parcel_core::Config;
use parcel_storage::{LocalStorage, Storage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Test application: server and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub root: PathBuf,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Names of every file under the storage root, sorted
    pub fn stored_names(&self) -> Vec<String> {
        list_names(&self.root)
    }
}

pub fn list_names(root: &Path) -> Vec<String> {
    let mut names: Vec<String> = match std::fs::read_dir(root) {
        Ok(entries) => entries
            .map(|entry| {
                entry
                    .expect("Failed to read directory entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}

/// Default configuration rooted at `root`
pub fn create_test_config(root: &Path) -> UploadConfig {
    UploadConfig {
        upload_root: root.to_path_buf(),
        ..UploadConfig::default()
    }
}

/// Setup test app with default limits and local storage.
pub fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {})
}

/// Setup test app after adjusting the default configuration.
pub fn setup_test_app_with(configure: impl FnOnce(&mut UploadConfig)) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let root = temp_dir.path().join("uploads");

    let mut inner = create_test_config(&root);
    configure(&mut inner);
    let root = inner.upload_root.clone();

    let storage: Arc<dyn Storage> = Arc::new(LocalStorage::new());
    let server = build_server(Config::from(inner), storage);

    TestApp {
        server,
        root,
        _temp_dir: temp_dir,
    }
}

pub fn build_server(config: Config, storage: Arc<dyn Storage>) -> TestServer {
    let state = Arc::new(AppState::new(config.clone(), storage).expect("Failed to build state"));
    let app = routes::setup_routes(&config, state).expect("Failed to setup routes");
    TestServer::new(app.into_make_service()).expect("Failed to create test server")
}

/// A file part of `size` bytes
pub fn file_part(name: &str, mime: &str, size: usize) -> Part {
    Part::bytes(bytes::Bytes::from(vec![b'x'; size]))
        .file_name(name.to_string())
        .mime_type(mime.to_string())
}
