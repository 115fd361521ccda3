//! Integration test harness for FloodSense
//! Provides a mock API server and a client wired to it

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mockito::{Server, ServerGuard};
use serde_json::Value;
use uuid::Uuid;

use floodsense_lib::auth::MemoryRouter;
use floodsense_lib::http::ReqwestTransport;
use floodsense_lib::{AppConfig, FloodSense};

/// A session file in the temp directory, removed when dropped
pub struct StorageFile(PathBuf);

impl StorageFile {
    pub fn new() -> Self {
        let dir = std::env::temp_dir().join("floodsense-tests");
        Self(dir.join(format!("{}.json", Uuid::new_v4())))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Write raw key/value pairs, as a previous run would have left them
    pub fn seed(&self, entries: Value) {
        if let Some(parent) = self.0.parent() {
            fs::create_dir_all(parent).expect("create storage dir");
        }
        fs::write(&self.0, entries.to_string()).expect("write storage file");
    }

    /// Current contents of the file, or an empty object if missing
    pub fn contents(&self) -> Value {
        fs::read_to_string(&self.0)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_else(|| serde_json::json!({}))
    }
}

impl Drop for StorageFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.0);
    }
}

/// A client pointed at a fresh mock server
pub struct TestApp {
    pub server: ServerGuard,
    pub router: Arc<MemoryRouter>,
    pub app: FloodSense,
}

impl TestApp {
    /// Start a mock server and build a client storing its session in `storage`
    pub async fn start(storage: &StorageFile) -> Self {
        let server = Server::new_async().await;
        Self::with_server(server, storage)
    }

    /// Build a second client against an existing server, like a page reload
    pub fn with_server(server: ServerGuard, storage: &StorageFile) -> Self {
        let mut config = AppConfig::default();
        config.api.base_url = format!("{}/api", server.url());
        config.api.timeout_ms = 5_000;
        config.storage.path = Some(storage.path().to_path_buf());

        let router = Arc::new(MemoryRouter::default());
        let app = FloodSense::with_parts(
            config,
            Arc::new(ReqwestTransport::new()),
            router.clone(),
            None,
        )
        .expect("valid test config");

        Self { server, router, app }
    }

    /// Tear down the client, keeping the server for the next one
    pub fn into_server(self) -> ServerGuard {
        self.server
    }
}
