use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};

use crate::error::{ClientError, Result};

// Default configuration values
const DEFAULT_API_URL: &str = "http://localhost:5000/api";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_LOGIN_ENDPOINT: &str = "/admin/login";
const DEFAULT_VERIFY_ENDPOINT: &str = "/admin/verify";
const DEFAULT_PROFILE_ENDPOINT: &str = "/admin/profile";
const DEFAULT_LOGIN_ROUTE: &str = "/admin/login";
const DEFAULT_DASHBOARD_ROUTE: &str = "/admin/dashboard";
const DEFAULT_PROTECTED_PREFIX: &str = "/admin";

/// Main configuration struct for the FloodSense client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote API configuration
    #[serde(default)]
    pub api: ApiConfig,
    /// Session and route guard configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Persistent client storage
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Remote REST API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every request path is appended to
    #[serde(default = "default_api_url")]
    pub base_url: String,
    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Endpoints and client routes used by the session layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_login_endpoint")]
    pub login_endpoint: String,
    #[serde(default = "default_verify_endpoint")]
    pub verify_endpoint: String,
    #[serde(default = "default_profile_endpoint")]
    pub profile_endpoint: String,
    /// Client route of the login view
    #[serde(default = "default_login_route")]
    pub login_route: String,
    /// Where to go after login when no original location was recorded
    #[serde(default = "default_dashboard_route")]
    pub dashboard_route: String,
    /// Route prefixes that require a verified session
    #[serde(default = "default_protected_prefixes")]
    pub protected_prefixes: Vec<String>,
}

/// Client-side persistent storage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding the session; in-memory only when unset
    #[serde(default = "default_storage_path")]
    pub path: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_endpoint: default_login_endpoint(),
            verify_endpoint: default_verify_endpoint(),
            profile_endpoint: default_profile_endpoint(),
            login_route: default_login_route(),
            dashboard_route: default_dashboard_route(),
            protected_prefixes: default_protected_prefixes(),
        }
    }
}

impl ApiConfig {
    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl AppConfig {
    /// Build a configuration from `FLOODSENSE_*` environment variables and defaults
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::default(),
            auth: AuthConfig::default(),
            storage: StorageConfig {
                path: default_storage_path(),
            },
        }
    }

    /// Load configuration from a JSON file; missing keys fall back to defaults
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).await.map_err(|e| {
            ClientError::config_invalid(path.display().to_string(), e.to_string())
        })?;

        let config: AppConfig = serde_json::from_str(&contents).map_err(|e| {
            ClientError::config_invalid(path.display().to_string(), e.to_string())
        })?;

        config.validate()?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Reject values the client cannot work with
    pub fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.api.base_url)
            .map_err(|e| ClientError::config_invalid("api.base_url", e.to_string()))?;

        if self.api.timeout_ms == 0 {
            return Err(ClientError::config_invalid(
                "api.timeout_ms",
                "timeout must be greater than zero",
            ));
        }

        for (key, route) in [
            ("auth.login_route", &self.auth.login_route),
            ("auth.dashboard_route", &self.auth.dashboard_route),
        ] {
            if !route.starts_with('/') {
                return Err(ClientError::config_invalid(key, "route must start with '/'"));
            }
        }

        debug!(base_url = %self.api.base_url, "Configuration validated");
        Ok(())
    }
}

// Default functions
fn default_api_url() -> String {
    std::env::var("FLOODSENSE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string())
}

fn default_timeout_ms() -> u64 {
    std::env::var("FLOODSENSE_TIMEOUT_MS")
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or(DEFAULT_TIMEOUT_MS)
}

fn default_login_endpoint() -> String {
    DEFAULT_LOGIN_ENDPOINT.to_string()
}

fn default_verify_endpoint() -> String {
    DEFAULT_VERIFY_ENDPOINT.to_string()
}

fn default_profile_endpoint() -> String {
    DEFAULT_PROFILE_ENDPOINT.to_string()
}

fn default_login_route() -> String {
    std::env::var("FLOODSENSE_LOGIN_ROUTE").unwrap_or_else(|_| DEFAULT_LOGIN_ROUTE.to_string())
}

fn default_dashboard_route() -> String {
    DEFAULT_DASHBOARD_ROUTE.to_string()
}

fn default_protected_prefixes() -> Vec<String> {
    vec![DEFAULT_PROTECTED_PREFIX.to_string()]
}

fn default_storage_path() -> Option<PathBuf> {
    std::env::var_os("FLOODSENSE_STORAGE_PATH").map(PathBuf::from)
}
