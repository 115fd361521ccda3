use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Result alias used throughout the client
pub type Result<T> = std::result::Result<T, ClientError>;

/// Error categories, mirroring how a view is expected to react to a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// No response was received (connection failure, timeout)
    Network,
    /// The server answered with a non-2xx status
    Server,
    /// The server answered 2xx but the body did not match the expected schema
    Decode,
    /// Locally persisted state could not be read or written
    LocalState,
    /// The caller cancelled the request before it completed
    Cancelled,
    /// The client was configured with unusable values
    Configuration,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Network => "NETWORK",
            ErrorCategory::Server => "SERVER",
            ErrorCategory::Decode => "DECODE",
            ErrorCategory::LocalState => "LOCAL_STATE",
            ErrorCategory::Cancelled => "CANCELLED",
            ErrorCategory::Configuration => "CONFIGURATION",
        };
        write!(f, "{}", name)
    }
}

/// Errors produced by the FloodSense client
#[derive(Error, Debug, Clone)]
pub enum ClientError {
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("server responded to {url} with status {status}")]
    Http {
        url: String,
        status: u16,
        /// Raw response body, kept untouched for callers
        body: String,
    },

    #[error("failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("request to {url} was cancelled")]
    Cancelled { url: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("storage failure for key '{key}': {reason}")]
    Storage { key: String, reason: String },

    #[error("invalid configuration value for '{key}': {reason}")]
    ConfigInvalid { key: String, reason: String },
}

impl ClientError {
    /// Create a storage error
    pub fn storage(key: impl Into<String>, reason: impl fmt::Display) -> Self {
        ClientError::Storage {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config_invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ClientError::ConfigInvalid {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            ClientError::Timeout { .. } | ClientError::Transport { .. } => ErrorCategory::Network,
            ClientError::Http { .. } => ErrorCategory::Server,
            ClientError::Decode { .. } => ErrorCategory::Decode,
            ClientError::Cancelled { .. } => ErrorCategory::Cancelled,
            ClientError::Storage { .. } => ErrorCategory::LocalState,
            ClientError::InvalidRequest(_) | ClientError::ConfigInvalid { .. } => {
                ErrorCategory::Configuration
            }
        }
    }

    /// HTTP status code returned by the server, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw server error body, if any
    pub fn body(&self) -> Option<&str> {
        match self {
            ClientError::Http { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Server error body parsed as JSON, if it is JSON
    pub fn body_json(&self) -> Option<Value> {
        self.body().and_then(|body| serde_json::from_str(body).ok())
    }

    /// The `error` or `message` field of the server's error body
    pub fn server_message(&self) -> Option<String> {
        let body = self.body_json()?;
        ["error", "message"].iter().find_map(|field| {
            body.get(field)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
    }

    /// Message suitable for showing to a user, with a generic fallback
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message()
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Whether the server rejected our credentials
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http_error(status: u16, body: &str) -> ClientError {
        ClientError::Http {
            url: "http://localhost/api/admin/login".to_string(),
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_user_message_prefers_error_field() {
        let err = http_error(401, r#"{"error":"Invalid credentials","message":"nope"}"#);
        assert_eq!(err.user_message("Login failed"), "Invalid credentials");
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_user_message_falls_back_to_message_then_generic() {
        let err = http_error(400, r#"{"message":"Username is required"}"#);
        assert_eq!(err.user_message("Login failed"), "Username is required");

        let err = http_error(500, "<html>Internal Server Error</html>");
        assert_eq!(err.user_message("Login failed"), "Login failed");
        assert!(err.body_json().is_none());
    }

    #[test]
    fn test_categories() {
        assert_eq!(http_error(404, "").category(), ErrorCategory::Server);
        let timeout = ClientError::Timeout {
            url: "http://localhost".to_string(),
            timeout: Duration::from_secs(10),
        };
        assert_eq!(timeout.category(), ErrorCategory::Network);
        assert_eq!(timeout.status(), None);
        assert_eq!(
            ClientError::storage("floodsense_admin_user", "disk full").category(),
            ErrorCategory::LocalState
        );
        assert_eq!(ErrorCategory::LocalState.to_string(), "LOCAL_STATE");
    }
}
