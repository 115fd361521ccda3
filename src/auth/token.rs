use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of an admin user; the API has used both numeric and string ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Number(i64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Number(id) => write!(f, "{}", id),
            UserId::Text(id) => write!(f, "{}", id),
        }
    }
}

/// The signed-in user, as returned by the login endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,

    /// Used for display
    pub username: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Any other profile fields, kept so the record round-trips through storage
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

impl UserRecord {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: None,
            username: username.into(),
            role: None,
            email: None,
            profile: Map::new(),
        }
    }
}

/// Credentials sent to the login endpoint
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Body of a successful login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserRecord,
    #[serde(
        default,
        rename = "refreshToken",
        alias = "refresh_token",
        skip_serializing_if = "Option::is_none"
    )]
    pub refresh_token: Option<String>,
    /// Remaining fields of the response body
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of a successful verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyResponse {
    #[serde(default)]
    pub valid: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Outcome of a remote token check
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    /// The server explicitly confirmed the session
    Verified(VerifyResponse),
    /// Anything else: no token, rejected token, or no answer at all
    Unverified,
}

impl Verification {
    pub fn is_verified(&self) -> bool {
        matches!(self, Verification::Verified(_))
    }
}

/// Session state machine
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    /// Startup verification has not finished yet
    Initializing,

    /// A verified session exists
    Authenticated { user: UserRecord },

    /// No session
    Anonymous,
}

impl AuthState {
    pub fn user(&self) -> Option<&UserRecord> {
        match self {
            AuthState::Authenticated { user } => Some(user),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Initializing)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    /// Project the state into the flags a view reads
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            user: self.user().cloned(),
            is_authenticated: self.is_authenticated(),
            loading: self.is_loading(),
        }
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::Initializing => write!(f, "INITIALIZING"),
            AuthState::Authenticated { .. } => write!(f, "AUTHENTICATED"),
            AuthState::Anonymous => write!(f, "ANONYMOUS"),
        }
    }
}

/// What views and the route guard consume
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub user: Option<UserRecord>,
    pub is_authenticated: bool,
    pub loading: bool,
}
