use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::auth::navigator::{Location, Navigator};
use crate::auth::storage::TokenStore;
use crate::auth::token::{LoginRequest, LoginResponse, UserRecord, Verification, VerifyResponse};
use crate::config::AuthConfig;
use crate::error::Result;
use crate::http::{ApiClient, RequestOptions};

/// Login, logout and token checks against the admin endpoints
pub struct SessionService {
    client: Arc<ApiClient>,
    tokens: TokenStore,
    navigator: Arc<dyn Navigator>,
    config: AuthConfig,
}

impl SessionService {
    pub fn new(
        client: Arc<ApiClient>,
        tokens: TokenStore,
        navigator: Arc<dyn Navigator>,
        config: AuthConfig,
    ) -> Self {
        Self {
            client,
            tokens,
            navigator,
            config,
        }
    }

    /// Exchange credentials for a token and persist the session.
    ///
    /// Errors from the HTTP client are returned unchanged; use
    /// [`ClientError::user_message`](crate::error::ClientError::user_message)
    /// to get something displayable.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        info!(username, "Logging in");

        let credentials = LoginRequest { username, password };
        let response = self
            .client
            .post::<_, LoginResponse>(&self.config.login_endpoint, &credentials, RequestOptions::new())
            .await?;
        let body = response.data;

        self.tokens
            .save(&body.token, &body.user, body.refresh_token.as_deref())?;

        info!(username = %body.user.username, "Login succeeded");
        Ok(body)
    }

    /// Clear the stored session and send the user to the login view
    pub fn logout(&self) {
        self.clear_session();
        self.navigator
            .replace(Location::new(self.config.login_route.clone()));
        info!("Logged out");
    }

    /// Clear the stored session without navigating
    pub fn clear_session(&self) {
        if let Err(e) = self.tokens.clear() {
            error!(error = %e, "Failed to clear stored session");
        }
    }

    pub fn get_current_user(&self) -> Option<UserRecord> {
        self.tokens.get_user()
    }

    pub fn get_token(&self) -> Option<String> {
        self.tokens.get_token()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.has_token()
    }

    /// Ask the server whether the stored token is still good; never fails
    pub async fn verify_token(&self) -> Verification {
        let result = self
            .client
            .get::<VerifyResponse>(&self.config.verify_endpoint, RequestOptions::new())
            .await;

        match result {
            Ok(response) if response.data.valid => {
                debug!("Token verified");
                Verification::Verified(response.data)
            }
            Ok(_) => {
                warn!("Verification endpoint did not confirm the token");
                Verification::Unverified
            }
            Err(e) => {
                warn!(error = %e, "Token verification failed");
                Verification::Unverified
            }
        }
    }

    /// Fetch the signed-in admin's profile
    pub async fn profile(&self) -> Result<UserRecord> {
        let response = self
            .client
            .get::<UserRecord>(&self.config.profile_endpoint, RequestOptions::new())
            .await?;
        Ok(response.data)
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}
