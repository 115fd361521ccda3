//! Application-wide session state.
//!
//! One [`SessionContext`] is built at startup and shared with everything that
//! needs to know who is signed in. It starts in
//! [`AuthState::Initializing`], settles once [`SessionContext::initialize`]
//! has checked the stored session with the server, and afterwards moves only
//! through [`SessionContext::login`] and [`SessionContext::logout`].

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::auth::service::SessionService;
use crate::auth::token::{AuthState, LoginResponse, SessionSnapshot};
use crate::error::Result;

pub struct SessionContext {
    service: Arc<SessionService>,
    state: watch::Sender<AuthState>,
}

impl SessionContext {
    pub fn new(service: Arc<SessionService>) -> Self {
        let (state, _) = watch::channel(AuthState::Initializing);
        Self { service, state }
    }

    /// Check the stored session with the server and settle the state.
    ///
    /// Always ends in `Authenticated` or `Anonymous`, even if the check
    /// itself panics. A login or logout that lands while the check is in
    /// flight wins over the check's result.
    pub async fn initialize(&self) -> AuthState {
        self.state.send_if_modified(|current| {
            if current.is_loading() {
                false
            } else {
                *current = AuthState::Initializing;
                true
            }
        });

        let service = self.service.clone();
        let checked_token = self.service.get_token();
        let outcome = match tokio::spawn(check_stored_session(service, checked_token.clone())).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Session check aborted");
                AuthState::Anonymous
            }
        };

        let applied = self.state.send_if_modified(|current| {
            if current.is_loading() {
                *current = outcome.clone();
                true
            } else {
                false
            }
        });

        let state = self.state();
        if applied {
            if !state.is_authenticated() {
                self.clear_checked_session(checked_token.as_deref());
            }
            info!(%state, "Session check settled");
        } else {
            debug!(%state, "Session changed during startup check, keeping it");
        }
        state
    }

    /// Log in and move straight to `Authenticated`; on failure nothing changes
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let body = self.service.login(username, password).await?;
        self.state.send_replace(AuthState::Authenticated {
            user: body.user.clone(),
        });
        Ok(body)
    }

    pub fn logout(&self) {
        self.service.logout();
        self.state.send_replace(AuthState::Anonymous);
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().snapshot()
    }

    /// Observe every state transition
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Wait until startup verification is over
    pub async fn settled(&self) -> SessionSnapshot {
        let mut receiver = self.state.subscribe();
        let snapshot = match receiver.wait_for(|state| !state.is_loading()).await {
            Ok(state) => state.snapshot(),
            Err(_) => self.snapshot(),
        };
        snapshot
    }

    pub fn service(&self) -> &Arc<SessionService> {
        &self.service
    }

    /// Drop the rejected session, unless a login has replaced it meanwhile
    fn clear_checked_session(&self, checked_token: Option<&str>) {
        match self.service.tokens().clear_if_token(checked_token) {
            Ok(true) => {}
            Ok(false) => debug!("A newer session was stored during the check, keeping it"),
            Err(e) => error!(error = %e, "Failed to clear stored session"),
        }
    }
}

/// Decide the startup state from storage and the server; storage is left as is
async fn check_stored_session(service: Arc<SessionService>, token: Option<String>) -> AuthState {
    let user = service.get_current_user();

    let user = match (user, token) {
        (Some(user), Some(_)) => user,
        _ => {
            debug!("No complete stored session");
            return AuthState::Anonymous;
        }
    };

    if service.verify_token().await.is_verified() {
        AuthState::Authenticated { user }
    } else {
        info!(username = %user.username, "Stored session rejected");
        AuthState::Anonymous
    }
}
