use tracing::{debug, info};

use crate::auth::context::SessionContext;
use crate::auth::navigator::{Location, Navigator};
use crate::auth::token::SessionSnapshot;
use crate::config::AuthConfig;

/// What a protected route should do right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session check still running; show a neutral waiting indicator only
    Waiting,
    /// Render the requested content
    Render,
    /// Send the user to the login view, remembering where they were going
    Redirect { to: String, from: String },
}

/// Route-level gate in front of the admin views
#[derive(Debug, Clone)]
pub struct RouteGuard {
    login_route: String,
    dashboard_route: String,
    protected_prefixes: Vec<String>,
}

impl RouteGuard {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            login_route: config.login_route.clone(),
            dashboard_route: config.dashboard_route.clone(),
            protected_prefixes: config.protected_prefixes.clone(),
        }
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    /// Whether a path sits behind the guard. The login view never does.
    pub fn is_protected(&self, path: &str) -> bool {
        let path = strip_query(path);
        if path == self.login_route {
            return false;
        }
        self.protected_prefixes.iter().any(|prefix| {
            path == prefix
                || path
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    pub fn check(&self, session: &SessionSnapshot, path: &str) -> GuardDecision {
        if !self.is_protected(path) {
            return GuardDecision::Render;
        }
        if session.loading {
            return GuardDecision::Waiting;
        }
        if session.is_authenticated {
            GuardDecision::Render
        } else {
            GuardDecision::Redirect {
                to: self.login_route.clone(),
                from: path.to_string(),
            }
        }
    }

    /// Check the current session and perform the redirect when denied
    pub fn enforce(
        &self,
        context: &SessionContext,
        navigator: &dyn Navigator,
        path: &str,
    ) -> GuardDecision {
        let decision = self.check(&context.snapshot(), path);
        match &decision {
            GuardDecision::Redirect { to, from } => {
                info!(%from, "Protected route requires login");
                navigator.replace(Location::redirect(to.clone(), from.clone()));
            }
            GuardDecision::Waiting => debug!(path, "Waiting for session check"),
            GuardDecision::Render => {}
        }
        decision
    }

    /// Where to go after a successful login
    pub fn post_login_target(&self, navigator: &dyn Navigator) -> String {
        navigator
            .current()
            .from
            .filter(|from| self.is_protected(from))
            .unwrap_or_else(|| self.dashboard_route.clone())
    }
}

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}
