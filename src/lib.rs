//! Client core for the FloodSense flood monitoring dashboard.
//!
//! [`FloodSense`] wires one authorized [`ApiClient`](crate::http::ApiClient), the
//! persisted session and the typed resource services together. Build it once
//! at startup and share it.

use std::sync::Arc;

use tracing::{debug, info};

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod risk;

use crate::api::{AlertService, DashboardService, LocationService, ReadingService, SubscriptionService};
use crate::auth::{
    BearerAuthorizer, FileStore, KeyValueStore, MemoryRouter, MemoryStore, Navigator, RouteGuard,
    SessionContext, SessionService, TokenStore,
};
use crate::http::{ApiClient, HttpTransport, ReqwestTransport};

pub use config::AppConfig;
pub use error::{ClientError, ErrorCategory, Result};

/// Crate version, reported by the admin console
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The assembled client: one HTTP client, one session, every resource service
pub struct FloodSense {
    config: AppConfig,
    client: Arc<ApiClient>,
    tokens: TokenStore,
    navigator: Arc<dyn Navigator>,
    session: Arc<SessionContext>,
    guard: RouteGuard,
    pub locations: LocationService,
    pub alerts: AlertService,
    pub subscriptions: SubscriptionService,
    pub readings: ReadingService,
    pub dashboard: DashboardService,
}

impl FloodSense {
    /// Build against the real network, starting at the root route
    pub fn new(config: AppConfig) -> Result<Self> {
        let navigator = Arc::new(MemoryRouter::default());
        Self::with_parts(config, Arc::new(ReqwestTransport::new()), navigator, None)
    }

    /// Build with explicit collaborators.
    ///
    /// `store` overrides the configured storage; when `None`, a file store is
    /// used if `storage.path` is set and memory otherwise.
    pub fn with_parts(
        config: AppConfig,
        transport: Arc<dyn HttpTransport>,
        navigator: Arc<dyn Navigator>,
        store: Option<Arc<dyn KeyValueStore>>,
    ) -> Result<Self> {
        config.validate()?;

        let store = store.unwrap_or_else(|| open_store(&config));
        let tokens = TokenStore::new(store);

        let client = Arc::new(ApiClient::with_transport(&config.api, transport));
        client.add_interceptor(Arc::new(BearerAuthorizer::new(tokens.clone())));

        let service = SessionService::new(
            client.clone(),
            tokens.clone(),
            navigator.clone(),
            config.auth.clone(),
        );
        let session = Arc::new(SessionContext::new(Arc::new(service)));
        let guard = RouteGuard::new(&config.auth);

        info!(base_url = %client.base_url(), "FloodSense client ready");

        Ok(Self {
            locations: LocationService::new(client.clone()),
            alerts: AlertService::new(client.clone()),
            subscriptions: SubscriptionService::new(client.clone()),
            readings: ReadingService::new(client.clone()),
            dashboard: DashboardService::new(client.clone()),
            config,
            client,
            tokens,
            navigator,
            session,
            guard,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }
}

fn open_store(config: &AppConfig) -> Arc<dyn KeyValueStore> {
    match &config.storage.path {
        Some(path) => {
            debug!(path = %path.display(), "Using file session storage");
            Arc::new(FileStore::open(path))
        }
        None => {
            debug!("Using in-memory session storage");
            Arc::new(MemoryStore::new())
        }
    }
}
