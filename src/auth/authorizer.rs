use tracing::trace;

use crate::auth::storage::TokenStore;
use crate::http::{HttpRequest, RequestInterceptor};

/// Attaches the stored bearer token to every outgoing request.
///
/// The token is read at send time, so a stale token is still sent and the
/// server decides. Without a token the request goes out unchanged.
pub struct BearerAuthorizer {
    tokens: TokenStore,
}

impl BearerAuthorizer {
    pub fn new(tokens: TokenStore) -> Self {
        Self { tokens }
    }
}

impl RequestInterceptor for BearerAuthorizer {
    fn intercept(&self, request: &mut HttpRequest) {
        match self.tokens.get_token() {
            Some(token) => {
                request.set_header("Authorization", format!("Bearer {}", token));
                trace!(url = %request.url, "Attached bearer token");
            }
            None => trace!(url = %request.url, "No token stored, sending unauthenticated"),
        }
    }
}
