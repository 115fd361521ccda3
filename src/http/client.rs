use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn, Instrument};
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::error::{ClientError, Result};
use crate::http::transport::{HttpMethod, HttpRequest, HttpTransport, ReqwestTransport};

/// Hook that may modify every request right before it is sent
pub trait RequestInterceptor: Send + Sync {
    fn intercept(&self, request: &mut HttpRequest);
}

/// A decoded response
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: u16,
}

/// Per-call options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Query string parameters, appended in order
    pub query: Vec<(String, String)>,
    /// Extra headers, applied over the client defaults
    pub headers: HashMap<String, String>,
    /// Abort the request when this token is cancelled
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Tie the request to a cancellation token
    pub fn cancel_with(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// The single configured request sender shared by every service
pub struct ApiClient {
    base_url: String,
    timeout: Duration,
    default_headers: HashMap<String, String>,
    transport: Arc<dyn HttpTransport>,
    interceptors: RwLock<Vec<Arc<dyn RequestInterceptor>>>,
}

impl ApiClient {
    /// Create a client backed by reqwest
    pub fn new(config: &ApiConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    /// Create a client with a custom transport
    pub fn with_transport(config: &ApiConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let mut default_headers = HashMap::new();
        default_headers.insert("Content-Type".to_string(), "application/json".to_string());
        default_headers.insert("Accept".to_string(), "application/json".to_string());

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout(),
            default_headers,
            transport,
            interceptors: RwLock::new(Vec::new()),
        }
    }

    /// Base URL requests are resolved against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Register a request interceptor; interceptors run in registration order
    pub fn add_interceptor(&self, interceptor: Arc<dyn RequestInterceptor>) {
        match self.interceptors.write() {
            Ok(mut interceptors) => interceptors.push(interceptor),
            Err(poisoned) => poisoned.into_inner().push(interceptor),
        }
    }

    /// Resolve a path against the base URL
    pub fn url_for(&self, path: &str, query: &[(String, String)]) -> Result<String> {
        let joined = if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        };

        let url = if query.is_empty() {
            reqwest::Url::parse(&joined)
        } else {
            reqwest::Url::parse_with_params(&joined, query)
        }
        .map_err(|e| ClientError::InvalidRequest(format!("{joined}: {e}")))?;

        Ok(url.to_string())
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>> {
        self.request(HttpMethod::GET, path, None, options).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>> {
        let body = encode_body(body)?;
        self.request(HttpMethod::POST, path, Some(body), options).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>> {
        let body = encode_body(body)?;
        self.request(HttpMethod::PUT, path, Some(body), options).await
    }

    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>> {
        let body = encode_body(body)?;
        self.request(HttpMethod::PATCH, path, Some(body), options).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>> {
        self.request(HttpMethod::DELETE, path, None, options).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>> {
        let request_id = Uuid::new_v4();
        let span = tracing::debug_span!("api_request", %request_id, %method, path);

        async move {
            let result = self.send(method, path, body, options).await;
            if let Err(e) = &result {
                log_failure(e);
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>> {
        let RequestOptions {
            query,
            headers,
            cancel,
        } = options;

        let mut request = HttpRequest {
            method,
            url: self.url_for(path, &query)?,
            headers: self.default_headers.clone(),
            body,
            timeout: self.timeout,
        };
        for (key, value) in headers {
            request.set_header(key, value);
        }

        self.apply_interceptors(&mut request);

        let url = request.url.clone();
        debug!(%url, "Sending request");

        let response = match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        return Err(ClientError::Cancelled { url });
                    }
                    response = self.transport.execute(request) => response?,
                }
            }
            None => self.transport.execute(request).await?,
        };

        let status = response.status();
        if !response.is_success() {
            return Err(ClientError::Http {
                url,
                status,
                body: response.text(),
            });
        }

        let text = response.text();
        let raw = if text.trim().is_empty() { "null" } else { text.as_str() };
        let data = serde_json::from_str::<T>(raw).map_err(|e| ClientError::Decode {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        debug!(%url, status, "Request completed");
        Ok(ApiResponse { data, status })
    }

    fn apply_interceptors(&self, request: &mut HttpRequest) {
        let interceptors = match self.interceptors.read() {
            Ok(interceptors) => interceptors.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        for interceptor in interceptors {
            interceptor.intercept(request);
        }
    }
}

fn encode_body<B: Serialize + ?Sized>(body: &B) -> Result<String> {
    serde_json::to_string(body)
        .map_err(|e| ClientError::InvalidRequest(format!("failed to encode request body: {e}")))
}

/// Log a failed request before it is handed back to the caller
fn log_failure(error: &ClientError) {
    match error {
        ClientError::Http { url, status, body } => {
            error!(kind = %error.category(), %url, status, body = %body, "API error response");
        }
        ClientError::Cancelled { url } => {
            debug!(%url, "API request cancelled");
        }
        other => {
            warn!(kind = %other.category(), error = %other, "API request failed");
        }
    }
}
