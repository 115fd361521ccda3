use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use tracing::trace;

use crate::error::{ClientError, Result};

/// HTTP method enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::DELETE => "DELETE",
        };
        write!(f, "{}", name)
    }
}

impl From<HttpMethod> for http::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::GET => http::Method::GET,
            HttpMethod::POST => http::Method::POST,
            HttpMethod::PUT => http::Method::PUT,
            HttpMethod::PATCH => http::Method::PATCH,
            HttpMethod::DELETE => http::Method::DELETE,
        }
    }
}

/// A fully built request, as it leaves the client
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Absolute URL including query string
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
    pub timeout: Duration,
}

impl HttpRequest {
    /// Look up a header, ignoring case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Set a header, replacing any existing value regardless of case
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|key, _| !key.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
    }
}

/// A very simple version that only holds response data
#[derive(Debug, Clone)]
pub struct SimpleHttpResponse {
    /// HTTP status code
    status_code: u16,
    /// Response body
    body: String,
    /// Response headers
    headers: HashMap<String, String>,
}

impl SimpleHttpResponse {
    /// Create a new response
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status_code: status,
            body: body.into(),
            headers: HashMap::new(),
        }
    }

    /// Add a header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Get the status code
    pub fn status(&self) -> u16 {
        self.status_code
    }

    /// Get a reference to the response body
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Get the body as text (consumes the response)
    pub fn text(self) -> String {
        self.body
    }

    /// Get a response header
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Check if successful (2xx status)
    pub fn is_success(&self) -> bool {
        self.status_code >= 200 && self.status_code < 300
    }
}

/// Trait for sending requests over the wire, allowing for mocking
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send the request and return whatever the server answered.
    ///
    /// Non-2xx responses are returned as `Ok`; only failures to obtain a
    /// response at all are errors.
    async fn execute(&self, request: HttpRequest) -> Result<SimpleHttpResponse>;
}

/// Implementation of HttpTransport using reqwest
pub struct ReqwestTransport {
    /// Internal reqwest client
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a new transport with a default reqwest client
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a new transport with custom configuration
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<SimpleHttpResponse> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
            timeout,
        } = request;

        let mut builder = self
            .client
            .request(method.into(), url.as_str())
            .timeout(timeout);

        // Add headers
        for (key, value) in headers {
            builder = builder.header(key, value);
        }

        if let Some(body) = body {
            builder = builder.body(body);
        }

        // Send request
        let response = builder
            .send()
            .await
            .map_err(|e| map_reqwest_error(&url, timeout, e))?;

        let status = response.status().as_u16();
        let mut collected = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                collected.insert(name.as_str().to_string(), value.to_string());
            }
        }

        let body = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(&url, timeout, e))?;
        trace!(%url, status, bytes = body.len(), "Response received");

        let mut result = SimpleHttpResponse::new(status, body);
        for (name, value) in collected {
            result = result.with_header(name, value);
        }
        Ok(result)
    }
}

fn map_reqwest_error(url: &str, timeout: Duration, error: reqwest::Error) -> ClientError {
    if error.is_timeout() {
        ClientError::Timeout {
            url: url.to_string(),
            timeout,
        }
    } else {
        ClientError::Transport {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

/// Mock implementation of HttpTransport for testing
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::{Arc, Mutex};

    enum MockReply {
        Response(SimpleHttpResponse),
        Failure(ClientError),
    }

    /// A mock transport that returns predefined responses
    #[derive(Clone, Default)]
    pub struct MockTransport {
        /// Map of (method, URL) to replies
        responses: Arc<Mutex<HashMap<(HttpMethod, String), Arc<MockReply>>>>,
        /// Record of requests made, as they left the client
        requests: Arc<Mutex<Vec<HttpRequest>>>,
        /// Artificial latency per URL
        delays: Arc<Mutex<HashMap<String, Duration>>>,
    }

    impl MockTransport {
        /// Create a new mock transport
        pub fn new() -> Self {
            Self::default()
        }

        /// Register a mock response for a method and URL
        pub fn mock_response(
            &self,
            method: HttpMethod,
            url: impl Into<String>,
            status: u16,
            body: impl Into<String>,
        ) {
            let response = SimpleHttpResponse::new(status, body);
            self.responses
                .lock()
                .unwrap()
                .insert((method, url.into()), Arc::new(MockReply::Response(response)));
        }

        /// Register a JSON response
        pub fn mock_json<T: serde::Serialize>(
            &self,
            method: HttpMethod,
            url: impl Into<String>,
            status: u16,
            data: &T,
        ) {
            let body = serde_json::to_string(data).unwrap();
            let response = SimpleHttpResponse::new(status, body)
                .with_header("content-type", "application/json");
            self.responses
                .lock()
                .unwrap()
                .insert((method, url.into()), Arc::new(MockReply::Response(response)));
        }

        /// Make a method and URL fail without a response
        pub fn mock_failure(&self, method: HttpMethod, url: impl Into<String>, error: ClientError) {
            self.responses
                .lock()
                .unwrap()
                .insert((method, url.into()), Arc::new(MockReply::Failure(error)));
        }

        /// Delay responses for a URL by the given duration
        pub fn set_delay(&self, url: impl Into<String>, delay: Duration) {
            self.delays.lock().unwrap().insert(url.into(), delay);
        }

        /// Get the list of recorded requests
        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }

        /// Count requests sent to a URL
        pub fn request_count(&self, url: &str) -> usize {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.url == url)
                .count()
        }
    }

    #[async_trait::async_trait]
    impl HttpTransport for MockTransport {
        async fn execute(&self, request: HttpRequest) -> Result<SimpleHttpResponse> {
            let key = (request.method, request.url.clone());
            self.requests.lock().unwrap().push(request);

            let delay = self.delays.lock().unwrap().get(&key.1).copied();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let reply = self.responses.lock().unwrap().get(&key).cloned();
            match reply.as_deref() {
                Some(MockReply::Response(response)) => Ok(response.clone()),
                Some(MockReply::Failure(error)) => Err(error.clone()),
                None => Err(ClientError::Transport {
                    url: key.1,
                    message: "no mock response configured".to_string(),
                }),
            }
        }
    }
}
