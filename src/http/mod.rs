pub mod client;
pub mod transport;

pub use client::{ApiClient, ApiResponse, RequestInterceptor, RequestOptions};
pub use transport::{HttpMethod, HttpRequest, HttpTransport, ReqwestTransport, SimpleHttpResponse};
