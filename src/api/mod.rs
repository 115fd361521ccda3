//! Typed clients for the FloodSense REST resources.
//!
//! Every service shares the one [`ApiClient`](crate::http::ApiClient), so the
//! bearer header and error handling are the same everywhere.

pub mod alerts;
pub mod dashboard;
pub mod locations;
pub mod models;
pub mod readings;
pub mod subscriptions;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::http::{ApiClient, RequestOptions};

pub use alerts::AlertService;
pub use dashboard::{DashboardOverview, DashboardService};
pub use locations::LocationService;
pub use models::*;
pub use readings::ReadingService;
pub use subscriptions::SubscriptionService;

/// The `{ "data": ..., "count": n }` wrapper around resource payloads.
///
/// A payload without it, or with a null `data`, is a decode error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_count"
    )]
    pub count: Option<u64>,
}

/// A list result together with the total the server reported
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing<T> {
    pub items: Vec<T>,
    /// Server-side total, or the item count when none was sent
    pub count: u64,
}

impl<T> Listing<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> From<Envelope<Vec<T>>> for Listing<T> {
    fn from(envelope: Envelope<Vec<T>>) -> Self {
        let count = envelope.count.unwrap_or(envelope.data.len() as u64);
        Listing {
            items: envelope.data,
            count,
        }
    }
}

/// GET a list resource
pub(crate) async fn fetch_list<T: DeserializeOwned>(
    client: &ApiClient,
    path: &str,
    options: RequestOptions,
) -> Result<Listing<T>> {
    let response = client.get::<Envelope<Vec<T>>>(path, options).await?;
    Ok(response.data.into())
}

/// GET a single resource out of its envelope
pub(crate) async fn fetch_one<T: DeserializeOwned>(
    client: &ApiClient,
    path: &str,
    options: RequestOptions,
) -> Result<T> {
    let response = client.get::<Envelope<T>>(path, options).await?;
    Ok(response.data.data)
}

/// Percent-encode one path segment
pub(crate) fn encode_segment(raw: &str) -> String {
    let mut encoded = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

/// Decoders for fields the backend sends as numbers or numeric strings
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Numeric {
        Float(f64),
        Text(String),
    }

    impl Numeric {
        fn as_f64(&self) -> Option<f64> {
            match self {
                Numeric::Float(v) => Some(*v),
                Numeric::Text(s) => s.trim().parse().ok(),
            }
        }
    }

    /// Unparsable strings read as missing
    pub fn opt_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        let value = Option::<Numeric>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(Numeric::as_f64))
    }

    pub fn opt_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        let value = opt_f64(deserializer)?;
        Ok(value.filter(|v| *v >= 0.0).map(|v| v as u64))
    }

    /// Missing, null or unparsable counts read as zero
    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        Ok(opt_count(deserializer)?.unwrap_or(0))
    }
}
