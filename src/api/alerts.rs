use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::api::models::{Alert, NewAlert};
use crate::api::{fetch_list, Listing};
use crate::error::Result;
use crate::http::{ApiClient, RequestOptions};

#[derive(Clone)]
pub struct AlertService {
    client: Arc<ApiClient>,
}

impl AlertService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Most recent alerts, newest first
    pub async fn recent(&self, limit: u32) -> Result<Listing<Alert>> {
        let options = RequestOptions::new().query("limit", limit);
        fetch_list(&self.client, "/alerts", options).await
    }

    pub async fn active(&self) -> Result<Listing<Alert>> {
        fetch_list(&self.client, "/alerts/active", RequestOptions::new()).await
    }

    /// Publish an alert. The server's reply is passed through as is.
    pub async fn broadcast(&self, alert: &NewAlert) -> Result<Value> {
        let response = self
            .client
            .post::<_, Value>("/alerts", alert, RequestOptions::new())
            .await?;
        info!(
            location_id = alert.location_id,
            risk_level = %alert.risk_level,
            "Alert broadcast"
        );
        Ok(response.data)
    }
}
