use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::api::models::{NewSubscription, Subscription, ToggleRequest};
use crate::api::{fetch_list, Listing};
use crate::error::Result;
use crate::http::{ApiClient, RequestOptions};

/// Public alert subscriptions
#[derive(Clone)]
pub struct SubscriptionService {
    client: Arc<ApiClient>,
}

impl SubscriptionService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Listing<Subscription>> {
        fetch_list(&self.client, "/subscriptions", RequestOptions::new()).await
    }

    pub async fn subscribe(&self, subscription: &NewSubscription) -> Result<Value> {
        let response = self
            .client
            .post::<_, Value>("/subscriptions", subscription, RequestOptions::new())
            .await?;
        info!(location_id = subscription.location_id, "Subscription created");
        Ok(response.data)
    }

    pub async fn unsubscribe(&self, id: i64) -> Result<()> {
        self.client
            .delete::<Value>(&format!("/subscriptions/{id}"), RequestOptions::new())
            .await?;
        info!(id, "Subscription removed");
        Ok(())
    }

    pub async fn toggle(&self, id: i64, is_active: bool) -> Result<()> {
        self.client
            .patch::<_, Value>(
                &format!("/subscriptions/{id}/toggle"),
                &ToggleRequest { is_active },
                RequestOptions::new(),
            )
            .await?;
        info!(id, is_active, "Subscription toggled");
        Ok(())
    }
}
