use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::api::models::{
    HistoricalFlood, Location, LocationDetails, LocationId, LocationInput, RiskAssessment,
    WeatherObservation,
};
use crate::api::{encode_segment, fetch_list, fetch_one, Envelope, Listing};
use crate::error::Result;
use crate::http::{ApiClient, RequestOptions};
use crate::risk::RiskLevel;

/// Monitored locations and their history
#[derive(Clone)]
pub struct LocationService {
    client: Arc<ApiClient>,
}

impl LocationService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Listing<Location>> {
        self.list_with(RequestOptions::new()).await
    }

    /// `list` with caller-supplied options, e.g. a cancellation token
    pub async fn list_with(&self, options: RequestOptions) -> Result<Listing<Location>> {
        fetch_list(&self.client, "/locations", options).await
    }

    pub async fn get(&self, id: LocationId) -> Result<LocationDetails> {
        fetch_one(&self.client, &format!("/locations/{id}"), RequestOptions::new()).await
    }

    pub async fn by_district(&self, district: &str) -> Result<Listing<Location>> {
        let path = format!("/locations/district/{}", encode_segment(district));
        fetch_list(&self.client, &path, RequestOptions::new()).await
    }

    pub async fn by_risk(&self, level: RiskLevel) -> Result<Listing<Location>> {
        fetch_list(&self.client, &format!("/locations/risk/{level}"), RequestOptions::new()).await
    }

    pub async fn districts(&self) -> Result<Vec<String>> {
        let listing: Listing<String> =
            fetch_list(&self.client, "/locations/districts", RequestOptions::new()).await?;
        Ok(listing.items)
    }

    pub async fn create(&self, input: &LocationInput) -> Result<Location> {
        let response = self
            .client
            .post::<_, Envelope<Location>>("/locations", input, RequestOptions::new())
            .await?;
        let location = response.data.data;
        info!(id = location.id, name = %location.name, "Location created");
        Ok(location)
    }

    pub async fn update(&self, id: LocationId, input: &LocationInput) -> Result<Location> {
        let response = self
            .client
            .put::<_, Envelope<Location>>(&format!("/locations/{id}"), input, RequestOptions::new())
            .await?;
        info!(id, "Location updated");
        Ok(response.data.data)
    }

    /// Fails with the server's message when the location is still referenced
    pub async fn delete(&self, id: LocationId) -> Result<()> {
        self.client
            .delete::<Value>(&format!("/locations/{id}"), RequestOptions::new())
            .await?;
        info!(id, "Location deleted");
        Ok(())
    }

    pub async fn risk_history(&self, id: LocationId, limit: u32) -> Result<Listing<RiskAssessment>> {
        let options = RequestOptions::new().query("limit", limit);
        fetch_list(&self.client, &format!("/locations/{id}/risk-history"), options).await
    }

    pub async fn historical_floods(&self, id: LocationId) -> Result<Listing<HistoricalFlood>> {
        fetch_list(
            &self.client,
            &format!("/locations/{id}/historical-floods"),
            RequestOptions::new(),
        )
        .await
    }

    pub async fn weather_history(&self, id: LocationId) -> Result<Listing<WeatherObservation>> {
        fetch_list(
            &self.client,
            &format!("/locations/{id}/weather-history"),
            RequestOptions::new(),
        )
        .await
    }
}
