use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::api::models::{Alert, DashboardSummary, Location, LocationId, WeatherObservation};
use crate::api::{fetch_list, fetch_one, Listing};
use crate::error::Result;
use crate::http::{ApiClient, RequestOptions};
use crate::risk::{highest_risk, RiskDistribution, RiskLevel};

/// Alerts shown on the dashboard overview
const OVERVIEW_ALERT_LIMIT: u32 = 10;

/// Everything the admin dashboard shows at once
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardOverview {
    pub summary: DashboardSummary,
    pub locations: Listing<Location>,
    pub alerts: Listing<Alert>,
}

impl DashboardOverview {
    /// Most severe level across the monitored locations
    pub fn highest_risk(&self) -> Option<RiskLevel> {
        highest_risk(&self.locations.items)
    }

    /// Latest risk timestamp across the monitored locations
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.locations
            .items
            .iter()
            .filter_map(|l| l.risk_timestamp)
            .max()
            .or(self.summary.last_update)
    }
}

#[derive(Clone)]
pub struct DashboardService {
    client: Arc<ApiClient>,
}

impl DashboardService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn summary(&self) -> Result<DashboardSummary> {
        fetch_one(&self.client, "/dashboard/summary", RequestOptions::new()).await
    }

    pub async fn risk_distribution(&self) -> Result<RiskDistribution> {
        fetch_one(&self.client, "/dashboard/risk-distribution", RequestOptions::new()).await
    }

    pub async fn alerts(&self, limit: u32) -> Result<Listing<Alert>> {
        let options = RequestOptions::new().query("limit", limit);
        fetch_list(&self.client, "/dashboard/alerts", options).await
    }

    pub async fn weather_trends(&self, id: LocationId, hours: u32) -> Result<Listing<WeatherObservation>> {
        let options = RequestOptions::new().query("hours", hours);
        fetch_list(&self.client, &format!("/dashboard/weather-trends/{id}"), options).await
    }

    /// Summary, locations and recent alerts, fetched concurrently.
    ///
    /// The first failure fails the whole overview.
    pub async fn overview(&self) -> Result<DashboardOverview> {
        let (summary, locations, alerts) = tokio::try_join!(
            self.summary(),
            fetch_list::<Location>(&self.client, "/locations", RequestOptions::new()),
            self.alerts(OVERVIEW_ALERT_LIMIT),
        )?;
        debug!(
            locations = locations.count,
            alerts = alerts.count,
            "Dashboard overview loaded"
        );
        Ok(DashboardOverview {
            summary,
            locations,
            alerts,
        })
    }
}
