use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::api::models::{RiskAssessmentInput, WeatherReading};
use crate::error::Result;
use crate::http::{ApiClient, RequestOptions};

/// Manual weather and risk submissions from operators
#[derive(Clone)]
pub struct ReadingService {
    client: Arc<ApiClient>,
}

impl ReadingService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn submit_weather(&self, reading: &WeatherReading) -> Result<Value> {
        let response = self
            .client
            .post::<_, Value>("/weather", reading, RequestOptions::new())
            .await?;
        info!(location = reading.location, rainfall = reading.rainfall, "Weather reading submitted");
        Ok(response.data)
    }

    pub async fn submit_risk(&self, assessment: &RiskAssessmentInput) -> Result<Value> {
        let response = self
            .client
            .post::<_, Value>("/risk", assessment, RequestOptions::new())
            .await?;
        info!(
            location_id = assessment.location_id,
            risk_level = %assessment.risk_level,
            risk_score = assessment.risk_score,
            "Risk assessment submitted"
        );
        Ok(response.data)
    }
}
