use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::lenient;
use crate::risk::{HasRiskLevel, RiskDistribution, RiskLevel};

pub type LocationId = i64;

/// A monitored location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    #[serde(default)]
    pub district: String,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub risk_score: Option<f64>,
    #[serde(default)]
    pub risk_timestamp: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HasRiskLevel for Location {
    fn raw_risk_level(&self) -> Option<&str> {
        self.risk_level.as_deref()
    }
}

/// Body for creating or updating a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInput {
    pub name: String,
    pub district: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A location together with its latest readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationDetails {
    pub location: Location,
    #[serde(rename = "currentWeather", default)]
    pub current_weather: Option<WeatherObservation>,
    #[serde(rename = "currentRisk", default)]
    pub current_risk: Option<RiskAssessment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub rainfall_mm: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub humidity: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub pressure: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub wind_speed: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A stored risk assessment, current or historical
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub risk_score: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub factors: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HasRiskLevel for RiskAssessment {
    fn raw_risk_level(&self) -> Option<&str> {
        self.risk_level.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalFlood {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub flood_date: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub water_level: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub rainfall_24h: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    #[serde(default)]
    pub location_id: Option<LocationId>,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub alert_type: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Alert {
    pub fn is_active(&self) -> bool {
        self.status.as_deref() == Some("active")
    }
}

impl HasRiskLevel for Alert {
    fn raw_risk_level(&self) -> Option<&str> {
        self.risk_level.as_deref()
    }
}

/// Body for broadcasting an alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAlert {
    pub location_id: LocationId,
    pub alert_type: String,
    pub recipient: String,
    pub risk_level: RiskLevel,
    pub message: String,
    pub status: String,
}

impl NewAlert {
    /// A public, active flood alert
    pub fn new(location_id: LocationId, risk_level: RiskLevel, message: impl Into<String>) -> Self {
        Self {
            location_id,
            alert_type: "FLOOD".to_string(),
            recipient: "PUBLIC".to_string(),
            risk_level,
            message: message.into(),
            status: "active".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRef {
    #[serde(default)]
    pub id: Option<LocationId>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    #[serde(rename = "userName", default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "phoneNumber", default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub location: Option<LocationRef>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Subscription {
    pub fn display_name(&self) -> &str {
        self.user_name.as_deref().unwrap_or("Anonymous")
    }

    pub fn location_name(&self) -> &str {
        self.location
            .as_ref()
            .and_then(|l| l.name.as_deref())
            .unwrap_or("Unknown")
    }
}

/// Body for a public alert subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSubscription {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub location_id: LocationId,
}

impl NewSubscription {
    pub fn new(email: impl Into<String>, location_id: LocationId) -> Self {
        Self {
            email: email.into(),
            phone: None,
            location_id,
        }
    }

    /// Blank numbers are left out of the request
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        let phone = phone.into();
        self.phone = (!phone.trim().is_empty()).then_some(phone);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ToggleRequest {
    pub is_active: bool,
}

/// A manual weather reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub location: LocationId,
    pub rainfall: f64,
    pub temperature: f64,
    pub humidity: f64,
    #[serde(rename = "windSpeed")]
    pub wind_speed: f64,
    pub timestamp: DateTime<Utc>,
}

impl WeatherReading {
    /// A reading stamped with the current time
    pub fn now(location: LocationId, rainfall: f64, temperature: f64, humidity: f64, wind_speed: f64) -> Self {
        Self {
            location,
            rainfall,
            temperature,
            humidity,
            wind_speed,
            timestamp: Utc::now(),
        }
    }
}

/// Body for recording a risk assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessmentInput {
    pub location_id: LocationId,
    pub risk_level: RiskLevel,
    pub risk_score: u32,
    pub factors: Vec<String>,
    pub rainfall_24h: f64,
    pub rainfall_72h: f64,
}

impl RiskAssessmentInput {
    /// An operator override: default score for the level and no rainfall figures
    pub fn manual<I, S>(location_id: LocationId, risk_level: RiskLevel, factors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            location_id,
            risk_level,
            risk_score: risk_level.default_score(),
            factors: factors.into_iter().map(Into::into).collect(),
            rainfall_24h: 0.0,
            rainfall_72h: 0.0,
        }
    }
}

/// Split a comma separated factor list, dropping blanks
pub fn parse_factors(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(rename = "totalLocations", default, deserialize_with = "lenient::count")]
    pub total_locations: u64,
    #[serde(rename = "riskDistribution", default)]
    pub risk_distribution: RiskDistribution,
    #[serde(rename = "lastUpdate", default)]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
