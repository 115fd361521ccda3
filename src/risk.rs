//! Flood risk levels and the display helpers built on them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::api::lenient;

/// Severity of flood risk at a location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    /// Ascending order of severity
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Moderate,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Moderate => "MODERATE",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }

    /// Hex color used for badges and map markers
    pub fn color(&self) -> &'static str {
        match self {
            RiskLevel::Low => "#22C55E",
            RiskLevel::Moderate => "#EAB308",
            RiskLevel::High => "#F97316",
            RiskLevel::Critical => "#DC2626",
        }
    }

    /// Advice shown to the public
    pub fn action(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Normal conditions - maintain general awareness",
            RiskLevel::Moderate => "Stay alert - monitor updates and review evacuation plan",
            RiskLevel::High => "Prepare to evacuate - secure property and gather emergency supplies",
            RiskLevel::Critical => "Evacuate immediately to higher ground",
        }
    }

    /// Sort key, most severe first
    pub fn severity_rank(&self) -> u8 {
        match self {
            RiskLevel::Critical => 0,
            RiskLevel::High => 1,
            RiskLevel::Moderate => 2,
            RiskLevel::Low => 3,
        }
    }

    /// Score recorded for a manual assessment, on the 0-15 scale
    pub fn default_score(&self) -> u32 {
        match self {
            RiskLevel::Low => 1,
            RiskLevel::Moderate => 4,
            RiskLevel::High => 7,
            RiskLevel::Critical => 12,
        }
    }

    /// Parse any casing, treating unknown values as `Low`
    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or(RiskLevel::Low)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRiskLevel(pub String);

impl fmt::Display for UnknownRiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown risk level '{}'", self.0)
    }
}

impl std::error::Error for UnknownRiskLevel {}

impl FromStr for RiskLevel {
    type Err = UnknownRiskLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        RiskLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownRiskLevel(s.to_string()))
    }
}

/// Anything carrying a possibly missing, possibly unrecognized risk level
pub trait HasRiskLevel {
    fn raw_risk_level(&self) -> Option<&str>;

    fn risk_level(&self) -> Option<RiskLevel> {
        self.raw_risk_level().and_then(|raw| raw.parse().ok())
    }
}

/// Most severe first. Stable, and unknown or missing levels go last.
pub fn sort_by_risk_level<T: HasRiskLevel + Clone>(items: &[T]) -> Vec<T> {
    let mut sorted = items.to_vec();
    sorted.sort_by_key(|item| item.risk_level().map_or(u8::MAX, |level| level.severity_rank()));
    sorted
}

/// `None` keeps everything
pub fn filter_by_risk<T: HasRiskLevel + Clone>(items: &[T], level: Option<RiskLevel>) -> Vec<T> {
    match level {
        None => items.to_vec(),
        Some(level) => items
            .iter()
            .filter(|item| item.risk_level() == Some(level))
            .cloned()
            .collect(),
    }
}

/// Highest level present, if any item has a recognizable one
pub fn highest_risk<T: HasRiskLevel>(items: &[T]) -> Option<RiskLevel> {
    items
        .iter()
        .filter_map(HasRiskLevel::risk_level)
        .min_by_key(RiskLevel::severity_rank)
}

/// Change from `previous` to `current` in percent; 0 when there is no baseline
pub fn percentage_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

fn format_unit(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v:.1} {unit}"),
        None => "N/A".to_string(),
    }
}

pub fn format_rainfall(value: Option<f64>) -> String {
    format_unit(value, "mm")
}

pub fn format_temperature(value: Option<f64>) -> String {
    format_unit(value, "°C")
}

pub fn format_percentage(value: Option<f64>) -> String {
    format_unit(value, "%")
}

pub fn format_wind_speed(value: Option<f64>) -> String {
    format_unit(value, "m/s")
}

/// Cut to `max` characters and mark the cut with an ellipsis
pub fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max).collect();
    cut.push_str("...");
    cut
}

pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Location counts per risk level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskDistribution {
    #[serde(rename = "LOW", default, deserialize_with = "lenient::count")]
    pub low: u64,
    #[serde(rename = "MODERATE", default, deserialize_with = "lenient::count")]
    pub moderate: u64,
    #[serde(rename = "HIGH", default, deserialize_with = "lenient::count")]
    pub high: u64,
    #[serde(rename = "CRITICAL", default, deserialize_with = "lenient::count")]
    pub critical: u64,
}

/// One slice of the risk pie chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSlice {
    pub level: RiskLevel,
    pub label: &'static str,
    pub value: u64,
    pub color: &'static str,
}

impl RiskDistribution {
    pub fn count(&self, level: RiskLevel) -> u64 {
        match level {
            RiskLevel::Low => self.low,
            RiskLevel::Moderate => self.moderate,
            RiskLevel::High => self.high,
            RiskLevel::Critical => self.critical,
        }
    }

    pub fn total(&self) -> u64 {
        self.low + self.moderate + self.high + self.critical
    }

    /// Non-empty levels, LOW through CRITICAL
    pub fn chart_slices(&self) -> Vec<ChartSlice> {
        RiskLevel::ALL
            .into_iter()
            .map(|level| ChartSlice {
                level,
                label: level.label(),
                value: self.count(level),
                color: level.color(),
            })
            .filter(|slice| slice.value > 0)
            .collect()
    }
}
