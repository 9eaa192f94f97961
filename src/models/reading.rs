//! Pollutant readings, forecasts and current conditions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AqiCategory, Pollutant};

/// Where a piece of data came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Model,
    Live,
    Mock,
}

/// A single concentration value at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutantReading {
    pub timestamp: DateTime<Utc>,
    pub pollutant: Pollutant,
    /// Concentration in µg/m³, never negative
    pub value: f64,
    /// Confidence in 0..=1 for forecast points
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Forecast point as served to the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub confidence: f64,
}

impl From<&PollutantReading> for ForecastPoint {
    fn from(reading: &PollutantReading) -> Self {
        Self {
            timestamp: reading.timestamp,
            value: reading.value,
            confidence: reading.confidence.unwrap_or(1.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub pollutant: Pollutant,
    pub unit: String,
    pub forecast_hours: u32,
    pub source: DataSource,
    /// Model site, present only for model-served forecasts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    pub data: Vec<ForecastPoint>,
}

/// Direction of change between the last sampled point and now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    Steady,
}

/// Relative change below which a value counts as steady
pub const STEADY_TOLERANCE: f64 = 0.05;

impl Trend {
    #[must_use]
    pub fn classify(previous: f64, current: f64) -> Self {
        let delta = current - previous;
        let tolerance = previous.abs() * STEADY_TOLERANCE;
        if delta.abs() <= tolerance {
            Trend::Steady
        } else if delta > 0.0 {
            Trend::Rising
        } else {
            Trend::Falling
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAirQuality {
    pub timestamp: DateTime<Utc>,
    pub location: String,
    pub no2: f64,
    pub o3: f64,
    pub aqi_value: u16,
    pub aqi_category: AqiCategory,
    pub trend_no2: Trend,
    pub trend_o3: Trend,
    pub source: DataSource,
}

/// Round to two decimals, the precision served by the API
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
