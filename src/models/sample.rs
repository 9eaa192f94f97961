//! Hourly samples used for trends and insights

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Pollutant;

/// Hourly NO2/O3 concentrations in µg/m³
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualitySample {
    pub timestamp: DateTime<Utc>,
    pub no2: Option<f64>,
    pub o3: Option<f64>,
}

impl AirQualitySample {
    #[must_use]
    pub fn value(&self, pollutant: Pollutant) -> Option<f64> {
        match pollutant {
            Pollutant::No2 => self.no2,
            Pollutant::O3 => self.o3,
        }
    }
}

/// Hourly weather variables relevant to pollutant behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub timestamp: DateTime<Utc>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub solar_radiation: Option<f64>,
}
