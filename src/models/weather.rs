//! Weather snapshot model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DataSource;

/// Current weather conditions for the city
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherSnapshot {
    pub timestamp: DateTime<Utc>,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Wind speed in km/h
    pub wind_speed: f64,
    /// Wind direction in degrees (0-360, where 0/360 is North)
    pub wind_direction: f64,
    /// Shortwave solar radiation in W/m²
    pub solar_radiation: f64,
    /// Surface pressure in hPa
    pub pressure: f64,
    /// Cloud cover percentage (0-100)
    pub cloud_cover: f64,
    pub source: DataSource,
}

impl WeatherSnapshot {
    /// Clamp fields to their physical ranges
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.humidity = self.humidity.clamp(0.0, 100.0);
        self.cloud_cover = self.cloud_cover.clamp(0.0, 100.0);
        self.wind_speed = self.wind_speed.max(0.0);
        self.solar_radiation = self.solar_radiation.max(0.0);
        self.wind_direction = self.wind_direction.rem_euclid(360.0);
        self
    }
}
