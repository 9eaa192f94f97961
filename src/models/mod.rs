//! Data models for the AirWatch service
//!
//! This module contains the core domain models organized by concern:
//! - Pollutant: pollutant kinds and concentration ranges
//! - AQI: the severity band table shared by every endpoint
//! - Readings: forecasts and current conditions
//! - Hotspots, weather, alerts and history

pub mod alert;
pub mod aqi;
pub mod history;
pub mod hotspot;
pub mod pollutant;
pub mod reading;
pub mod sample;
pub mod weather;

// Re-export all public types for convenient access
pub use alert::{Alert, AlertSeverity};
pub use aqi::{AQI_BANDS, AQI_MAX, AqiBand, AqiCategory, aqi_from_concentrations};
pub use history::{
    DailyDataPoint, HistoricalDataPoint, HistoricalSeries, SeasonalPattern, WeeklyDataPoint,
};
pub use hotspot::{HotspotsResponse, Station, StationHotspot};
pub use pollutant::{Pollutant, UNIT};
pub use reading::{
    CurrentAirQuality, DataSource, ForecastPoint, ForecastResponse, PollutantReading, Trend,
    round2,
};
pub use sample::{AirQualitySample, WeatherSample};
pub use weather::WeatherSnapshot;
