//! Third-party data sources
//!
//! Handlers only see the traits below. Every call may fail; callers decide
//! whether a failure becomes mock data or an "unavailable" response.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;

use crate::models::{AQI_MAX, AirQualitySample, Pollutant, Station, WeatherSample, WeatherSnapshot};

pub mod open_meteo;
pub mod openaq;
pub mod waqi;

pub use open_meteo::OpenMeteoClient;
pub use openaq::OpenAqClient;
pub use waqi::WaqiClient;

/// Current reading from an air-quality feed, concentrations in µg/m³
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeedReading {
    pub no2: Option<f64>,
    pub o3: Option<f64>,
    /// Overall AQI reported by the feed
    pub aqi: Option<u16>,
}

impl FeedReading {
    /// Feed AQI when it lies on the 0-500 scale. WAQI reports 999 when a
    /// station has no valid index.
    #[must_use]
    pub fn aqi_on_scale(&self) -> Option<u16> {
        self.aqi.filter(|aqi| *aqi <= AQI_MAX)
    }
}

/// One raw historical measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

#[async_trait]
pub trait AirQualityProvider: Send + Sync {
    /// City-wide current reading
    async fn city_reading(&self) -> Result<FeedReading>;

    /// Current reading at one station
    async fn station_reading(&self, station: &Station) -> Result<FeedReading>;

    /// Hourly concentrations from `past_hours` ago to `forecast_hours` ahead
    async fn hourly_samples(
        &self,
        past_hours: u32,
        forecast_hours: u32,
    ) -> Result<Vec<AirQualitySample>>;
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self) -> Result<WeatherSnapshot>;

    async fn hourly(&self, past_hours: u32, forecast_hours: u32) -> Result<Vec<WeatherSample>>;
}

#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// All measurements of `pollutant` in the city between two dates, inclusive
    async fn measurements(
        &self,
        pollutant: Pollutant,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Measurement>>;
}

/// Combined air-quality source: WAQI for current readings, Open-Meteo for
/// hourly series
pub struct CityAirQuality {
    waqi: WaqiClient,
    open_meteo: OpenMeteoClient,
}

impl CityAirQuality {
    #[must_use]
    pub fn new(waqi: WaqiClient, open_meteo: OpenMeteoClient) -> Self {
        Self { waqi, open_meteo }
    }
}

#[async_trait]
impl AirQualityProvider for CityAirQuality {
    async fn city_reading(&self) -> Result<FeedReading> {
        self.waqi.city_reading().await
    }

    async fn station_reading(&self, station: &Station) -> Result<FeedReading> {
        self.waqi.station_reading(station).await
    }

    async fn hourly_samples(
        &self,
        past_hours: u32,
        forecast_hours: u32,
    ) -> Result<Vec<AirQualitySample>> {
        self.open_meteo
            .air_quality_samples(past_hours, forecast_hours)
            .await
    }
}

/// Shared HTTP client for upstream calls
pub fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("AirWatch/", env!("CARGO_PKG_VERSION")))
        .build()
        .with_context(|| "Failed to create HTTP client")
}

/// Shorten an error body for logs
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        let truncated: String = body.chars().take(MAX).collect();
        format!("{truncated}...")
    } else {
        body.to_string()
    }
}
