use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{WeatherProvider, truncate_body};
use crate::models::{AirQualitySample, DataSource, WeatherSample, WeatherSnapshot};

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,wind_speed_10m,wind_direction_10m,surface_pressure,cloud_cover";
const HOURLY_WEATHER_FIELDS: &str =
    "temperature_2m,relative_humidity_2m,wind_speed_10m,shortwave_radiation";
const HOURLY_AIR_QUALITY_FIELDS: &str = "nitrogen_dioxide,ozone";

/// Client for the Open-Meteo weather and air-quality APIs (no key required)
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    http: Client,
    forecast_url: String,
    air_quality_url: String,
    latitude: f64,
    longitude: f64,
}

impl OpenMeteoClient {
    pub fn new(
        http: Client,
        forecast_url: &str,
        air_quality_url: &str,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            http,
            forecast_url: forecast_url.trim_end_matches('/').to_string(),
            air_quality_url: air_quality_url.trim_end_matches('/').to_string(),
            latitude,
            longitude,
        }
    }

    #[instrument(skip(self))]
    pub async fn current_weather(&self) -> Result<WeatherSnapshot> {
        let url = format!("{}/forecast", self.forecast_url);
        let body = self
            .get(
                &url,
                &[
                    ("current", CURRENT_FIELDS.to_string()),
                    ("hourly", "shortwave_radiation".to_string()),
                    ("forecast_days", "1".to_string()),
                ],
            )
            .await?;
        parse_current(&body)
    }

    #[instrument(skip(self))]
    pub async fn weather_samples(
        &self,
        past_hours: u32,
        forecast_hours: u32,
    ) -> Result<Vec<WeatherSample>> {
        let url = format!("{}/forecast", self.forecast_url);
        let body = self
            .get(
                &url,
                &[
                    ("hourly", HOURLY_WEATHER_FIELDS.to_string()),
                    ("past_hours", past_hours.to_string()),
                    ("forecast_hours", forecast_hours.to_string()),
                ],
            )
            .await?;
        parse_weather_hourly(&body)
    }

    #[instrument(skip(self))]
    pub async fn air_quality_samples(
        &self,
        past_hours: u32,
        forecast_hours: u32,
    ) -> Result<Vec<AirQualitySample>> {
        let url = format!("{}/air-quality", self.air_quality_url);
        let body = self
            .get(
                &url,
                &[
                    ("hourly", HOURLY_AIR_QUALITY_FIELDS.to_string()),
                    ("past_hours", past_hours.to_string()),
                    ("forecast_hours", forecast_hours.to_string()),
                ],
            )
            .await?;
        parse_air_quality_hourly(&body)
    }

    async fn get(&self, url: &str, extra: &[(&str, String)]) -> Result<String> {
        debug!("Open-Meteo request: {url}");
        let res = self
            .http
            .get(url)
            .query(&[
                ("latitude", self.latitude.to_string()),
                ("longitude", self.longitude.to_string()),
                ("timezone", "GMT".to_string()),
            ])
            .query(extra)
            .send()
            .await
            .context("Failed to send request to Open-Meteo")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read Open-Meteo response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Open-Meteo request failed with status {}: {}",
                status,
                truncate_body(&body)
            ));
        }
        Ok(body)
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    async fn current(&self) -> Result<WeatherSnapshot> {
        self.current_weather().await
    }

    async fn hourly(&self, past_hours: u32, forecast_hours: u32) -> Result<Vec<WeatherSample>> {
        self.weather_samples(past_hours, forecast_hours).await
    }
}

#[derive(Debug, Deserialize)]
struct ForecastBody {
    current: Option<CurrentData>,
    hourly: Option<HourlyWeather>,
}

#[derive(Debug, Deserialize)]
struct CurrentData {
    time: String,
    #[serde(rename = "temperature_2m")]
    temperature: f64,
    #[serde(rename = "relative_humidity_2m")]
    humidity: f64,
    #[serde(rename = "wind_speed_10m")]
    wind_speed: f64,
    #[serde(rename = "wind_direction_10m")]
    wind_direction: f64,
    #[serde(rename = "surface_pressure")]
    pressure: f64,
    cloud_cover: f64,
}

#[derive(Debug, Deserialize)]
struct HourlyWeather {
    time: Vec<String>,
    #[serde(rename = "temperature_2m", default)]
    temperature: Vec<Option<f64>>,
    #[serde(rename = "relative_humidity_2m", default)]
    humidity: Vec<Option<f64>>,
    #[serde(rename = "wind_speed_10m", default)]
    wind_speed: Vec<Option<f64>>,
    #[serde(default)]
    shortwave_radiation: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AirQualityBody {
    hourly: HourlyAirQuality,
}

#[derive(Debug, Deserialize)]
struct HourlyAirQuality {
    time: Vec<String>,
    #[serde(default)]
    nitrogen_dioxide: Vec<Option<f64>>,
    #[serde(default)]
    ozone: Vec<Option<f64>>,
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .map(|dt| dt.and_utc())
        .with_context(|| format!("Invalid Open-Meteo timestamp '{raw}'"))
}

fn at(values: &[Option<f64>], index: usize) -> Option<f64> {
    values.get(index).copied().flatten()
}

fn parse_current(body: &str) -> Result<WeatherSnapshot> {
    let response: ForecastBody =
        serde_json::from_str(body).context("Failed to parse Open-Meteo forecast response")?;
    let current = response
        .current
        .ok_or_else(|| anyhow!("Open-Meteo response has no current block"))?;
    let timestamp = parse_time(&current.time)?;

    // Radiation is only published hourly; use the hour containing `current.time`
    let solar_radiation = response
        .hourly
        .as_ref()
        .and_then(|hourly| {
            let hour_prefix = current.time.get(..13)?;
            let index = hourly
                .time
                .iter()
                .rposition(|t| t.get(..13) <= Some(hour_prefix))?;
            at(&hourly.shortwave_radiation, index)
        })
        .unwrap_or(0.0);

    Ok(WeatherSnapshot {
        timestamp,
        temperature: current.temperature,
        humidity: current.humidity,
        wind_speed: current.wind_speed,
        wind_direction: current.wind_direction,
        solar_radiation,
        pressure: current.pressure,
        cloud_cover: current.cloud_cover,
        source: DataSource::Live,
    }
    .sanitized())
}

fn parse_weather_hourly(body: &str) -> Result<Vec<WeatherSample>> {
    let response: ForecastBody =
        serde_json::from_str(body).context("Failed to parse Open-Meteo hourly response")?;
    let hourly = response
        .hourly
        .ok_or_else(|| anyhow!("Open-Meteo response has no hourly block"))?;

    hourly
        .time
        .iter()
        .enumerate()
        .map(|(i, time)| {
            Ok(WeatherSample {
                timestamp: parse_time(time)?,
                temperature: at(&hourly.temperature, i),
                humidity: at(&hourly.humidity, i),
                wind_speed: at(&hourly.wind_speed, i),
                solar_radiation: at(&hourly.shortwave_radiation, i),
            })
        })
        .collect()
}

fn parse_air_quality_hourly(body: &str) -> Result<Vec<AirQualitySample>> {
    let response: AirQualityBody =
        serde_json::from_str(body).context("Failed to parse Open-Meteo air-quality response")?;
    let hourly = response.hourly;

    hourly
        .time
        .iter()
        .enumerate()
        .map(|(i, time)| {
            Ok(AirQualitySample {
                timestamp: parse_time(time)?,
                no2: at(&hourly.nitrogen_dioxide, i),
                o3: at(&hourly.ozone, i),
            })
        })
        .collect()
}
