use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::{HistoryProvider, Measurement, truncate_body};
use crate::models::Pollutant;

/// Sensors queried per pollutant
const MAX_SENSORS: usize = 5;
const LOCATION_LIMIT: u32 = 100;
const MEASUREMENT_LIMIT: u32 = 10_000;

/// Client for OpenAQ v3 historical measurements
#[derive(Debug, Clone)]
pub struct OpenAqClient {
    http: Client,
    base_url: String,
    api_key: String,
    city: String,
    country: String,
}

impl OpenAqClient {
    pub fn new(
        http: Client,
        base_url: &str,
        api_key: Option<String>,
        city: &str,
        country: &str,
    ) -> Self {
        // "Delhi, India" -> "Delhi"
        let city = city.split(',').next().unwrap_or(city).trim().to_string();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.unwrap_or_default(),
            city,
            country: country.to_string(),
        }
    }

    #[instrument(skip(self))]
    async fn sensor_ids(&self, pollutant: Pollutant) -> Result<Vec<u64>> {
        let url = format!("{}/locations", self.base_url);
        let limit = LOCATION_LIMIT.to_string();
        let body = self
            .get(
                &url,
                &[
                    ("country", self.country.as_str()),
                    ("city", self.city.as_str()),
                    ("parameter", pollutant.slug()),
                    ("limit", limit.as_str()),
                ],
            )
            .await?;
        let ids = parse_sensor_ids(&body, pollutant)?;
        info!("Found {} {} sensors in {}", ids.len(), pollutant, self.city);
        Ok(ids)
    }

    #[instrument(skip(self))]
    async fn sensor_measurements(
        &self,
        sensor_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Measurement>> {
        let url = format!("{}/sensors/{sensor_id}/measurements", self.base_url);
        let datetime_from = format!("{from}T00:00:00Z");
        let datetime_to = format!("{to}T23:59:59Z");
        let limit = MEASUREMENT_LIMIT.to_string();
        let body = self
            .get(
                &url,
                &[
                    ("datetime_from", datetime_from.as_str()),
                    ("datetime_to", datetime_to.as_str()),
                    ("limit", limit.as_str()),
                ],
            )
            .await?;
        parse_measurements(&body)
    }

    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        debug!("OpenAQ request: {url}");
        let res = self
            .http
            .get(url)
            .header("X-API-Key", &self.api_key)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await
            .context("Failed to send request to OpenAQ")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read OpenAQ response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenAQ request failed with status {}: {}",
                status,
                truncate_body(&body)
            ));
        }
        Ok(body)
    }
}

#[async_trait]
impl HistoryProvider for OpenAqClient {
    async fn measurements(
        &self,
        pollutant: Pollutant,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Measurement>> {
        let sensor_ids = self.sensor_ids(pollutant).await?;
        if sensor_ids.is_empty() {
            warn!("No {pollutant} sensors found in {}", self.city);
            return Ok(Vec::new());
        }

        let results = join_all(
            sensor_ids
                .iter()
                .map(|id| self.sensor_measurements(*id, from, to)),
        )
        .await;

        let mut all = Vec::new();
        for (sensor_id, result) in sensor_ids.iter().zip(results) {
            match result {
                Ok(measurements) => all.extend(measurements),
                Err(e) => warn!("Skipping sensor {sensor_id}: {e:#}"),
            }
        }
        info!("Fetched {} {} measurements", all.len(), pollutant);
        Ok(all)
    }
}

#[derive(Debug, Deserialize)]
struct Paged<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct LocationEntry {
    #[serde(default)]
    sensors: Vec<SensorEntry>,
}

#[derive(Debug, Deserialize)]
struct SensorEntry {
    id: u64,
    parameter: ParameterEntry,
}

#[derive(Debug, Deserialize)]
struct ParameterEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct MeasurementEntry {
    value: Option<f64>,
    datetime: Option<TimeEntry>,
    period: Option<PeriodEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PeriodEntry {
    datetime_from: Option<TimeEntry>,
}

#[derive(Debug, Deserialize)]
struct TimeEntry {
    utc: Option<String>,
    local: Option<String>,
}

impl TimeEntry {
    fn parse(&self) -> Option<DateTime<Utc>> {
        let raw = self.utc.as_deref().or(self.local.as_deref())?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

fn parse_sensor_ids(body: &str, pollutant: Pollutant) -> Result<Vec<u64>> {
    let page: Paged<LocationEntry> =
        serde_json::from_str(body).context("Failed to parse OpenAQ locations")?;

    Ok(page
        .results
        .iter()
        .flat_map(|location| location.sensors.iter())
        .filter(|sensor| sensor.parameter.name.eq_ignore_ascii_case(pollutant.slug()))
        .map(|sensor| sensor.id)
        .take(MAX_SENSORS)
        .collect())
}

/// Entries without a usable timestamp or value are skipped
fn parse_measurements(body: &str) -> Result<Vec<Measurement>> {
    let page: Paged<MeasurementEntry> =
        serde_json::from_str(body).context("Failed to parse OpenAQ measurements")?;

    Ok(page
        .results
        .iter()
        .filter_map(|entry| {
            let time = entry
                .datetime
                .as_ref()
                .or_else(|| entry.period.as_ref()?.datetime_from.as_ref())?;
            Some(Measurement {
                timestamp: time.parse()?,
                value: entry.value?,
            })
        })
        .collect())
}
