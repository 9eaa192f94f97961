use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::{FeedReading, truncate_body};
use crate::models::{AQI_MAX, Pollutant, Station};

/// Client for the World Air Quality Index feed API
#[derive(Debug, Clone)]
pub struct WaqiClient {
    http: Client,
    base_url: String,
    token: String,
    city_feed: String,
    station_timeout: Duration,
}

impl WaqiClient {
    pub fn new(
        http: Client,
        base_url: &str,
        token: Option<String>,
        city_feed: &str,
        station_timeout: Duration,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.unwrap_or_default(),
            city_feed: city_feed.to_string(),
            station_timeout,
        }
    }

    #[instrument(skip(self), fields(city = %self.city_feed))]
    pub async fn city_reading(&self) -> Result<FeedReading> {
        let url = format!("{}/feed/{}/", self.base_url, self.city_feed);
        self.fetch(&url, None).await
    }

    #[instrument(skip(self, station), fields(station = %station.feed))]
    pub async fn station_reading(&self, station: &Station) -> Result<FeedReading> {
        let url = format!("{}/feed/{}/{}/", self.base_url, self.city_feed, station.feed);
        self.fetch(&url, Some(self.station_timeout)).await
    }

    async fn fetch(&self, url: &str, timeout: Option<Duration>) -> Result<FeedReading> {
        debug!("WAQI request: {url}");
        let mut request = self.http.get(url).query(&[("token", self.token.as_str())]);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let res = request
            .send()
            .await
            .context("Failed to send request to WAQI")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read WAQI response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "WAQI request failed with status {}: {}",
                status,
                truncate_body(&body)
            ));
        }

        parse_feed(&body)
    }
}

#[derive(Debug, Deserialize)]
struct WaqiResponse {
    status: String,
    /// Feed data on success, an error message otherwise
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct WaqiData {
    /// Numeric, or "-" when the station has no current index
    #[serde(default)]
    aqi: Value,
    #[serde(default)]
    iaqi: HashMap<String, WaqiValue>,
}

#[derive(Debug, Deserialize)]
struct WaqiValue {
    v: f64,
}

/// Parse a feed body; WAQI reports pollutants in ppb
fn parse_feed(body: &str) -> Result<FeedReading> {
    let response: WaqiResponse =
        serde_json::from_str(body).context("Failed to parse WAQI JSON")?;

    if response.status != "ok" {
        return Err(anyhow!(
            "WAQI returned status '{}': {}",
            response.status,
            truncate_body(&response.data.to_string())
        ));
    }

    let data: WaqiData =
        serde_json::from_value(response.data).context("Unexpected WAQI data layout")?;

    let concentration = |pollutant: Pollutant| {
        data.iaqi
            .get(pollutant.slug())
            .map(|value| value.v)
            .filter(|v| *v > 0.0)
            .map(|ppb| ppb * pollutant.ppb_to_ugm3())
    };

    Ok(FeedReading {
        no2: concentration(Pollutant::No2),
        o3: concentration(Pollutant::O3),
        aqi: data
            .aqi
            .as_f64()
            .filter(|aqi| (0.0..=f64::from(AQI_MAX)).contains(aqi))
            .map(|aqi| aqi.round() as u16),
    })
}
