//! Monitoring stations and their hotspot readings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AQI_MAX, AqiCategory, DataSource, aqi_from_concentrations, round2};

/// A fixed monitoring station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Station slug in the WAQI feed, e.g. `anand-vihar`
    pub feed: String,
}

impl Station {
    pub fn new(name: &str, latitude: f64, longitude: f64, feed: &str) -> Self {
        Self {
            name: name.to_string(),
            latitude,
            longitude,
            feed: feed.to_string(),
        }
    }
}

/// Current readings and derived severity at one station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationHotspot {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub no2: f64,
    pub o3: f64,
    pub aqi: u16,
    pub severity: AqiCategory,
    pub source: DataSource,
}

impl StationHotspot {
    /// Build a hotspot with the AQI reported by the feed
    #[must_use]
    pub fn with_aqi(station: &Station, no2: f64, o3: f64, aqi: u16, source: DataSource) -> Self {
        Self {
            name: station.name.clone(),
            latitude: station.latitude,
            longitude: station.longitude,
            no2: round2(no2),
            o3: round2(o3),
            aqi: aqi.min(AQI_MAX),
            severity: AqiCategory::from_aqi(aqi),
            source,
        }
    }

    /// Build a hotspot with the AQI derived from concentrations
    #[must_use]
    pub fn derived(station: &Station, no2: f64, o3: f64, source: DataSource) -> Self {
        Self::with_aqi(station, no2, o3, aqi_from_concentrations(no2, o3), source)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotspotsResponse {
    pub timestamp: DateTime<Utc>,
    pub locations: Vec<StationHotspot>,
}
