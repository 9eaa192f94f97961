//! Historical aggregates and seasonal patterns

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalDataPoint {
    pub year: i32,
    pub month: u32,
    pub avg_no2: f64,
    pub avg_o3: f64,
    pub max_no2: f64,
    pub max_o3: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyDataPoint {
    /// `YYYY-MM-DD`
    pub week_start: String,
    pub week_end: String,
    pub avg_no2: f64,
    pub avg_o3: f64,
    pub max_no2: f64,
    pub max_o3: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyDataPoint {
    pub date: String,
    pub avg_no2: f64,
    pub avg_o3: f64,
    pub max_no2: f64,
    pub max_o3: f64,
}

/// Historical series at the requested granularity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HistoricalSeries {
    Monthly(Vec<HistoricalDataPoint>),
    Weekly(Vec<WeeklyDataPoint>),
    Daily(Vec<DailyDataPoint>),
}

impl HistoricalSeries {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            HistoricalSeries::Monthly(points) => points.is_empty(),
            HistoricalSeries::Weekly(points) => points.is_empty(),
            HistoricalSeries::Daily(points) => points.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonalPattern {
    pub season: String,
    pub avg_no2: f64,
    pub avg_o3: f64,
    pub description: String,
}
