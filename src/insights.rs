//! Weather correlation and dashboard summary

use std::collections::BTreeMap;

use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;

use crate::models::{
    AirQualitySample, AqiCategory, CurrentAirQuality, DataSource, Pollutant, WeatherSample, aqi_from_concentrations,
    round2,
};

/// Pearson correlation coefficient.
///
/// Returns 0 for fewer than two pairs or when either series is constant.
#[must_use]
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let (dx, dy) = (x - mean_x, y - mean_y);
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denominator = (var_x * var_y).sqrt();
    if denominator <= f64::EPSILON {
        return 0.0;
    }
    (cov / denominator).clamp(-1.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherFactor {
    Temperature,
    WindSpeed,
    Humidity,
    SolarRadiation,
}

impl WeatherFactor {
    pub const ALL: [WeatherFactor; 4] = [
        WeatherFactor::Temperature,
        WeatherFactor::WindSpeed,
        WeatherFactor::Humidity,
        WeatherFactor::SolarRadiation,
    ];

    fn value(self, sample: &WeatherSample) -> Option<f64> {
        match self {
            WeatherFactor::Temperature => sample.temperature,
            WeatherFactor::WindSpeed => sample.wind_speed,
            WeatherFactor::Humidity => sample.humidity,
            WeatherFactor::SolarRadiation => sample.solar_radiation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorCorrelation {
    pub pollutant: Pollutant,
    pub factor: WeatherFactor,
    /// Pearson r in `[-1, 1]`, two decimals
    pub coefficient: f64,
    /// Number of hours with both values present
    pub samples: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorrelationReport {
    pub timestamp: DateTime<Utc>,
    pub window_hours: u32,
    pub source: DataSource,
    pub correlations: Vec<FactorCorrelation>,
}

/// Correlate each pollutant with each weather factor over hours present in
/// both series
#[must_use]
pub fn correlate(
    air_quality: &[AirQualitySample],
    weather: &[WeatherSample],
) -> Vec<FactorCorrelation> {
    let weather_by_hour: BTreeMap<DateTime<Utc>, &WeatherSample> =
        weather.iter().map(|w| (w.timestamp, w)).collect();

    let mut correlations = Vec::with_capacity(Pollutant::all().len() * WeatherFactor::ALL.len());
    for &pollutant in Pollutant::all() {
        for factor in WeatherFactor::ALL {
            let (xs, ys): (Vec<f64>, Vec<f64>) = air_quality
                .iter()
                .filter_map(|sample| {
                    let w = weather_by_hour.get(&sample.timestamp)?;
                    Some((sample.value(pollutant)?, factor.value(w)?))
                })
                .unzip();
            correlations.push(FactorCorrelation {
                pollutant,
                factor,
                coefficient: round2(pearson(&xs, &ys)),
                samples: xs.len(),
            });
        }
    }
    correlations
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakHours {
    pub pollutant: Pollutant,
    /// Hours of day (UTC) with the highest mean concentration, highest first
    pub hours: Vec<u32>,
    /// Mean concentration over those hours
    pub average: f64,
}

/// The `top` hours of day with the highest mean concentration
#[must_use]
pub fn peak_hours(samples: &[AirQualitySample], pollutant: Pollutant, top: usize) -> PeakHours {
    let mut by_hour: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for sample in samples {
        if let Some(value) = sample.value(pollutant) {
            let (sum, count) = by_hour.entry(sample.timestamp.hour()).or_default();
            *sum += value;
            *count += 1;
        }
    }

    let mut means: Vec<(u32, f64)> = by_hour
        .into_iter()
        .map(|(hour, (sum, count))| (hour, sum / count as f64))
        .collect();
    // highest mean first, earlier hour on ties
    means.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    means.truncate(top);

    let average = if means.is_empty() {
        0.0
    } else {
        means.iter().map(|(_, mean)| mean).sum::<f64>() / means.len() as f64
    };

    PeakHours {
        pollutant,
        hours: means.iter().map(|(hour, _)| *hour).collect(),
        average: round2(average),
    }
}

/// Health guidance for an AQI category
#[must_use]
pub fn recommendations(category: AqiCategory) -> Vec<String> {
    let advice: &[&str] = match category {
        AqiCategory::Good => &["Air quality is good. Enjoy outdoor activities."],
        AqiCategory::Satisfactory => &[
            "Unusually sensitive people should limit prolonged outdoor exertion.",
        ],
        AqiCategory::Moderate => &[
            "People with asthma or heart disease should reduce outdoor exertion.",
            "Keep windows closed during traffic peaks.",
        ],
        AqiCategory::Poor => &[
            "Avoid prolonged outdoor activity.",
            "Wear an N95 mask outdoors.",
            "Run an air purifier indoors if available.",
        ],
        AqiCategory::VeryPoor | AqiCategory::Severe => &[
            "Stay indoors and keep windows closed.",
            "Avoid all outdoor physical activity.",
            "Wear an N95 mask if you must go outside.",
            "Seek medical advice if you experience breathing difficulty.",
        ],
    };
    advice.iter().map(|s| (*s).to_string()).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct InsightSummary {
    pub timestamp: DateTime<Utc>,
    pub aqi_value: u16,
    pub aqi_category: AqiCategory,
    pub category_label: String,
    pub peak_hours: Vec<PeakHours>,
    pub recommendations: Vec<String>,
    /// Origin of the hourly series behind `peak_hours`
    pub source: DataSource,
    /// Origin of the reading behind the category
    pub current_source: DataSource,
}

/// Peak hours from `samples`, category from the current concentrations
#[must_use]
pub fn summarize(
    samples: &[AirQualitySample],
    samples_source: DataSource,
    current: &CurrentAirQuality,
) -> InsightSummary {
    let aqi_value = aqi_from_concentrations(current.no2, current.o3);
    let category = AqiCategory::from_aqi(aqi_value);
    InsightSummary {
        timestamp: current.timestamp,
        aqi_value,
        aqi_category: category,
        category_label: category.label().to_string(),
        peak_hours: Pollutant::all()
            .iter()
            .map(|&pollutant| peak_hours(samples, pollutant, 3))
            .collect(),
        recommendations: recommendations(category),
        source: samples_source,
        current_source: current.source,
    }
}
