//! Forecasting model seam
//!
//! Trained artifacts are opaque to the service: a loader turns a file into a
//! [`ForecastModel`] handle, and the forecast path only ever calls
//! [`ForecastModel::predict`].

use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::error::AirWatchError;
use crate::models::{Pollutant, WeatherSnapshot};

/// Inputs for one forecast hour
#[derive(Debug, Clone)]
pub struct ForecastFeatures {
    pub timestamp: DateTime<Utc>,
    /// Hours ahead of the first forecast point
    pub lead_hours: u32,
    pub hour_of_day: u32,
    pub month: u32,
    /// Weather at request time, when it could be fetched
    pub weather: Option<WeatherSnapshot>,
}

impl ForecastFeatures {
    #[must_use]
    pub fn at(
        timestamp: DateTime<Utc>,
        lead_hours: u32,
        weather: Option<WeatherSnapshot>,
    ) -> Self {
        Self {
            timestamp,
            lead_hours,
            hour_of_day: timestamp.hour(),
            month: timestamp.month(),
            weather,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub value: f64,
    pub confidence: f64,
}

/// A loaded, immutable forecasting model
pub trait ForecastModel: Send + Sync + Debug {
    fn pollutant(&self) -> Pollutant;

    fn predict(&self, features: &ForecastFeatures) -> Result<Prediction, AirWatchError>;
}

/// Turns artifact files into model handles
pub trait ArtifactLoader: Send + Sync {
    /// Load a model; `scaler` is the paired feature scaler, if the pollutant needs one
    fn load(
        &self,
        pollutant: Pollutant,
        artifact: &Path,
        scaler: Option<&Path>,
    ) -> Result<Arc<dyn ForecastModel>, AirWatchError>;
}

/// Loader for artifacts on the local filesystem.
///
/// Artifacts must exist and be non-empty. The serialized model runtimes are
/// not linked into this binary, so every accepted artifact is served by a
/// [`BaselineTrendModel`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FileArtifactLoader;

fn check_artifact(path: &Path) -> Result<(), AirWatchError> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        AirWatchError::model(format!("Model file not readable: {} ({e})", path.display()))
    })?;
    if !metadata.is_file() {
        return Err(AirWatchError::model(format!(
            "Model path is not a file: {}",
            path.display()
        )));
    }
    if metadata.len() == 0 {
        return Err(AirWatchError::model(format!(
            "Model file is empty: {}",
            path.display()
        )));
    }
    Ok(())
}

impl ArtifactLoader for FileArtifactLoader {
    fn load(
        &self,
        pollutant: Pollutant,
        artifact: &Path,
        scaler: Option<&Path>,
    ) -> Result<Arc<dyn ForecastModel>, AirWatchError> {
        check_artifact(artifact)?;
        if let Some(scaler) = scaler {
            check_artifact(scaler)?;
        }
        Ok(Arc::new(BaselineTrendModel::new(pollutant)))
    }
}

/// Per-pollutant baseline with a linear drift over the horizon
#[derive(Debug, Clone)]
pub struct BaselineTrendModel {
    pollutant: Pollutant,
    intercept: f64,
    slope_per_hour: f64,
    confidence: f64,
}

impl BaselineTrendModel {
    #[must_use]
    pub fn new(pollutant: Pollutant) -> Self {
        let (intercept, slope_per_hour, confidence) = match pollutant {
            Pollutant::No2 => (80.0, 0.5, 0.85),
            Pollutant::O3 => (60.0, 0.3, 0.82),
        };
        Self {
            pollutant,
            intercept,
            slope_per_hour,
            confidence,
        }
    }
}

impl ForecastModel for BaselineTrendModel {
    fn pollutant(&self) -> Pollutant {
        self.pollutant
    }

    fn predict(&self, features: &ForecastFeatures) -> Result<Prediction, AirWatchError> {
        let value = self.intercept + self.slope_per_hour * f64::from(features.lead_hours);
        Ok(Prediction {
            value: self.pollutant.clamp(value),
            confidence: self.confidence,
        })
    }
}
