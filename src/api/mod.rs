//! HTTP API mounted under `/api`

use std::sync::Arc;

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::config::AirWatchConfig;
use crate::ml::ModelRegistry;
use crate::upstream::{AirQualityProvider, HistoryProvider, WeatherProvider};

mod conditions;
pub mod error;
mod forecast;
mod history;
mod hotspots;
mod insights;
mod status;

pub use error::ApiError;

/// Everything a handler may touch. Built once at startup, read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AirWatchConfig>,
    pub registry: Arc<ModelRegistry>,
    pub air_quality: Arc<dyn AirQualityProvider>,
    pub weather: Arc<dyn WeatherProvider>,
    pub history: Arc<dyn HistoryProvider>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/current-air-quality", get(conditions::current_air_quality))
        .route("/weather", get(conditions::weather))
        .route("/alerts", get(conditions::alerts))
        .route("/forecast/{pollutant}", get(forecast::forecast))
        .route("/forecast/{pollutant}/export", get(forecast::export))
        .route("/hotspots", get(hotspots::hotspots))
        .route("/historical", get(history::historical))
        .route("/seasonal-patterns", get(history::seasonal_patterns))
        .route("/aqi-scale", get(history::aqi_scale))
        .route(
            "/insights/weather-correlation",
            get(insights::weather_correlation),
        )
        .route("/insights/summary", get(insights::summary))
        .route("/models/status", get(status::models_status))
        .with_state(state)
}

#[derive(Serialize)]
pub(crate) struct RootResponse {
    message: &'static str,
    version: &'static str,
}

pub(crate) async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "AirWatch Air Quality Intelligence API",
        version: crate::VERSION,
    })
}
