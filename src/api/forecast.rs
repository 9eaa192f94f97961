use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::header,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::{ApiError, AppState};
use crate::error::AirWatchError;
use crate::forecast::{self, ForecastHorizon};
use crate::mock;
use crate::models::{ForecastResponse, Pollutant};
use crate::resolver::{ForecastResolution, resolve_forecast};

/// Raw query; `hours` stays a string so bad values get our own error body
#[derive(Debug, Deserialize)]
pub(super) struct ForecastQuery {
    hours: Option<String>,
    site: Option<String>,
}

impl ForecastQuery {
    fn parse(&self, pollutant: &str) -> Result<(Pollutant, ForecastHorizon), AirWatchError> {
        let pollutant: Pollutant = pollutant.parse()?;
        let horizon = ForecastHorizon::parse(self.hours.as_deref())?;
        Ok((pollutant, horizon))
    }
}

pub(super) async fn forecast(
    State(state): State<AppState>,
    Path(pollutant): Path<String>,
    query: Result<Query<ForecastQuery>, QueryRejection>,
) -> Result<Json<ForecastResponse>, ApiError> {
    let Query(query) = query?;
    let (pollutant, horizon) = query.parse(&pollutant)?;
    let forecast = build_forecast(&state, pollutant, horizon, query.site.as_deref()).await?;
    Ok(Json(forecast))
}

pub(super) async fn export(
    State(state): State<AppState>,
    Path(pollutant): Path<String>,
    query: Result<Query<ForecastQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let (pollutant, horizon) = query.parse(&pollutant)?;
    let forecast = build_forecast(&state, pollutant, horizon, query.site.as_deref()).await?;

    let filename = format!(
        "attachment; filename=\"{}_forecast_{}h.csv\"",
        pollutant.slug(),
        horizon.hours()
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        forecast::to_csv(&forecast),
    ))
}

/// Serve from the source the resolver picked
#[instrument(skip(state))]
async fn build_forecast(
    state: &AppState,
    pollutant: Pollutant,
    horizon: ForecastHorizon,
    site: Option<&str>,
) -> Result<ForecastResponse, AirWatchError> {
    let now = Utc::now();
    match resolve_forecast(&state.registry, pollutant, site) {
        ForecastResolution::Model { site, model } => {
            let weather = match state.weather.current().await {
                Ok(weather) => Some(weather),
                Err(e) => {
                    warn!("Forecasting without weather features: {e:#}");
                    None
                }
            };
            info!("Serving {pollutant} forecast from model at site {site}");
            forecast::model_forecast(model.as_ref(), &site, horizon, now, weather)
        }
        ForecastResolution::LiveFallback => Ok(live_or_mock(state, pollutant, horizon, now).await),
        ForecastResolution::Unavailable(reason) => {
            warn!("{pollutant} forecast unavailable: {reason}");
            Err(AirWatchError::unavailable(reason))
        }
    }
}

async fn live_or_mock(
    state: &AppState,
    pollutant: Pollutant,
    horizon: ForecastHorizon,
    now: DateTime<Utc>,
) -> ForecastResponse {
    let samples = match state
        .air_quality
        .hourly_samples(1, horizon.hours() + 1)
        .await
    {
        Ok(samples) => samples,
        Err(e) => {
            warn!("Hourly forecast feed failed, serving mock data: {e:#}");
            Vec::new()
        }
    };

    if let Some(live) = forecast::live_forecast(pollutant, horizon, &samples, now) {
        return live;
    }

    // continue from the current value when the series has one
    let start = mock::truncate_to_hour(now);
    let seed = samples
        .iter()
        .find(|sample| sample.timestamp == start)
        .and_then(|sample| sample.value(pollutant));
    forecast::mock_forecast(pollutant, horizon, now, seed, &mut rand::rng())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use rstest::rstest;

    use super::super::test_support::{StubUpstream, app, get, get_json, hourly_series};
    use crate::forecast::parse_forecast_csv;
    use crate::ml::{BaselineTrendModel, ForecastModel, ModelRegistry};
    use crate::models::Pollutant;

    fn model(pollutant: Pollutant) -> Arc<dyn ForecastModel> {
        Arc::new(BaselineTrendModel::new(pollutant))
    }

    fn loaded_registry() -> ModelRegistry {
        ModelRegistry::with_handles(
            "site1",
            [
                ("site1".to_string(), model(Pollutant::No2)),
                ("site1".to_string(), model(Pollutant::O3)),
            ],
        )
    }

    #[rstest]
    #[case("/forecast/o3?hours=48", 48)]
    #[case("/forecast/no2?hours=24", 24)]
    #[case("/forecast/no2", 24)]
    #[tokio::test]
    async fn disabled_models_serve_mock(#[case] uri: &str, #[case] expected: usize) {
        let (status, body) = get_json(
            app(ModelRegistry::disabled(), Arc::new(StubUpstream::failing())),
            uri,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "mock");
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), expected);
        for point in data {
            assert!(point["timestamp"].is_string());
            let confidence = point["confidence"].as_f64().unwrap();
            assert!((0.0..=1.0).contains(&confidence));
            let value = point["value"].as_f64().unwrap();
            assert!(value >= 0.0);
        }
    }

    #[tokio::test]
    async fn disabled_models_prefer_live_series() {
        let upstream = Arc::new(StubUpstream {
            hourly: Some(hourly_series()),
            ..StubUpstream::default()
        });
        let (status, body) =
            get_json(app(ModelRegistry::disabled(), upstream), "/forecast/no2?hours=48").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "live");
        assert_eq!(body["data"].as_array().unwrap().len(), 48);
    }

    #[rstest]
    #[case("/forecast/no2?hours=12")]
    #[case("/forecast/o3?hours=abc")]
    #[case("/forecast/no2/export?hours=72")]
    #[case("/forecast/no2?hours=24&hours=48")]
    #[case("/forecast/o3/export?hours=24&hours=24")]
    #[tokio::test]
    async fn bad_horizon_is_400_naming_hours(#[case] uri: &str) {
        let (status, body) = get_json(
            app(ModelRegistry::disabled(), Arc::new(StubUpstream::failing())),
            uri,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"]["status"], "invalid_parameter");
        assert!(body["detail"]["message"].as_str().unwrap().contains("hours"));
    }

    #[tokio::test]
    async fn unknown_pollutant_is_404() {
        let (status, body) = get_json(
            app(ModelRegistry::disabled(), Arc::new(StubUpstream::failing())),
            "/forecast/pm25?hours=24",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["detail"]["message"].as_str().unwrap().contains("pm25"));
    }

    #[tokio::test]
    async fn enabled_without_models_is_503() {
        let registry = ModelRegistry::with_handles("site1", []);
        let upstream = Arc::new(StubUpstream::failing());
        let (status, body) =
            get_json(app(registry, upstream.clone()), "/forecast/no2?hours=24").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["detail"]["status"], "models_unavailable");
        // refused before any upstream call
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn missing_site_is_503() {
        let (status, body) =
            get_json(app(loaded_registry(), Arc::new(StubUpstream::failing())), "/forecast/o3?site=site9")
                .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["detail"]["reason"].as_str().unwrap().contains("site9"));
    }

    #[tokio::test]
    async fn loaded_model_serves_forecast() {
        let (status, body) = get_json(
            app(loaded_registry(), Arc::new(StubUpstream::failing())),
            "/forecast/no2?hours=48",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "model");
        assert_eq!(body["site"], "site1");
        assert_eq!(body["data"].as_array().unwrap().len(), 48);
    }

    #[tokio::test]
    async fn export_returns_parseable_csv() {
        let (status, body) = get(
            app(ModelRegistry::disabled(), Arc::new(StubUpstream::failing())),
            "/forecast/o3/export?hours=24",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(body).unwrap();
        let readings = parse_forecast_csv(&text).unwrap();
        assert_eq!(readings.len(), 24);
        assert!(readings.iter().all(|r| r.pollutant == Pollutant::O3));
    }

    #[tokio::test]
    async fn export_respects_unavailability() {
        let (status, _) = get(
            app(ModelRegistry::with_handles("site1", []), Arc::new(StubUpstream::failing())),
            "/forecast/o3/export?hours=24",
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
