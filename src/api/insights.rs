use axum::{Json, extract::State};
use chrono::{Duration, Utc};
use tracing::warn;

use super::AppState;
use super::conditions::current_conditions;
use crate::insights::{self, CorrelationReport, InsightSummary};
use crate::mock;
use crate::models::DataSource;

/// Hours of history used for correlation and peak detection
const WINDOW_HOURS: u32 = 72;

pub(super) async fn weather_correlation(State(state): State<AppState>) -> Json<CorrelationReport> {
    let now = Utc::now();
    let (air_quality, weather) = futures::join!(
        state.air_quality.hourly_samples(WINDOW_HOURS, 0),
        state.weather.hourly(WINDOW_HOURS, 0)
    );

    let (air_quality, weather, source) = match (air_quality, weather) {
        (Ok(air_quality), Ok(weather)) => (air_quality, weather, DataSource::Live),
        (air_quality, weather) => {
            if let Err(e) = air_quality {
                warn!("Hourly air quality unavailable for correlation: {e:#}");
            }
            if let Err(e) = weather {
                warn!("Hourly weather unavailable for correlation: {e:#}");
            }
            let start = mock::truncate_to_hour(now) - Duration::hours(i64::from(WINDOW_HOURS));
            let mut rng = rand::rng();
            (
                mock::air_quality_samples(start, WINDOW_HOURS, &mut rng),
                mock::weather_samples(start, WINDOW_HOURS, &mut rng),
                DataSource::Mock,
            )
        }
    };

    Json(CorrelationReport {
        timestamp: now,
        window_hours: WINDOW_HOURS,
        source,
        correlations: insights::correlate(&air_quality, &weather),
    })
}

pub(super) async fn summary(State(state): State<AppState>) -> Json<InsightSummary> {
    let current = current_conditions(&state).await;
    let (samples, source) = match state.air_quality.hourly_samples(WINDOW_HOURS, 0).await {
        Ok(samples) if !samples.is_empty() => (samples, DataSource::Live),
        Ok(_) => (mock_window(current.timestamp), DataSource::Mock),
        Err(e) => {
            warn!("Hourly air quality unavailable for summary: {e:#}");
            (mock_window(current.timestamp), DataSource::Mock)
        }
    };

    Json(insights::summarize(&samples, source, &current))
}

fn mock_window(now: chrono::DateTime<Utc>) -> Vec<crate::models::AirQualitySample> {
    let start = mock::truncate_to_hour(now) - Duration::hours(i64::from(WINDOW_HOURS));
    mock::air_quality_samples(start, WINDOW_HOURS, &mut rand::rng())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use chrono::{Duration, Utc};

    use super::super::test_support::{StubUpstream, app, get_json, hourly_series};
    use crate::ml::ModelRegistry;
    use crate::mock;
    use crate::models::WeatherSample;
    use crate::upstream::FeedReading;

    #[tokio::test]
    async fn correlation_falls_back_to_mock() {
        let (status, body) = get_json(
            app(ModelRegistry::disabled(), Arc::new(StubUpstream::failing())),
            "/insights/weather-correlation",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "mock");
        let correlations = body["correlations"].as_array().unwrap();
        assert_eq!(correlations.len(), 8);
        for c in correlations {
            let r = c["coefficient"].as_f64().unwrap();
            assert!((-1.0..=1.0).contains(&r));
        }
    }

    #[tokio::test]
    async fn correlation_uses_live_series() {
        let samples = hourly_series();
        let weather: Vec<WeatherSample> = samples
            .iter()
            .map(|s| WeatherSample {
                timestamp: s.timestamp,
                temperature: s.no2.map(|v| v / 2.0),
                humidity: Some(55.0),
                wind_speed: Some(4.0),
                solar_radiation: Some(0.0),
            })
            .collect();
        let upstream = Arc::new(StubUpstream {
            hourly: Some(samples),
            weather_hourly: Some(weather),
            ..StubUpstream::default()
        });
        let (_, body) = get_json(
            app(ModelRegistry::disabled(), upstream),
            "/insights/weather-correlation",
        )
        .await;
        assert_eq!(body["source"], "live");
        let temp = body["correlations"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["pollutant"] == "NO2" && c["factor"] == "temperature")
            .unwrap()
            .clone();
        assert_eq!(temp["coefficient"], 1.0);
        assert_eq!(temp["samples"], 96);
    }

    #[tokio::test]
    async fn summary_reports_peaks_and_advice() {
        let start = mock::truncate_to_hour(Utc::now()) - Duration::hours(72);
        let upstream = Arc::new(StubUpstream {
            hourly: Some(mock::air_quality_samples(start, 72, &mut rand::rng())),
            ..StubUpstream::default()
        });
        let (status, body) =
            get_json(app(ModelRegistry::disabled(), upstream), "/insights/summary").await;
        assert_eq!(status, StatusCode::OK);
        // hourly series was live even though the city reading failed
        assert_eq!(body["source"], "live");
        assert_eq!(body["current_source"], "mock");
        let peaks = body["peak_hours"].as_array().unwrap();
        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks[0]["hours"].as_array().unwrap().len(), 3);
        assert!(!body["recommendations"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn summary_reports_mock_series_with_live_reading() {
        let upstream = Arc::new(StubUpstream {
            city: Some(FeedReading {
                no2: Some(80.0),
                o3: Some(40.0),
                aqi: None,
            }),
            ..StubUpstream::default()
        });
        let (_, body) =
            get_json(app(ModelRegistry::disabled(), upstream), "/insights/summary").await;
        assert_eq!(body["source"], "mock");
        assert_eq!(body["current_source"], "live");
    }
}
