use axum::{Json, extract::State};
use chrono::{DateTime, Duration, Utc};
use tracing::{instrument, warn};

use super::AppState;
use crate::mock;
use crate::models::{
    Alert, AqiCategory, CurrentAirQuality, DataSource, Pollutant, Trend, WeatherSnapshot,
    aqi_from_concentrations, round2,
};
use crate::upstream::FeedReading;

pub(super) async fn current_air_quality(State(state): State<AppState>) -> Json<CurrentAirQuality> {
    Json(current_conditions(&state).await)
}

pub(super) async fn weather(State(state): State<AppState>) -> Json<WeatherSnapshot> {
    let snapshot = match state.weather.current().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Weather lookup failed, serving mock data: {e:#}");
            mock::weather(Utc::now())
        }
    };
    Json(snapshot)
}

pub(super) async fn alerts(State(state): State<AppState>) -> Json<Vec<Alert>> {
    let current = current_conditions(&state).await;
    Json(vec![Alert::for_no2_level(current.no2, current.timestamp)])
}

/// Current city conditions: live WAQI reading with trends from the previous
/// hour of the hourly series, or mock values when the feed fails
#[instrument(skip(state))]
pub(super) async fn current_conditions(state: &AppState) -> CurrentAirQuality {
    let now = Utc::now();
    let location = state.config.city.name.clone();

    let reading = match state.air_quality.city_reading().await {
        Ok(reading) => reading,
        Err(e) => {
            warn!("City feed failed, serving mock data: {e:#}");
            return mock_conditions(location, now);
        }
    };

    let previous_hour = mock::truncate_to_hour(now) - Duration::hours(1);
    let previous = match state.air_quality.hourly_samples(2, 1).await {
        Ok(samples) => samples.into_iter().find(|s| s.timestamp == previous_hour),
        Err(e) => {
            warn!("Hourly series unavailable, trends default to steady: {e:#}");
            None
        }
    };

    let trend = |pollutant: Pollutant, current: f64| {
        previous
            .as_ref()
            .and_then(|sample| sample.value(pollutant))
            .map_or(Trend::Steady, |prev| Trend::classify(prev, current))
    };

    let (no2, o3) = fill_missing(reading, now);
    let aqi_value = reading
        .aqi_on_scale()
        .unwrap_or_else(|| aqi_from_concentrations(no2, o3));

    CurrentAirQuality {
        timestamp: now,
        location,
        no2,
        o3,
        aqi_value,
        aqi_category: AqiCategory::from_aqi(aqi_value),
        trend_no2: trend(Pollutant::No2, no2),
        trend_o3: trend(Pollutant::O3, o3),
        source: DataSource::Live,
    }
}

/// Pollutants the feed did not report are filled with mock values
fn fill_missing(reading: FeedReading, now: DateTime<Utc>) -> (f64, f64) {
    let mut rng = rand::rng();
    let no2 = reading
        .no2
        .unwrap_or_else(|| mock::current_pair(Pollutant::No2, now, &mut rng).1);
    let o3 = reading
        .o3
        .unwrap_or_else(|| mock::current_pair(Pollutant::O3, now, &mut rng).1);
    (round2(no2), round2(o3))
}

fn mock_conditions(location: String, now: DateTime<Utc>) -> CurrentAirQuality {
    let mut rng = rand::rng();
    let (prev_no2, no2) = mock::current_pair(Pollutant::No2, now, &mut rng);
    let (prev_o3, o3) = mock::current_pair(Pollutant::O3, now, &mut rng);
    let aqi_value = aqi_from_concentrations(no2, o3);

    CurrentAirQuality {
        timestamp: now,
        location,
        no2,
        o3,
        aqi_value,
        aqi_category: AqiCategory::from_aqi(aqi_value),
        trend_no2: Trend::classify(prev_no2, no2),
        trend_o3: Trend::classify(prev_o3, o3),
        source: DataSource::Mock,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;

    use super::super::test_support::{StubUpstream, app, get_json, hourly_series, live_weather};
    use crate::ml::ModelRegistry;
    use crate::upstream::FeedReading;

    #[tokio::test]
    async fn live_reading_with_trends() {
        let upstream = Arc::new(StubUpstream {
            city: Some(FeedReading {
                no2: Some(188.0),
                o3: Some(40.0),
                aqi: Some(212),
            }),
            hourly: Some(hourly_series()),
            ..StubUpstream::default()
        });
        let (status, body) =
            get_json(app(ModelRegistry::disabled(), upstream), "/current-air-quality").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "live");
        assert_eq!(body["no2"], 188.0);
        assert_eq!(body["aqi_value"], 212);
        assert_eq!(body["aqi_category"], "poor");
        assert_eq!(body["location"], "Delhi, India");
        // previous-hour values in the stub series are well below the live ones
        assert_eq!(body["trend_no2"], "rising");
    }

    #[tokio::test]
    async fn failing_feed_serves_mock() {
        let (status, body) = get_json(
            app(ModelRegistry::disabled(), Arc::new(StubUpstream::failing())),
            "/current-air-quality",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "mock");
        assert!(body["no2"].as_f64().unwrap() >= 0.0);
    }

    #[tokio::test]
    async fn partial_reading_is_completed_and_aqi_derived() {
        let upstream = Arc::new(StubUpstream {
            city: Some(FeedReading {
                no2: Some(50.0),
                o3: None,
                aqi: None,
            }),
            ..StubUpstream::default()
        });
        let (_, body) =
            get_json(app(ModelRegistry::disabled(), upstream), "/current-air-quality").await;
        assert_eq!(body["source"], "live");
        assert_eq!(body["trend_no2"], "steady");
        assert!(body["o3"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn weather_falls_back_to_mock() {
        let (_, body) = get_json(
            app(ModelRegistry::disabled(), Arc::new(StubUpstream::failing())),
            "/weather",
        )
        .await;
        assert_eq!(body["source"], "mock");
        assert_eq!(body["temperature"], 25.5);

        let upstream = Arc::new(StubUpstream {
            weather: Some(live_weather()),
            ..StubUpstream::default()
        });
        let (_, body) = get_json(app(ModelRegistry::disabled(), upstream), "/weather").await;
        assert_eq!(body["source"], "live");
    }

    #[tokio::test]
    async fn alerts_follow_no2_level() {
        let upstream = Arc::new(StubUpstream {
            city: Some(FeedReading {
                no2: Some(160.0),
                o3: Some(20.0),
                aqi: None,
            }),
            ..StubUpstream::default()
        });
        let (status, body) = get_json(app(ModelRegistry::disabled(), upstream), "/alerts").await;
        assert_eq!(status, StatusCode::OK);
        let alerts = body.as_array().unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0]["severity"], "danger");
        assert!(!alerts[0]["recommendations"].as_array().unwrap().is_empty());
    }
}
