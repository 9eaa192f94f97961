use std::time::Duration;

use axum::{Json, extract::State};
use chrono::Utc;
use futures::future::join_all;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::{ApiError, AppState};
use crate::error::AirWatchError;
use crate::mock;
use crate::models::{DataSource, HotspotsResponse, Station, StationHotspot};
use crate::resolver::{HotspotResolution, resolve_hotspots};
use crate::upstream::FeedReading;

/// Outcome of one station lookup
type StationResult = Result<anyhow::Result<FeedReading>, tokio::time::error::Elapsed>;

pub(super) async fn hotspots(
    State(state): State<AppState>,
) -> Result<Json<HotspotsResponse>, ApiError> {
    match resolve_hotspots(&state.registry) {
        HotspotResolution::Unavailable(reason) => {
            warn!("Hotspots unavailable: {reason}");
            return Err(AirWatchError::unavailable(reason).into());
        }
        HotspotResolution::ModelBacked => debug!("Hotspots served with a complete model set"),
        HotspotResolution::LiveFallback => debug!("Hotspots served without models"),
    }

    let stations = &state.config.city.stations;
    let per_station = state.config.upstream.station_timeout();

    let results = join_all(
        stations
            .iter()
            .map(|station| fetch_station(&state, station, per_station)),
    )
    .await;

    Ok(Json(HotspotsResponse {
        timestamp: Utc::now(),
        locations: assemble(stations, results),
    }))
}

async fn fetch_station(state: &AppState, station: &Station, limit: Duration) -> StationResult {
    timeout(limit, state.air_quality.station_reading(station)).await
}

/// Pair each station with its reading; failed stations get mock values
/// without affecting the others
fn assemble(stations: &[Station], results: Vec<StationResult>) -> Vec<StationHotspot> {
    let mut rng = rand::rng();
    stations
        .iter()
        .zip(results)
        .map(|(station, result)| match result {
            Ok(Ok(reading)) => {
                let (mock_no2, mock_o3) = mock::station_values(&mut rng);
                let no2 = reading.no2.unwrap_or(mock_no2);
                let o3 = reading.o3.unwrap_or(mock_o3);
                match reading.aqi_on_scale() {
                    Some(aqi) => StationHotspot::with_aqi(station, no2, o3, aqi, DataSource::Live),
                    None => StationHotspot::derived(station, no2, o3, DataSource::Live),
                }
            }
            Ok(Err(e)) => {
                warn!("Station {} failed, serving mock data: {e:#}", station.name);
                mock_hotspot(station, &mut rng)
            }
            Err(_) => {
                warn!("Station {} timed out, serving mock data", station.name);
                mock_hotspot(station, &mut rng)
            }
        })
        .collect()
}

fn mock_hotspot<R: rand::RngExt + ?Sized>(station: &Station, rng: &mut R) -> StationHotspot {
    let (no2, o3) = mock::station_values(rng);
    StationHotspot::derived(station, no2, o3, DataSource::Mock)
}
