use std::str::FromStr;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use chrono::{Days, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::{ApiError, AppState};
use crate::aggregation;
use crate::error::AirWatchError;
use crate::mock;
use crate::models::{AQI_BANDS, AqiBand, HistoricalSeries, Pollutant, SeasonalPattern};
use crate::upstream::Measurement;

const MONTHS: u64 = 36;
const WEEKS: u32 = 12;
const DAYS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(super) enum Granularity {
    #[default]
    Monthly,
    Weekly,
    Daily,
}

impl Granularity {
    /// Days of history fetched for this granularity
    fn lookback_days(self) -> u64 {
        match self {
            Granularity::Monthly => MONTHS * 30,
            Granularity::Weekly => u64::from(WEEKS) * 7,
            Granularity::Daily => u64::from(DAYS),
        }
    }
}

impl FromStr for Granularity {
    type Err = AirWatchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "monthly" => Ok(Granularity::Monthly),
            "weekly" => Ok(Granularity::Weekly),
            "daily" => Ok(Granularity::Daily),
            _ => Err(AirWatchError::validation(
                "granularity",
                format!("'{value}' is not supported; use monthly, weekly or daily"),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct HistoryQuery {
    granularity: Option<String>,
}

pub(super) async fn historical(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistoricalSeries>, ApiError> {
    let Query(query) = query?;
    let granularity = query
        .granularity
        .as_deref()
        .map(str::parse::<Granularity>)
        .transpose()?
        .unwrap_or_default();

    let series = match fetch_series(&state, granularity).await {
        Some(series) => series,
        None => mock_series(granularity),
    };
    Ok(Json(series))
}

/// OpenAQ aggregation, `None` when nothing usable came back
#[instrument(skip(state))]
async fn fetch_series(state: &AppState, granularity: Granularity) -> Option<HistoricalSeries> {
    let to = Utc::now().date_naive();
    let from = to.checked_sub_days(Days::new(granularity.lookback_days()))?;

    let (no2, o3) = futures::join!(
        measurements(state, Pollutant::No2, from, to),
        measurements(state, Pollutant::O3, from, to)
    );
    if no2.is_empty() && o3.is_empty() {
        warn!("No historical measurements from OpenAQ, serving mock data");
        return None;
    }

    let series = match granularity {
        Granularity::Monthly => HistoricalSeries::Monthly(aggregation::combine_monthly(&no2, &o3)),
        Granularity::Weekly => HistoricalSeries::Weekly(aggregation::combine_weekly(&no2, &o3)),
        Granularity::Daily => HistoricalSeries::Daily(aggregation::combine_daily(&no2, &o3)),
    };
    if series.is_empty() {
        warn!("Historical measurements had no valid values, serving mock data");
        return None;
    }
    info!("Serving {granularity:?} history from OpenAQ");
    Some(series)
}

async fn measurements(
    state: &AppState,
    pollutant: Pollutant,
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<Measurement> {
    state
        .history
        .measurements(pollutant, from, to)
        .await
        .unwrap_or_else(|e| {
            warn!("OpenAQ {pollutant} history failed: {e:#}");
            Vec::new()
        })
}

fn mock_series(granularity: Granularity) -> HistoricalSeries {
    let now = Utc::now();
    let mut rng = rand::rng();
    match granularity {
        Granularity::Monthly => HistoricalSeries::Monthly(mock::monthly_history(now, &mut rng)),
        Granularity::Weekly => {
            HistoricalSeries::Weekly(mock::weekly_history(now, WEEKS, &mut rng))
        }
        Granularity::Daily => HistoricalSeries::Daily(mock::daily_history(now, DAYS, &mut rng)),
    }
}

pub(super) async fn seasonal_patterns() -> Json<Vec<SeasonalPattern>> {
    Json(mock::seasonal_patterns())
}

pub(super) async fn aqi_scale() -> Json<&'static [AqiBand]> {
    Json(&AQI_BANDS[..])
}
