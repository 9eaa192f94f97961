//! Forecast assembly and CSV export
//!
//! Builds [`ForecastResponse`]s from whichever source the resolver picked:
//! a loaded model, the live Open-Meteo series, or the mock generator.

use std::fmt::Write as _;

use chrono::{DateTime, Duration, Utc};
use rand::RngExt;

use crate::error::AirWatchError;
use crate::ml::{ForecastFeatures, ForecastModel};
use crate::mock;
use crate::models::{
    AirQualitySample, DataSource, ForecastPoint, ForecastResponse, Pollutant, PollutantReading,
    UNIT, WeatherSnapshot, round2,
};

/// Supported forecast horizons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForecastHorizon {
    #[default]
    Day,
    TwoDays,
}

impl ForecastHorizon {
    #[must_use]
    pub fn hours(self) -> u32 {
        match self {
            ForecastHorizon::Day => 24,
            ForecastHorizon::TwoDays => 48,
        }
    }

    /// Parse the raw `hours` query value; absent means 24
    pub fn parse(raw: Option<&str>) -> Result<Self, AirWatchError> {
        let Some(raw) = raw else {
            return Ok(Self::default());
        };
        let hours: u32 = raw.trim().parse().map_err(|_| {
            AirWatchError::validation("hours", format!("'{raw}' is not a number; use 24 or 48"))
        })?;
        Self::try_from(hours)
    }
}

impl TryFrom<u32> for ForecastHorizon {
    type Error = AirWatchError;

    fn try_from(hours: u32) -> Result<Self, Self::Error> {
        match hours {
            24 => Ok(ForecastHorizon::Day),
            48 => Ok(ForecastHorizon::TwoDays),
            other => Err(AirWatchError::validation(
                "hours",
                format!("Hours must be 24 or 48, got {other}"),
            )),
        }
    }
}

fn response(
    pollutant: Pollutant,
    horizon: ForecastHorizon,
    source: DataSource,
    site: Option<String>,
    data: Vec<ForecastPoint>,
) -> ForecastResponse {
    ForecastResponse {
        pollutant,
        unit: UNIT.to_string(),
        forecast_hours: horizon.hours(),
        source,
        site,
        data,
    }
}

/// Run `model` once per forecast hour starting at the hour containing `now`
pub fn model_forecast(
    model: &dyn ForecastModel,
    site: &str,
    horizon: ForecastHorizon,
    now: DateTime<Utc>,
    weather: Option<WeatherSnapshot>,
) -> Result<ForecastResponse, AirWatchError> {
    let pollutant = model.pollutant();
    let start = mock::truncate_to_hour(now);

    let data = (0..horizon.hours())
        .map(|lead| {
            let timestamp = start + Duration::hours(i64::from(lead));
            let features = ForecastFeatures::at(timestamp, lead, weather.clone());
            let prediction = model.predict(&features)?;
            if !prediction.value.is_finite() {
                return Err(AirWatchError::model(format!(
                    "{pollutant} model produced a non-finite value at lead {lead}h"
                )));
            }
            Ok(ForecastPoint {
                timestamp,
                value: round2(pollutant.clamp(prediction.value)),
                confidence: prediction.confidence.clamp(0.0, 1.0),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(response(
        pollutant,
        horizon,
        DataSource::Model,
        Some(site.to_string()),
        data,
    ))
}

/// Forecast from the live hourly series. Returns `None` unless the series
/// covers every hour of the horizon from the current hour onward.
#[must_use]
pub fn live_forecast(
    pollutant: Pollutant,
    horizon: ForecastHorizon,
    samples: &[AirQualitySample],
    now: DateTime<Utc>,
) -> Option<ForecastResponse> {
    let start = mock::truncate_to_hour(now);
    let data: Vec<ForecastPoint> = samples
        .iter()
        .filter(|sample| sample.timestamp >= start)
        .take(horizon.hours() as usize)
        .enumerate()
        .map(|(lead, sample)| {
            Some(ForecastPoint {
                timestamp: sample.timestamp,
                value: round2(pollutant.clamp(sample.value(pollutant)?)),
                confidence: mock::confidence_at(lead as u32),
            })
        })
        .collect::<Option<_>>()?;

    (data.len() == horizon.hours() as usize).then(|| {
        response(pollutant, horizon, DataSource::Live, None, data)
    })
}

/// Synthetic forecast, continuing from `seed` when a current value is known
pub fn mock_forecast<R: RngExt + ?Sized>(
    pollutant: Pollutant,
    horizon: ForecastHorizon,
    now: DateTime<Utc>,
    seed: Option<f64>,
    rng: &mut R,
) -> ForecastResponse {
    let data = mock::forecast_series(pollutant, horizon.hours(), now, seed, rng)
        .iter()
        .map(ForecastPoint::from)
        .collect();
    response(pollutant, horizon, DataSource::Mock, None, data)
}

pub const CSV_HEADER: &str = "timestamp,pollutant,value,confidence";

/// Render a forecast as CSV, values at one decimal place
#[must_use]
pub fn to_csv(forecast: &ForecastResponse) -> String {
    let mut out = String::with_capacity(64 * (forecast.data.len() + 1));
    out.push_str(CSV_HEADER);
    out.push('\n');
    for point in &forecast.data {
        // writing to a String cannot fail
        let _ = writeln!(
            out,
            "{},{},{:.1},{:.3}",
            point.timestamp.to_rfc3339(),
            forecast.pollutant,
            point.value,
            point.confidence
        );
    }
    out
}

/// Read back a CSV produced by [`to_csv`]
pub fn parse_forecast_csv(input: &str) -> Result<Vec<PollutantReading>, AirWatchError> {
    let mut lines = input.lines().filter(|line| !line.trim().is_empty());

    match lines.next() {
        Some(header) if header.trim() == CSV_HEADER => {}
        Some(header) => {
            return Err(AirWatchError::validation(
                "csv",
                format!("unexpected header '{header}'"),
            ));
        }
        None => return Err(AirWatchError::validation("csv", "input is empty")),
    }

    lines
        .enumerate()
        .map(|(index, line)| parse_row(line).map_err(|message| {
            AirWatchError::validation("csv", format!("row {}: {message}", index + 1))
        }))
        .collect()
}

fn parse_row(line: &str) -> Result<PollutantReading, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let [timestamp, pollutant, value, confidence] = fields[..] else {
        return Err(format!("expected 4 fields, got {}", fields.len()));
    };

    let timestamp = DateTime::parse_from_rfc3339(timestamp)
        .map_err(|e| format!("bad timestamp '{timestamp}': {e}"))?
        .with_timezone(&Utc);
    let pollutant: Pollutant = pollutant
        .parse()
        .map_err(|_| format!("unknown pollutant '{pollutant}'"))?;
    let value: f64 = value
        .parse()
        .map_err(|_| format!("bad value '{value}'"))?;
    let confidence = if confidence.is_empty() {
        None
    } else {
        Some(
            confidence
                .parse::<f64>()
                .map_err(|_| format!("bad confidence '{confidence}'"))?,
        )
    };

    Ok(PollutantReading {
        timestamp,
        pollutant,
        value,
        confidence,
    })
}
