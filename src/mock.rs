//! Mock data generation
//!
//! Every function here is pure given its inputs and the random source, so
//! each call yields a fresh series rather than continuing a previous one.
//! Values stay inside each pollutant's `[0, ceiling]` range.

use std::f64::consts::PI;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use rand::RngExt;

use crate::models::{
    AirQualitySample, DailyDataPoint, DataSource, HistoricalDataPoint, Pollutant,
    PollutantReading, SeasonalPattern, WeatherSample, WeatherSnapshot, WeeklyDataPoint, round2,
};

/// Shape parameters of a pollutant's synthetic series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesProfile {
    /// Mean level in µg/m³ before seasonal scaling
    pub baseline: f64,
    /// Scale of the diurnal component
    pub amplitude: f64,
    /// Bound of the uniform perturbation
    pub jitter: f64,
}

#[must_use]
pub fn profile(pollutant: Pollutant) -> SeriesProfile {
    match pollutant {
        Pollutant::No2 => SeriesProfile {
            baseline: 85.0,
            amplitude: 35.0,
            jitter: 8.0,
        },
        Pollutant::O3 => SeriesProfile {
            baseline: 55.0,
            amplitude: 60.0,
            jitter: 6.0,
        },
    }
}

/// Seasonal multiplier on the baseline.
///
/// NO2 builds up in winter and washes out in the monsoon; O3 peaks with the
/// pre-monsoon sun.
#[must_use]
pub fn seasonal_factor(pollutant: Pollutant, month: u32) -> f64 {
    match (pollutant, month) {
        (Pollutant::No2, 11 | 12 | 1 | 2) => 1.35,
        (Pollutant::No2, 7..=9) => 0.75,
        (Pollutant::O3, 4..=6) => 1.3,
        (Pollutant::O3, 12 | 1) => 0.8,
        _ => 1.0,
    }
}

/// Daylight proxy for solar radiation, 0 at night and 1 at noon
#[must_use]
pub fn solar_proxy(hour: f64) -> f64 {
    (PI * (hour - 6.0) / 12.0).sin().max(0.0)
}

/// Diurnal component for an hour of day in `[0, 24)`.
///
/// NO2 follows a 12-hour harmonic peaking at the 08:00 and 20:00 traffic
/// windows over a weak nocturnal 24-hour term. O3 follows the solar proxy.
#[must_use]
pub fn diurnal(pollutant: Pollutant, hour: f64) -> f64 {
    match pollutant {
        Pollutant::No2 => {
            0.7 * (2.0 * PI * (hour - 8.0) / 12.0).cos()
                + 0.3 * (2.0 * PI * (hour - 2.0) / 24.0).cos()
        }
        Pollutant::O3 => solar_proxy(hour) - 0.3,
    }
}

/// Noise-free value at `timestamp`
#[must_use]
pub fn expected_value(pollutant: Pollutant, timestamp: DateTime<Utc>) -> f64 {
    let profile = profile(pollutant);
    let hour = f64::from(timestamp.hour()) + f64::from(timestamp.minute()) / 60.0;
    profile.baseline * seasonal_factor(pollutant, timestamp.month())
        + profile.amplitude * diurnal(pollutant, hour)
}

/// Confidence of a forecast point `lead_hours` ahead
#[must_use]
pub fn confidence_at(lead_hours: u32) -> f64 {
    let confidence = (0.95 - 0.005 * f64::from(lead_hours)).max(0.5);
    (confidence * 1000.0).round() / 1000.0
}

#[must_use]
pub fn truncate_to_hour(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    let seconds = timestamp.timestamp();
    DateTime::from_timestamp(seconds - seconds.rem_euclid(3600), 0).unwrap_or(timestamp)
}

/// Generate `hours` hourly readings starting at `start` (truncated to the hour).
///
/// With a `seed`, the series is shifted so its first noise-free value equals
/// the seed, keeping continuity with a known current reading.
pub fn forecast_series<R: RngExt + ?Sized>(
    pollutant: Pollutant,
    hours: u32,
    start: DateTime<Utc>,
    seed: Option<f64>,
    rng: &mut R,
) -> Vec<PollutantReading> {
    let start = truncate_to_hour(start);
    let jitter = profile(pollutant).jitter;
    let offset = seed.map_or(0.0, |seed| seed - expected_value(pollutant, start));

    (0..hours)
        .map(|lead| {
            let timestamp = start + Duration::hours(i64::from(lead));
            let noise = rng.random_range(-jitter..=jitter);
            let value = pollutant.clamp(expected_value(pollutant, timestamp) + offset + noise);
            PollutantReading {
                timestamp,
                pollutant,
                value: round2(value),
                confidence: Some(confidence_at(lead)),
            }
        })
        .collect()
}

/// Previous-hour and current values for the current-conditions card
pub fn current_pair<R: RngExt + ?Sized>(
    pollutant: Pollutant,
    now: DateTime<Utc>,
    rng: &mut R,
) -> (f64, f64) {
    let series = forecast_series(pollutant, 2, now - Duration::hours(1), None, rng);
    (series[0].value, series[1].value)
}

/// NO2 and O3 values for a station without a live reading
pub fn station_values<R: RngExt + ?Sized>(rng: &mut R) -> (f64, f64) {
    (
        round2(rng.random_range(40.0..=200.0)),
        round2(rng.random_range(30.0..=160.0)),
    )
}

#[must_use]
pub fn weather(now: DateTime<Utc>) -> WeatherSnapshot {
    WeatherSnapshot {
        timestamp: now,
        temperature: 25.5,
        humidity: 65.0,
        wind_speed: 12.5,
        wind_direction: 180.0,
        solar_radiation: 450.0,
        pressure: 1013.0,
        cloud_cover: 30.0,
        source: DataSource::Mock,
    }
}

/// Hourly air-quality samples over `[start, start + hours)`
pub fn air_quality_samples<R: RngExt + ?Sized>(
    start: DateTime<Utc>,
    hours: u32,
    rng: &mut R,
) -> Vec<AirQualitySample> {
    let no2 = forecast_series(Pollutant::No2, hours, start, None, rng);
    let o3 = forecast_series(Pollutant::O3, hours, start, None, rng);
    no2.into_iter()
        .zip(o3)
        .map(|(no2, o3)| AirQualitySample {
            timestamp: no2.timestamp,
            no2: Some(no2.value),
            o3: Some(o3.value),
        })
        .collect()
}

/// Hourly weather samples over `[start, start + hours)`
pub fn weather_samples<R: RngExt + ?Sized>(
    start: DateTime<Utc>,
    hours: u32,
    rng: &mut R,
) -> Vec<WeatherSample> {
    let start = truncate_to_hour(start);
    (0..hours)
        .map(|lead| {
            let timestamp = start + Duration::hours(i64::from(lead));
            let hour = f64::from(timestamp.hour());
            let warmth = (PI * (hour - 9.0) / 12.0).sin();
            WeatherSample {
                timestamp,
                temperature: Some(round2(25.0 + 6.0 * warmth + rng.random_range(-0.5..=0.5))),
                humidity: Some(round2(65.0 - 15.0 * warmth + rng.random_range(-2.0..=2.0))),
                wind_speed: Some(round2(
                    (10.0 + 4.0 * warmth + rng.random_range(-1.5..=1.5)).max(0.0),
                )),
                solar_radiation: Some(round2(800.0 * solar_proxy(hour))),
            }
        })
        .collect()
}

fn monthly_ranges(month: u32) -> ((f64, f64), (f64, f64), (f64, f64), (f64, f64)) {
    // (avg_no2, max_no2, avg_o3, max_o3) ranges
    let no2 = if matches!(month, 11 | 12 | 1 | 2) {
        ((100.0, 180.0), (180.0, 250.0))
    } else {
        ((50.0, 100.0), (100.0, 150.0))
    };
    let o3 = if matches!(month, 4..=6) {
        ((80.0, 140.0), (140.0, 200.0))
    } else {
        ((40.0, 80.0), (80.0, 120.0))
    };
    (no2.0, no2.1, o3.0, o3.1)
}

/// Five years of monthly aggregates ending with the current year
pub fn monthly_history<R: RngExt + ?Sized>(
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<HistoricalDataPoint> {
    let current_year = now.year();
    let mut data = Vec::with_capacity(60);
    for year in current_year - 4..=current_year {
        for month in 1..=12 {
            let (avg_no2, max_no2, avg_o3, max_o3) = monthly_ranges(month);
            data.push(HistoricalDataPoint {
                year,
                month,
                avg_no2: round2(rng.random_range(avg_no2.0..=avg_no2.1)),
                avg_o3: round2(rng.random_range(avg_o3.0..=avg_o3.1)),
                max_no2: round2(rng.random_range(max_no2.0..=max_no2.1)),
                max_o3: round2(rng.random_range(max_o3.0..=max_o3.1)),
            });
        }
    }
    data
}

fn day_values<R: RngExt + ?Sized>(date: NaiveDate, rng: &mut R) -> (f64, f64, f64, f64) {
    let (avg_no2, max_no2, avg_o3, max_o3) = monthly_ranges(date.month());
    (
        round2(rng.random_range(avg_no2.0..=avg_no2.1)),
        round2(rng.random_range(avg_o3.0..=avg_o3.1)),
        round2(rng.random_range(max_no2.0..=max_no2.1)),
        round2(rng.random_range(max_o3.0..=max_o3.1)),
    )
}

/// `weeks` consecutive weeks ending with the current week
pub fn weekly_history<R: RngExt + ?Sized>(
    now: DateTime<Utc>,
    weeks: u32,
    rng: &mut R,
) -> Vec<WeeklyDataPoint> {
    let first = now.date_naive() - Duration::weeks(i64::from(weeks));
    (0..weeks)
        .map(|week| {
            let week_start = first + Duration::weeks(i64::from(week));
            let (avg_no2, avg_o3, max_no2, max_o3) = day_values(week_start, rng);
            WeeklyDataPoint {
                week_start: week_start.format("%Y-%m-%d").to_string(),
                week_end: (week_start + Duration::days(6)).format("%Y-%m-%d").to_string(),
                avg_no2,
                avg_o3,
                max_no2,
                max_o3,
            }
        })
        .collect()
}

/// `days` consecutive days ending yesterday
pub fn daily_history<R: RngExt + ?Sized>(
    now: DateTime<Utc>,
    days: u32,
    rng: &mut R,
) -> Vec<DailyDataPoint> {
    let first = now.date_naive() - Duration::days(i64::from(days));
    (0..days)
        .map(|day| {
            let date = first + Duration::days(i64::from(day));
            let (avg_no2, avg_o3, max_no2, max_o3) = day_values(date, rng);
            DailyDataPoint {
                date: date.format("%Y-%m-%d").to_string(),
                avg_no2,
                avg_o3,
                max_no2,
                max_o3,
            }
        })
        .collect()
}

#[must_use]
pub fn seasonal_patterns() -> Vec<SeasonalPattern> {
    let pattern = |season: &str, avg_no2, avg_o3, description: &str| SeasonalPattern {
        season: season.to_string(),
        avg_no2,
        avg_o3,
        description: description.to_string(),
    };

    vec![
        pattern(
            "Winter (Dec-Feb)",
            145.5,
            55.2,
            "Highest NO₂ levels due to low wind speeds, temperature inversion, and increased biomass burning.",
        ),
        pattern(
            "Spring (Mar-May)",
            85.3,
            105.8,
            "Rising O₃ levels with increasing solar radiation. NO₂ decreases as weather improves.",
        ),
        pattern(
            "Summer (Jun-Aug)",
            65.7,
            125.4,
            "Peak O₃ formation due to high temperatures and intense sunlight. Monsoon brings temporary relief.",
        ),
        pattern(
            "Autumn (Sep-Nov)",
            115.2,
            75.6,
            "NO₂ levels rise as stubble burning begins. Cooler temperatures reduce O₃ formation.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::rstest;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 10, 37, 12).unwrap()
    }

    #[rstest]
    #[case(Pollutant::No2, 24)]
    #[case(Pollutant::No2, 48)]
    #[case(Pollutant::O3, 24)]
    #[case(Pollutant::O3, 48)]
    fn series_has_requested_length_and_hourly_steps(
        #[case] pollutant: Pollutant,
        #[case] hours: u32,
    ) {
        let mut rng = StdRng::seed_from_u64(7);
        let series = forecast_series(pollutant, hours, start(), None, &mut rng);

        assert_eq!(series.len(), hours as usize);
        assert_eq!(series[0].timestamp, truncate_to_hour(start()));
        for pair in series.windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, Duration::hours(1));
        }
        assert!(series.iter().all(|r| r.pollutant == pollutant));
    }

    #[rstest]
    #[case(Pollutant::No2)]
    #[case(Pollutant::O3)]
    fn values_stay_in_realistic_range(#[case] pollutant: Pollutant) {
        let mut rng = StdRng::seed_from_u64(42);
        for month in 1..=12 {
            let month_start = Utc.with_ymd_and_hms(2024, month, 1, 0, 0, 0).unwrap();
            for reading in forecast_series(pollutant, 48, month_start, None, &mut rng) {
                assert!(reading.value >= 0.0);
                assert!(reading.value <= pollutant.ceiling());
                let confidence = reading.confidence.unwrap();
                assert!((0.0..=1.0).contains(&confidence));
            }
        }
    }

    #[test]
    fn extreme_seed_is_clamped() {
        let mut rng = StdRng::seed_from_u64(1);
        let high = forecast_series(Pollutant::O3, 24, start(), Some(10_000.0), &mut rng);
        assert!(high.iter().all(|r| r.value <= Pollutant::O3.ceiling()));

        let low = forecast_series(Pollutant::No2, 24, start(), Some(-500.0), &mut rng);
        assert!(low.iter().all(|r| r.value >= 0.0));
    }

    #[test]
    fn seed_anchors_first_point() {
        let mut rng = StdRng::seed_from_u64(3);
        let series = forecast_series(Pollutant::No2, 24, start(), Some(120.0), &mut rng);
        let jitter = profile(Pollutant::No2).jitter;
        assert!((series[0].value - 120.0).abs() <= jitter + 0.01);
    }

    #[test]
    fn no2_peaks_in_traffic_windows() {
        let morning = diurnal(Pollutant::No2, 8.0);
        let afternoon = diurnal(Pollutant::No2, 14.0);
        let evening = diurnal(Pollutant::No2, 20.0);
        assert!(morning > afternoon);
        assert!(evening > afternoon);
    }

    #[test]
    fn o3_peaks_midday() {
        assert!(diurnal(Pollutant::O3, 12.0) > diurnal(Pollutant::O3, 8.0));
        assert!(diurnal(Pollutant::O3, 12.0) > diurnal(Pollutant::O3, 17.0));
        assert_eq!(solar_proxy(2.0), 0.0);
        assert!((solar_proxy(12.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn each_call_is_a_fresh_series() {
        let mut rng = StdRng::seed_from_u64(9);
        let first = forecast_series(Pollutant::O3, 24, start(), None, &mut rng);
        let second = forecast_series(Pollutant::O3, 24, start(), None, &mut rng);
        assert_eq!(first[0].timestamp, second[0].timestamp);
        assert_eq!(first.len(), second.len());
    }

    #[test]
    fn confidence_decays_with_floor() {
        assert_eq!(confidence_at(0), 0.95);
        assert_eq!(confidence_at(10), 0.9);
        assert_eq!(confidence_at(500), 0.5);
    }

    #[test]
    fn monthly_history_covers_five_years() {
        let mut rng = StdRng::seed_from_u64(5);
        let history = monthly_history(start(), &mut rng);
        assert_eq!(history.len(), 60);
        assert_eq!(history[0].year, 2021);
        let january = &history[0];
        assert!(january.avg_no2 >= 100.0 && january.max_no2 >= 180.0);
    }

    #[test]
    fn weekly_and_daily_history_lengths() {
        let mut rng = StdRng::seed_from_u64(5);
        let weekly = weekly_history(start(), 12, &mut rng);
        assert_eq!(weekly.len(), 12);
        assert_eq!(weekly[0].week_start, "2024-10-23");
        assert_eq!(weekly[0].week_end, "2024-10-29");

        let daily = daily_history(start(), 30, &mut rng);
        assert_eq!(daily.len(), 30);
        assert_eq!(daily[29].date, "2025-01-14");
    }

    #[test]
    fn seasonal_table_has_four_seasons() {
        let patterns = seasonal_patterns();
        assert_eq!(patterns.len(), 4);
        assert!(patterns[0].season.starts_with("Winter"));
    }
}
