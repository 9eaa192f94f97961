//! Roll-ups of raw measurements into daily, weekly and monthly statistics

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{DailyDataPoint, HistoricalDataPoint, WeeklyDataPoint, round2};
use crate::upstream::Measurement;

/// Mean and maximum over a period
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PeriodStats {
    pub avg: f64,
    pub max: f64,
    pub count: usize,
}

impl PeriodStats {
    fn from_values(values: &[f64], max: f64) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        Some(Self {
            avg: values.iter().sum::<f64>() / values.len() as f64,
            max,
            count: values.len(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeekStats {
    pub week_start: NaiveDate,
    pub stats: PeriodStats,
}

impl WeekStats {
    #[must_use]
    pub fn week_end(&self) -> NaiveDate {
        self.week_start + Duration::days(6)
    }
}

/// Per-day statistics; non-positive values are treated as sensor noise
#[must_use]
pub fn daily(measurements: &[Measurement]) -> BTreeMap<NaiveDate, PeriodStats> {
    let mut buckets: BTreeMap<NaiveDate, (Vec<f64>, f64)> = BTreeMap::new();
    for m in measurements.iter().filter(|m| m.value > 0.0) {
        let (values, max) = buckets.entry(m.timestamp.date_naive()).or_default();
        values.push(m.value);
        *max = max.max(m.value);
    }

    buckets
        .into_iter()
        .filter_map(|(date, (values, max))| {
            PeriodStats::from_values(&values, max).map(|stats| (date, stats))
        })
        .collect()
}

/// Consecutive 7-day windows. Each window starts at the first date with data
/// that falls outside the previous window, so gaps shift later windows.
#[must_use]
pub fn weekly(daily: &BTreeMap<NaiveDate, PeriodStats>) -> Vec<WeekStats> {
    let mut weeks = Vec::new();
    let mut current: Option<(NaiveDate, Vec<f64>, f64)> = None;

    for (date, stats) in daily {
        if let Some((start, values, max)) = current.take() {
            if (*date - start).num_days() >= 7 {
                weeks.extend(
                    PeriodStats::from_values(&values, max)
                        .map(|stats| WeekStats { week_start: start, stats }),
                );
            } else {
                current = Some((start, values, max));
            }
        }

        let (_, values, max) = current.get_or_insert_with(|| (*date, Vec::new(), 0.0));
        values.push(stats.avg);
        *max = max.max(stats.max);
    }

    if let Some((start, values, max)) = current {
        weeks.extend(
            PeriodStats::from_values(&values, max)
                .map(|stats| WeekStats { week_start: start, stats }),
        );
    }
    weeks
}

/// Calendar-month statistics over daily averages, keyed by `(year, month)`
#[must_use]
pub fn monthly(daily: &BTreeMap<NaiveDate, PeriodStats>) -> BTreeMap<(i32, u32), PeriodStats> {
    let mut buckets: BTreeMap<(i32, u32), (Vec<f64>, f64)> = BTreeMap::new();
    for (date, stats) in daily {
        let (values, max) = buckets.entry((date.year(), date.month())).or_default();
        values.push(stats.avg);
        *max = max.max(stats.max);
    }

    buckets
        .into_iter()
        .filter_map(|(key, (values, max))| {
            PeriodStats::from_values(&values, max).map(|stats| (key, stats))
        })
        .collect()
}

fn or_zero<K: Ord>(map: &BTreeMap<K, PeriodStats>, key: &K) -> PeriodStats {
    map.get(key).copied().unwrap_or_default()
}

/// Merge NO2 and O3 measurements into monthly points; a pollutant without
/// data for a month reports zeros
#[must_use]
pub fn combine_monthly(no2: &[Measurement], o3: &[Measurement]) -> Vec<HistoricalDataPoint> {
    let no2 = monthly(&daily(no2));
    let o3 = monthly(&daily(o3));

    let mut keys: Vec<(i32, u32)> = no2.keys().chain(o3.keys()).copied().collect();
    keys.sort_unstable();
    keys.dedup();

    keys.into_iter()
        .map(|key| {
            let (n, o) = (or_zero(&no2, &key), or_zero(&o3, &key));
            HistoricalDataPoint {
                year: key.0,
                month: key.1,
                avg_no2: round2(n.avg),
                avg_o3: round2(o.avg),
                max_no2: round2(n.max),
                max_o3: round2(o.max),
            }
        })
        .collect()
}

/// Weekly points follow the NO2 windows; O3 is matched on the same start date
#[must_use]
pub fn combine_weekly(no2: &[Measurement], o3: &[Measurement]) -> Vec<WeeklyDataPoint> {
    let o3_weeks: BTreeMap<NaiveDate, PeriodStats> = weekly(&daily(o3))
        .into_iter()
        .map(|week| (week.week_start, week.stats))
        .collect();

    weekly(&daily(no2))
        .into_iter()
        .map(|week| {
            let o = or_zero(&o3_weeks, &week.week_start);
            WeeklyDataPoint {
                week_start: week.week_start.format("%Y-%m-%d").to_string(),
                week_end: week.week_end().format("%Y-%m-%d").to_string(),
                avg_no2: round2(week.stats.avg),
                avg_o3: round2(o.avg),
                max_no2: round2(week.stats.max),
                max_o3: round2(o.max),
            }
        })
        .collect()
}

#[must_use]
pub fn combine_daily(no2: &[Measurement], o3: &[Measurement]) -> Vec<DailyDataPoint> {
    let no2 = daily(no2);
    let o3 = daily(o3);

    let mut dates: Vec<NaiveDate> = no2.keys().chain(o3.keys()).copied().collect();
    dates.sort_unstable();
    dates.dedup();

    dates
        .into_iter()
        .map(|date| {
            let (n, o) = (or_zero(&no2, &date), or_zero(&o3, &date));
            DailyDataPoint {
                date: date.format("%Y-%m-%d").to_string(),
                avg_no2: round2(n.avg),
                avg_o3: round2(o.avg),
                max_no2: round2(n.max),
                max_o3: round2(o.max),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn m(day: u32, hour: u32, value: f64) -> Measurement {
        Measurement {
            timestamp: Utc.with_ymd_and_hms(2025, 1, day, hour, 0, 0).unwrap(),
            value,
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    #[test]
    fn daily_ignores_non_positive_values() {
        let stats = daily(&[m(1, 0, 10.0), m(1, 1, 30.0), m(1, 2, 0.0), m(1, 3, -5.0)]);
        let day = stats[&date(1)];
        assert_eq!(day.avg, 20.0);
        assert_eq!(day.max, 30.0);
        assert_eq!(day.count, 2);
    }

    #[test]
    fn day_with_only_invalid_values_is_dropped() {
        assert!(daily(&[m(2, 0, 0.0), m(2, 5, -1.0)]).is_empty());
    }

    #[test]
    fn weekly_windows_anchor_at_first_date() {
        // days 1..=9 then 20
        let mut measurements: Vec<Measurement> = (1..=9).map(|d| m(d, 12, f64::from(d))).collect();
        measurements.push(m(20, 12, 100.0));

        let weeks = weekly(&daily(&measurements));
        assert_eq!(weeks.len(), 3);

        assert_eq!(weeks[0].week_start, date(1));
        assert_eq!(weeks[0].week_end(), date(7));
        assert_eq!(weeks[0].stats.count, 7);
        assert_eq!(weeks[0].stats.avg, 4.0);
        assert_eq!(weeks[0].stats.max, 7.0);

        assert_eq!(weeks[1].week_start, date(8));
        assert_eq!(weeks[1].stats.count, 2);

        // gap moves the anchor to the next date with data
        assert_eq!(weeks[2].week_start, date(20));
        assert_eq!(weeks[2].week_end(), date(26));
    }

    #[test]
    fn monthly_averages_daily_means() {
        let measurements = vec![
            m(1, 0, 10.0),
            m(1, 1, 20.0), // daily avg 15
            m(2, 0, 45.0), // daily avg 45
            Measurement {
                timestamp: Utc.with_ymd_and_hms(2025, 2, 3, 0, 0, 0).unwrap(),
                value: 8.0,
            },
        ];
        let months = monthly(&daily(&measurements));
        assert_eq!(months[&(2025, 1)].avg, 30.0);
        assert_eq!(months[&(2025, 1)].max, 45.0);
        assert_eq!(months[&(2025, 2)].count, 1);
    }

    #[test]
    fn combined_series_fill_missing_pollutant_with_zero() {
        let no2 = vec![m(3, 0, 50.123)];
        let o3 = vec![m(4, 0, 20.0)];

        let days = combine_daily(&no2, &o3);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, "2025-01-03");
        assert_eq!(days[0].avg_no2, 50.12);
        assert_eq!(days[0].avg_o3, 0.0);
        assert_eq!(days[1].avg_o3, 20.0);

        let months = combine_monthly(&no2, &o3);
        assert_eq!(months.len(), 1);
        assert_eq!((months[0].year, months[0].month), (2025, 1));

        // o3 window starts on a different date so it does not match
        let weeks = combine_weekly(&no2, &o3);
        assert_eq!(weeks.len(), 1);
        assert_eq!(weeks[0].week_start, "2025-01-03");
        assert_eq!(weeks[0].avg_o3, 0.0);
    }

    #[test]
    fn empty_input_gives_empty_series() {
        assert!(combine_monthly(&[], &[]).is_empty());
        assert!(combine_weekly(&[], &[]).is_empty());
        assert!(combine_daily(&[], &[]).is_empty());
    }
}
