//! AQI severity bands
//!
//! The band table is shared by hotspots, alerts, current readings and the
//! legend endpoint.

use serde::{Deserialize, Serialize};

use super::Pollutant;

/// Top of the AQI scale
pub const AQI_MAX: u16 = 500;

/// Severity category of an AQI value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiCategory {
    Good,
    Satisfactory,
    Moderate,
    Poor,
    VeryPoor,
    Severe,
}

/// One row of the band table, bounds inclusive
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AqiBand {
    pub category: AqiCategory,
    pub label: &'static str,
    pub min: u16,
    pub max: u16,
}

pub const AQI_BANDS: [AqiBand; 6] = [
    AqiBand { category: AqiCategory::Good, label: "Good", min: 0, max: 50 },
    AqiBand { category: AqiCategory::Satisfactory, label: "Satisfactory", min: 51, max: 100 },
    AqiBand { category: AqiCategory::Moderate, label: "Moderate", min: 101, max: 200 },
    AqiBand { category: AqiCategory::Poor, label: "Poor", min: 201, max: 300 },
    AqiBand { category: AqiCategory::VeryPoor, label: "Very Poor", min: 301, max: 400 },
    AqiBand { category: AqiCategory::Severe, label: "Severe", min: 401, max: AQI_MAX },
];

impl AqiCategory {
    /// Classify an AQI value; anything above the scale is severe
    #[must_use]
    pub fn from_aqi(aqi: u16) -> Self {
        AQI_BANDS
            .iter()
            .find(|band| aqi <= band.max)
            .map_or(AqiCategory::Severe, |band| band.category)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        self.band().label
    }

    #[must_use]
    pub fn band(self) -> &'static AqiBand {
        // AQI_BANDS is ordered by category
        &AQI_BANDS[self as usize]
    }
}

/// Derive an AQI value from NO2 and O3 concentrations in µg/m³.
///
/// Each pollutant's ceiling maps linearly onto AQI 500; the worse of the two
/// wins.
#[must_use]
pub fn aqi_from_concentrations(no2: f64, o3: f64) -> u16 {
    let no2_aqi = no2.max(0.0) / Pollutant::No2.ceiling() * f64::from(AQI_MAX);
    let o3_aqi = o3.max(0.0) / Pollutant::O3.ceiling() * f64::from(AQI_MAX);
    let aqi = no2_aqi.max(o3_aqi).min(f64::from(AQI_MAX));
    aqi as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, AqiCategory::Good)]
    #[case(50, AqiCategory::Good)]
    #[case(51, AqiCategory::Satisfactory)]
    #[case(75, AqiCategory::Satisfactory)]
    #[case(100, AqiCategory::Satisfactory)]
    #[case(101, AqiCategory::Moderate)]
    #[case(200, AqiCategory::Moderate)]
    #[case(201, AqiCategory::Poor)]
    #[case(300, AqiCategory::Poor)]
    #[case(301, AqiCategory::VeryPoor)]
    #[case(400, AqiCategory::VeryPoor)]
    #[case(401, AqiCategory::Severe)]
    #[case(450, AqiCategory::Severe)]
    #[case(500, AqiCategory::Severe)]
    #[case(731, AqiCategory::Severe)]
    fn classifies_band_boundaries(#[case] aqi: u16, #[case] expected: AqiCategory) {
        assert_eq!(AqiCategory::from_aqi(aqi), expected);
    }

    #[test]
    fn bands_partition_the_scale_without_gaps() {
        assert_eq!(AQI_BANDS[0].min, 0);
        assert_eq!(AQI_BANDS[AQI_BANDS.len() - 1].max, AQI_MAX);
        for pair in AQI_BANDS.windows(2) {
            assert!(pair[0].min <= pair[0].max);
            assert_eq!(pair[0].max + 1, pair[1].min);
            assert!(pair[0].category < pair[1].category);
        }
    }

    #[test]
    fn band_lookup_matches_category() {
        for band in &AQI_BANDS {
            assert_eq!(band.category.band().label, band.label);
        }
        assert_eq!(AqiCategory::VeryPoor.label(), "Very Poor");
    }

    #[test]
    fn aqi_uses_worse_pollutant() {
        assert_eq!(aqi_from_concentrations(80.0, 24.0), 100);
        assert_eq!(aqi_from_concentrations(40.0, 120.0), 250);
        assert_eq!(aqi_from_concentrations(0.0, 0.0), 0);
    }

    #[test]
    fn aqi_is_capped_at_scale_top() {
        assert_eq!(aqi_from_concentrations(1200.0, 10.0), AQI_MAX);
    }

    #[test]
    fn category_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&AqiCategory::VeryPoor).unwrap(),
            "\"very_poor\""
        );
    }
}
