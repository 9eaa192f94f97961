//! Pollutant kinds and their concentration ranges

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AirWatchError;

/// Concentration unit used everywhere in the service
pub const UNIT: &str = "µg/m³";

/// Pollutants forecast by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Pollutant {
    #[serde(rename = "NO2")]
    No2,
    #[serde(rename = "O3")]
    O3,
}

impl Pollutant {
    pub const fn all() -> &'static [Pollutant] {
        &[Pollutant::No2, Pollutant::O3]
    }

    /// Lowercase form used in URL paths and manifest keys
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Pollutant::No2 => "no2",
            Pollutant::O3 => "o3",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Pollutant::No2 => "NO2",
            Pollutant::O3 => "O3",
        }
    }

    /// Upper bound of a realistic hourly concentration in µg/m³.
    ///
    /// Also the concentration that maps to AQI 500.
    #[must_use]
    pub fn ceiling(self) -> f64 {
        match self {
            Pollutant::No2 => 400.0,
            Pollutant::O3 => 240.0,
        }
    }

    /// Multiplier converting a ppb reading to µg/m³ at 25 °C
    #[must_use]
    pub fn ppb_to_ugm3(self) -> f64 {
        match self {
            Pollutant::No2 => 1.88,
            Pollutant::O3 => 2.0,
        }
    }

    #[must_use]
    pub fn clamp(self, value: f64) -> f64 {
        value.clamp(0.0, self.ceiling())
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pollutant {
    type Err = AirWatchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "no2" => Ok(Pollutant::No2),
            "o3" => Ok(Pollutant::O3),
            _ => Err(AirWatchError::not_found(format!(
                "Unknown pollutant '{value}'. Supported pollutants: no2, o3."
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pollutant_slug_roundtrip() {
        for pollutant in Pollutant::all() {
            let parsed: Pollutant = pollutant.slug().parse().expect("slug should parse");
            assert_eq!(*pollutant, parsed);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("NO2".parse::<Pollutant>().unwrap(), Pollutant::No2);
        assert_eq!("O3".parse::<Pollutant>().unwrap(), Pollutant::O3);
    }

    #[test]
    fn unknown_pollutant_is_not_found() {
        let err = "pm25".parse::<Pollutant>().unwrap_err();
        assert!(matches!(err, AirWatchError::NotFound { .. }));
        assert!(err.to_string().contains("pm25"));
    }

    #[test]
    fn clamp_respects_floor_and_ceiling() {
        assert_eq!(Pollutant::No2.clamp(-3.0), 0.0);
        assert_eq!(Pollutant::O3.clamp(900.0), 240.0);
        assert_eq!(Pollutant::O3.clamp(55.5), 55.5);
    }

    #[test]
    fn serializes_display_form() {
        assert_eq!(serde_json::to_string(&Pollutant::No2).unwrap(), "\"NO2\"");
    }
}
