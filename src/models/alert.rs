//! Health alerts derived from pollutant levels

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Danger,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub recommendations: Vec<String>,
}

/// NO2 level in µg/m³ above which a danger alert is raised
pub const NO2_DANGER_LEVEL: f64 = 150.0;
/// NO2 level in µg/m³ above which a warning is raised
pub const NO2_WARNING_LEVEL: f64 = 100.0;

impl Alert {
    /// Build the alert matching the current NO2 level
    #[must_use]
    pub fn for_no2_level(no2: f64, now: DateTime<Utc>) -> Self {
        let (severity, title, message, recommendations) =
            if no2 > NO2_DANGER_LEVEL {
                (
                    AlertSeverity::Danger,
                    "High NO₂ Levels Detected".to_string(),
                    format!("Current NO₂ levels at {no2:.1} µg/m³ exceed safe limits."),
                    vec![
                        "Avoid outdoor activities during peak hours",
                        "Use N95 masks when going outside",
                        "Keep windows closed",
                        "Use air purifiers indoors",
                    ],
                )
            } else if no2 > NO2_WARNING_LEVEL {
                (
                    AlertSeverity::Warning,
                    "Moderate Air Quality".to_string(),
                    "Air quality is moderate. Sensitive groups should take precautions."
                        .to_string(),
                    vec![
                        "Limit prolonged outdoor exertion",
                        "Children and elderly should stay indoors",
                        "Monitor air quality updates regularly",
                    ],
                )
            } else {
                (
                    AlertSeverity::Info,
                    "Good Air Quality".to_string(),
                    "Air quality is satisfactory. Enjoy outdoor activities!".to_string(),
                    vec![
                        "Great time for outdoor exercise",
                        "Open windows for fresh air",
                        "Take walks in parks",
                    ],
                )
            };

        Self {
            id: Uuid::new_v4(),
            severity,
            title,
            message,
            timestamp: now,
            recommendations: recommendations.into_iter().map(str::to_string).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(180.0, AlertSeverity::Danger)]
    #[case(150.0, AlertSeverity::Warning)]
    #[case(120.0, AlertSeverity::Warning)]
    #[case(100.0, AlertSeverity::Info)]
    #[case(20.0, AlertSeverity::Info)]
    fn severity_thresholds(#[case] no2: f64, #[case] expected: AlertSeverity) {
        assert_eq!(Alert::for_no2_level(no2, Utc::now()).severity, expected);
    }

    #[test]
    fn danger_message_includes_level() {
        let alert = Alert::for_no2_level(173.26, Utc::now());
        assert!(alert.message.contains("173.3"));
        assert_eq!(alert.recommendations.len(), 4);
    }
}
