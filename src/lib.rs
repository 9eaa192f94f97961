//! AirWatch - air-quality monitoring and forecasting backend
//!
//! This library serves current conditions, pollutant forecasts, station
//! hotspots, historical aggregates and weather insights for one city,
//! combining upstream feeds with optional forecasting models.

pub mod aggregation;
pub mod api;
pub mod config;
pub mod error;
pub mod forecast;
pub mod insights;
pub mod ml;
pub mod mock;
pub mod models;
pub mod resolver;
pub mod telemetry;
pub mod upstream;
pub mod web;

// Re-export core types for public API
pub use api::AppState;
pub use config::AirWatchConfig;
pub use error::{AirWatchError, Unavailability};
pub use ml::{ModelManifest, ModelRegistry};
pub use models::{AqiCategory, DataSource, Pollutant};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, AirWatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
