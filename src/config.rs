//! Configuration management for the `AirWatch` service
//!
//! Handles loading configuration from a TOML file and environment variables,
//! and provides validation for all configuration settings. Configuration is
//! read once at startup; changes require a restart.

use crate::AirWatchError;
use crate::models::Station;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure for the `AirWatch` service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirWatchConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Monitored city and its stations
    #[serde(default)]
    pub city: CityConfig,
    /// Third-party API settings
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Forecasting model settings
    #[serde(default)]
    pub models: ModelsConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound on handler time in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u32,
    /// PEM certificate, enables TLS together with `tls_key_path`
    pub tls_cert_path: Option<String>,
    pub tls_key_path: Option<String>,
    /// Comma-separated allowed origins, `*` for any
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
}

/// Monitored city
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityConfig {
    #[serde(default = "default_city_name")]
    pub name: String,
    /// City slug in the WAQI feed
    #[serde(default = "default_city_feed")]
    pub feed: String,
    #[serde(default = "default_city_latitude")]
    pub latitude: f64,
    #[serde(default = "default_city_longitude")]
    pub longitude: f64,
    /// Country code used for OpenAQ location lookups
    #[serde(default = "default_city_country")]
    pub country: String,
    #[serde(default = "default_stations")]
    pub stations: Vec<Station>,
}

/// Third-party API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// WAQI token, falls back to `WAQI_API_TOKEN`
    pub waqi_token: Option<String>,
    #[serde(default = "default_waqi_base_url")]
    pub waqi_base_url: String,
    #[serde(default = "default_open_meteo_base_url")]
    pub open_meteo_base_url: String,
    #[serde(default = "default_open_meteo_air_quality_url")]
    pub open_meteo_air_quality_url: String,
    /// OpenAQ key, falls back to `OPENAQ_API_KEY`
    pub openaq_api_key: Option<String>,
    #[serde(default = "default_openaq_base_url")]
    pub openaq_base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_upstream_timeout")]
    pub timeout_seconds: u32,
    /// Per-station timeout for hotspot lookups in seconds
    #[serde(default = "default_station_timeout")]
    pub station_timeout_seconds: u32,
}

/// Forecasting model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Path to the JSON model manifest
    #[serde(default = "default_manifest_path")]
    pub manifest_path: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8001
}

fn default_request_timeout() -> u32 {
    30
}

fn default_cors_origins() -> String {
    "*".to_string()
}

fn default_city_name() -> String {
    "Delhi, India".to_string()
}

fn default_city_feed() -> String {
    "delhi".to_string()
}

fn default_city_latitude() -> f64 {
    28.6139
}

fn default_city_longitude() -> f64 {
    77.2090
}

fn default_city_country() -> String {
    "IN".to_string()
}

fn default_stations() -> Vec<Station> {
    vec![
        Station::new("Anand Vihar", 28.6469, 77.3162, "anand-vihar"),
        Station::new("ITO", 28.6289, 77.2421, "ito"),
        Station::new("Rohini", 28.7495, 77.0736, "rohini"),
        Station::new("RK Puram", 28.5631, 77.1824, "r-k-puram"),
        Station::new("Dwarka", 28.5921, 77.0460, "dwarka-sector-8"),
        Station::new("Punjabi Bagh", 28.6692, 77.1317, "punjabi-bagh"),
        Station::new("Shahdara", 28.6850, 77.2867, "shahdara"),
        Station::new("Nehru Nagar", 28.5494, 77.2501, "nehru-nagar"),
        Station::new("Mandir Marg", 28.6358, 77.2011, "mandir-marg"),
        Station::new("Pusa", 28.6404, 77.1460, "pusa"),
    ]
}

fn default_waqi_base_url() -> String {
    "https://api.waqi.info".to_string()
}

fn default_open_meteo_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_open_meteo_air_quality_url() -> String {
    "https://air-quality-api.open-meteo.com/v1".to_string()
}

fn default_openaq_base_url() -> String {
    "https://api.openaq.org/v3".to_string()
}

fn default_upstream_timeout() -> u32 {
    10
}

fn default_station_timeout() -> u32 {
    5
}

fn default_manifest_path() -> String {
    "model_config.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            tls_cert_path: None,
            tls_key_path: None,
            cors_origins: default_cors_origins(),
        }
    }
}

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            name: default_city_name(),
            feed: default_city_feed(),
            latitude: default_city_latitude(),
            longitude: default_city_longitude(),
            country: default_city_country(),
            stations: default_stations(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            waqi_token: None,
            waqi_base_url: default_waqi_base_url(),
            open_meteo_base_url: default_open_meteo_base_url(),
            open_meteo_air_quality_url: default_open_meteo_air_quality_url(),
            openaq_api_key: None,
            openaq_base_url: default_openaq_base_url(),
            timeout_seconds: default_upstream_timeout(),
            station_timeout_seconds: default_station_timeout(),
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            manifest_path: default_manifest_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for AirWatchConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            city: CityConfig::default(),
            upstream: UpstreamConfig::default(),
            models: ModelsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Allowed CORS origins; empty means any origin
    #[must_use]
    pub fn cors_origins(&self) -> Vec<&str> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty() && *origin != "*")
            .collect()
    }
}

impl UpstreamConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }

    #[must_use]
    pub fn station_timeout(&self) -> Duration {
        Duration::from_secs(self.station_timeout_seconds.into())
    }
}

impl AirWatchConfig {
    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| PathBuf::from("airwatch.toml"));

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. AIRWATCH__SERVER__PORT=9000
        builder = builder.add_source(
            Environment::with_prefix("AIRWATCH")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: AirWatchConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.upstream.waqi_token.is_none() {
            self.upstream.waqi_token = std::env::var("WAQI_API_TOKEN").ok();
        }
        if self.upstream.openaq_api_key.is_none() {
            self.upstream.openaq_api_key = std::env::var("OPENAQ_API_KEY").ok();
        }
        if self.upstream.timeout_seconds == 0 {
            self.upstream.timeout_seconds = default_upstream_timeout();
        }
        if self.upstream.station_timeout_seconds == 0 {
            self.upstream.station_timeout_seconds = default_station_timeout();
        }
        if self.server.request_timeout_seconds == 0 {
            self.server.request_timeout_seconds = default_request_timeout();
        }
        if self.city.stations.is_empty() {
            self.city.stations = default_stations();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.validate_tls()?;
        Ok(())
    }

    /// Resolve the manifest path relative to the working directory
    #[must_use]
    pub fn manifest_path(&self) -> &Path {
        Path::new(&self.models.manifest_path)
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AirWatchError::config("Server port cannot be 0").into());
        }

        if self.upstream.timeout_seconds > 60 {
            return Err(
                AirWatchError::config("Upstream API timeout cannot exceed 60 seconds").into(),
            );
        }

        if self.upstream.station_timeout_seconds > self.upstream.timeout_seconds {
            return Err(AirWatchError::config(
                "Station timeout cannot exceed the upstream API timeout",
            )
            .into());
        }

        if self.server.request_timeout_seconds > 300 {
            return Err(
                AirWatchError::config("Request timeout cannot exceed 300 seconds").into(),
            );
        }

        if !(-90.0..=90.0).contains(&self.city.latitude)
            || !(-180.0..=180.0).contains(&self.city.longitude)
        {
            return Err(AirWatchError::config("City coordinates are out of range").into());
        }

        for station in &self.city.stations {
            if !(-90.0..=90.0).contains(&station.latitude)
                || !(-180.0..=180.0).contains(&station.longitude)
            {
                return Err(AirWatchError::config(format!(
                    "Coordinates of station '{}' are out of range",
                    station.name
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(AirWatchError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(AirWatchError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("WAQI", &self.upstream.waqi_base_url),
            ("Open-Meteo", &self.upstream.open_meteo_base_url),
            ("Open-Meteo air quality", &self.upstream.open_meteo_air_quality_url),
            ("OpenAQ", &self.upstream.openaq_base_url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AirWatchError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if self.city.feed.is_empty() {
            return Err(AirWatchError::config("City feed cannot be empty").into());
        }

        Ok(())
    }

    fn validate_tls(&self) -> Result<()> {
        match (&self.server.tls_cert_path, &self.server.tls_key_path) {
            (Some(_), None) | (None, Some(_)) => Err(AirWatchError::config(
                "TLS requires both tls_cert_path and tls_key_path",
            )
            .into()),
            _ => Ok(()),
        }
    }
}
