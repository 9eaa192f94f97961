//! Error types and handling for the `AirWatch` service

use thiserror::Error;

use crate::models::Pollutant;

/// Why a model-gated endpoint cannot be served
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unavailability {
    /// Models are enabled but none loaded at startup
    NoModelsLoaded,
    /// Models are enabled but this pollutant/site combination did not load
    ModelNotLoaded { pollutant: Pollutant, site: String },
    /// Hotspots need at least one loaded model per pollutant
    IncompleteModelSet,
}

impl std::fmt::Display for Unavailability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unavailability::NoModelsLoaded => f.write_str("no forecasting models are loaded"),
            Unavailability::ModelNotLoaded { pollutant, site } => {
                write!(f, "{pollutant} model for site '{site}' is not loaded")
            }
            Unavailability::IncompleteModelSet => {
                f.write_str("models are not loaded for every pollutant")
            }
        }
    }
}

/// Main error type for the `AirWatch` service
#[derive(Error, Debug)]
pub enum AirWatchError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Request parameter validation errors
    #[error("Invalid parameter '{parameter}': {message}")]
    Validation { parameter: String, message: String },

    /// Unknown resource, e.g. an unsupported pollutant in the path
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Forecasting models cannot serve this request
    #[error("Models unavailable: {reason}")]
    ModelsUnavailable { reason: Unavailability },

    /// Model manifest or artifact errors
    #[error("Model error: {message}")]
    Model { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl AirWatchError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error for the named parameter
    pub fn validation<P: Into<String>, S: Into<String>>(parameter: P, message: S) -> Self {
        Self::Validation {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn unavailable(reason: Unavailability) -> Self {
        Self::ModelsUnavailable { reason }
    }

    pub fn model<S: Into<String>>(message: S) -> Self {
        Self::Model {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            AirWatchError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            AirWatchError::Validation { parameter, message } => {
                format!("Invalid value for parameter '{parameter}': {message}")
            }
            AirWatchError::NotFound { message } => message.clone(),
            AirWatchError::ModelsUnavailable { .. } => {
                "We will be back soon, our engineers are working on it".to_string()
            }
            AirWatchError::Model { .. } => "Forecasting model error.".to_string(),
            AirWatchError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = AirWatchError::config("missing manifest");
        assert!(matches!(config_err, AirWatchError::Config { .. }));

        let model_err = AirWatchError::model("non-finite prediction");
        assert!(matches!(model_err, AirWatchError::Model { .. }));

        let validation_err = AirWatchError::validation("hours", "must be 24 or 48");
        assert!(matches!(validation_err, AirWatchError::Validation { .. }));
    }

    #[test]
    fn test_user_messages() {
        let validation_err = AirWatchError::validation("hours", "got 12");
        let message = validation_err.user_message();
        assert!(message.contains("hours"));
        assert!(message.contains("got 12"));

        let unavailable = AirWatchError::unavailable(Unavailability::NoModelsLoaded);
        assert!(unavailable.user_message().contains("back soon"));
    }

    #[test]
    fn test_unavailability_display_names_site() {
        let reason = Unavailability::ModelNotLoaded {
            pollutant: Pollutant::O3,
            site: "site2".to_string(),
        };
        assert_eq!(reason.to_string(), "O3 model for site 'site2' is not loaded");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AirWatchError = io_err.into();
        assert!(matches!(err, AirWatchError::Io { .. }));
    }
}
