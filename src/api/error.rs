use axum::{
    Json,
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{error, warn};

use crate::error::AirWatchError;

/// Handler error rendered as `{"detail": {"status": ..., "message": ...}}`
#[derive(Debug)]
pub struct ApiError(pub AirWatchError);

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    status: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl From<AirWatchError> for ApiError {
    fn from(err: AirWatchError) -> Self {
        Self(err)
    }
}

/// Malformed query strings get the same envelope as our own validation
impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(AirWatchError::validation("query", rejection.body_text()))
    }
}

impl ApiError {
    fn status(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            AirWatchError::Validation { .. } => (StatusCode::BAD_REQUEST, "invalid_parameter"),
            AirWatchError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            AirWatchError::ModelsUnavailable { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "models_unavailable")
            }
            AirWatchError::Config { .. } | AirWatchError::Model { .. } | AirWatchError::Io { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, label) = self.status();
        if status.is_server_error() {
            if status == StatusCode::SERVICE_UNAVAILABLE {
                warn!("Request refused: {}", self.0);
            } else {
                error!("Request failed: {}", self.0);
            }
        }

        let reason = match &self.0 {
            AirWatchError::ModelsUnavailable { reason } => Some(reason.to_string()),
            _ => None,
        };
        let body = ErrorBody {
            detail: ErrorDetail {
                status: label,
                message: self.0.user_message(),
                reason,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use serde_json::Value;

    use super::*;
    use crate::error::Unavailability;

    async fn render(err: AirWatchError) -> (StatusCode, Value) {
        let response = ApiError::from(err).into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn unavailable_maps_to_503_envelope() {
        let (status, body) = render(AirWatchError::unavailable(Unavailability::NoModelsLoaded)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["detail"]["status"], "models_unavailable");
        assert_eq!(
            body["detail"]["message"],
            "We will be back soon, our engineers are working on it"
        );
        assert_eq!(body["detail"]["reason"], "no forecasting models are loaded");
    }

    #[tokio::test]
    async fn validation_names_parameter() {
        let (status, body) = render(AirWatchError::validation("granularity", "use monthly")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"]["status"], "invalid_parameter");
        assert!(body["detail"]["message"].as_str().unwrap().contains("granularity"));
        assert!(body["detail"].get("reason").is_none());
    }

    #[tokio::test]
    async fn internal_errors_are_500() {
        let (status, body) = render(AirWatchError::model("prediction was NaN")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"]["status"], "internal_error");
    }
}
