use axum::{Json, extract::State};

use super::AppState;
use crate::ml::ModelStatus;

pub(super) async fn models_status(State(state): State<AppState>) -> Json<ModelStatus> {
    Json(state.registry.status())
}
