//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub text_service_reachable: bool,
    pub loaded_models: Vec<String>,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let text_service_reachable = state.engine.probe_text_service().await.is_ok();
    let loaded_models = state
        .engine
        .registry()
        .loaded_kinds()
        .into_iter()
        .map(|kind| kind.to_string())
        .collect();

    Json(HealthResponse {
        status: "ok",
        text_service_reachable,
        loaded_models,
    })
}
