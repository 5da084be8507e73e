use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use service_core::error::AppError;

use crate::startup::AppState;

/// Liveness probe. Does not touch the upstream.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "diagnose-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness probe. Verifies the model provider accepts our credentials.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.text_provider.health_check().await.map_err(|e| {
        tracing::warn!(error = %e, "Text provider health check failed");
        AppError::ServiceUnavailable(e.to_string())
    })?;

    Ok(Json(json!({
        "status": "ready",
        "model": state.text_provider.model()
    })))
}
