use crate::services::providers::ProviderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub const INVALID_PROBLEM_MESSAGE: &str = "Feld 'problem' fehlt oder ist ungültig.";
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Interner Fehler bei der Analyse.";

/// Errors surfaced by the diagnosis endpoint.
#[derive(Debug, Error)]
pub enum DiagnoseError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("upstream failure: {0}")]
    UpstreamFailure(#[from] ProviderError),
}

impl DiagnoseError {
    pub fn missing_problem() -> Self {
        DiagnoseError::InvalidInput(INVALID_PROBLEM_MESSAGE)
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            DiagnoseError::InvalidInput(_) => "invalid_input",
            DiagnoseError::UpstreamFailure(_) => "upstream_failure",
        }
    }
}

impl IntoResponse for DiagnoseError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
        }

        let (status, error) = match &self {
            DiagnoseError::InvalidInput(message) => (StatusCode::BAD_REQUEST, *message),
            DiagnoseError::UpstreamFailure(err) => {
                // Full detail for operators only
                tracing::error!(error = %err, kind = err.kind(), "Diagnosis failed upstream");
                (StatusCode::INTERNAL_SERVER_ERROR, UPSTREAM_FAILURE_MESSAGE)
            }
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}
