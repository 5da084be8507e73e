use axum::{body::Bytes, extract::State, Json};
use serde_json::Value;
use std::time::Instant;

use crate::error::DiagnoseError;
use crate::models::{DiagnosisRequest, DiagnosisResponse};
use crate::services::metrics;
use crate::startup::AppState;

/// `POST /api/ki-diagnose`
///
/// The body is read raw: anything that is not a JSON object with a non-empty
/// string `problem` is answered with 400 before the model is contacted.
#[tracing::instrument(skip(state, body), fields(body_len = body.len()))]
pub async fn diagnose(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DiagnosisResponse>, DiagnoseError> {
    let result = run_diagnosis(&state, &body).await;

    metrics::record_request(match &result {
        Ok(_) => "success",
        Err(e) => e.outcome(),
    });

    result.map(Json)
}

async fn run_diagnosis(state: &AppState, body: &[u8]) -> Result<DiagnosisResponse, DiagnoseError> {
    let request = parse_request(body);
    let problem = request.problem_text().ok_or_else(|| {
        tracing::debug!("Rejected diagnosis request without usable problem text");
        DiagnoseError::missing_problem()
    })?;

    let prompt = state.prompt.user_prompt(problem);
    let provider = &state.text_provider;
    let started = Instant::now();

    let outcome = provider
        .generate(state.prompt.system_instruction(), &prompt)
        .await;

    let elapsed = started.elapsed().as_secs_f64();
    metrics::record_provider_call(
        provider.model(),
        if outcome.is_ok() { "ok" } else { "error" },
        elapsed,
    );

    let response = outcome?;
    metrics::record_tokens(
        provider.model(),
        response.input_tokens,
        response.output_tokens,
    );

    tracing::info!(
        model = %provider.model(),
        problem_len = problem.len(),
        answer_len = response.text.len(),
        finish_reason = response.finish_reason.as_str(),
        elapsed_secs = elapsed,
        "Diagnosis generated"
    );

    Ok(DiagnosisResponse {
        answer: response.text,
        aw_euro: state
            .labor
            .include_in_response
            .then_some(state.labor.aw_euro),
    })
}

fn parse_request(body: &[u8]) -> DiagnosisRequest {
    match serde_json::from_slice::<Value>(body) {
        Ok(value @ Value::Object(_)) => serde_json::from_value(value).unwrap_or_default(),
        _ => DiagnosisRequest::default(),
    }
}
