use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Incoming `POST /api/ki-diagnose` body.
///
/// `problem` stays untyped so that wrong types surface as our own 400 instead
/// of a deserializer rejection.
#[derive(Debug, Default, Deserialize)]
pub struct DiagnosisRequest {
    #[serde(default)]
    pub problem: Option<Value>,
}

impl DiagnosisRequest {
    /// The problem text, if present as a non-empty JSON string.
    pub fn problem_text(&self) -> Option<&str> {
        match &self.problem {
            Some(Value::String(text)) if !text.is_empty() => Some(text.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosisResponse {
    pub answer: String,
    /// Euro per AW, echoed when enabled.
    #[serde(rename = "awEuro", skip_serializing_if = "Option::is_none")]
    pub aw_euro: Option<u32>,
}
