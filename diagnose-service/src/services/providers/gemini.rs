//! Gemini AI provider implementation.
//!
//! Calls `models/{model}:generateContent` on the Gemini REST API. The API key
//! travels in the `x-goog-api-key` header so it never appears in URLs that
//! reqwest echoes into error messages.

use super::{FinishReason, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Transport timeout for a single generation call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Secret<String>,
    pub model: String,
    /// e.g. https://generativelanguage.googleapis.com/v1beta
    pub api_base: String,
}

/// Gemini text provider.
pub struct GeminiTextProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiTextProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                ProviderError::NotConfigured(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// Build the API URL for the given model method.
    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.api_base, self.config.model, method
        )
    }

    fn build_request(system_instruction: &str, prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::text(prompt)],
            }],
            system_instruction: if system_instruction.is_empty() {
                None
            } else {
                Some(Content {
                    role: None,
                    parts: vec![Part::text(system_instruction)],
                })
            },
        }
    }
}

#[async_trait]
impl TextProvider for GeminiTextProvider {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(
        &self,
        system_instruction: &str,
        prompt: &str,
    ) -> Result<ProviderResponse, ProviderError> {
        let request = Self::build_request(system_instruction, prompt);
        let url = self.api_url("generateContent");

        tracing::debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }

            return Err(ProviderError::ApiError(format!(
                "Gemini API error {}: {}",
                status, error_text
            )));
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        api_response.into_provider_response()
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.config.api_key.expose_secret().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }

        // Listing models verifies the key without spending tokens
        let url = format!("{}/models", self.config.api_base);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, self.config.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::ApiError(format!(
                "Health check failed: {}",
                response.status()
            )))
        }
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    /// Set on reasoning summaries, which are not part of the answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            thought: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<i32>,
    candidates_token_count: Option<i32>,
}

impl GenerateContentResponse {
    fn into_provider_response(self) -> Result<ProviderResponse, ProviderError> {
        let usage = self.usage_metadata.unwrap_or_default();

        let candidate = match self.candidates.into_iter().next() {
            Some(candidate) => candidate,
            None => {
                return match self.prompt_feedback.and_then(|f| f.block_reason) {
                    Some(reason) => Err(ProviderError::ContentFiltered(reason)),
                    None => Err(ProviderError::EmptyResponse),
                };
            }
        };

        let finish_reason = match candidate.finish_reason.as_deref() {
            None | Some("STOP") => FinishReason::Complete,
            Some("MAX_TOKENS") => FinishReason::Length,
            Some(
                reason @ ("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII"
                | "LANGUAGE"),
            ) => return Err(ProviderError::ContentFiltered(reason.to_string())),
            Some(_) => FinishReason::Complete,
        };

        let text: String = candidate
            .content
            .unwrap_or_default()
            .parts
            .into_iter()
            .filter(|p| p.thought != Some(true))
            .filter_map(|p| p.text)
            .collect();

        if text.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }

        Ok(ProviderResponse {
            text,
            input_tokens: usage.prompt_token_count.unwrap_or(0),
            output_tokens: usage.candidates_token_count.unwrap_or(0),
            finish_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<ProviderResponse, ProviderError> {
        serde_json::from_value::<GenerateContentResponse>(value)
            .unwrap()
            .into_provider_response()
    }

    #[test]
    fn request_carries_system_instruction_and_prompt() {
        let request = GeminiTextProvider::build_request("Du bist Mechaniker.", "Bremse schleift");
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(
            body,
            json!({
                "contents": [{ "role": "user", "parts": [{ "text": "Bremse schleift" }] }],
                "systemInstruction": { "parts": [{ "text": "Du bist Mechaniker." }] }
            })
        );
    }

    #[test]
    fn empty_system_instruction_is_omitted() {
        let request = GeminiTextProvider::build_request("", "Hallo");
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn joins_text_parts_and_reads_usage() {
        let response = parse(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [
                    { "text": "Vermutete " },
                    { "text": "Ursache: ..." }
                ]},
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 120, "candidatesTokenCount": 40, "totalTokenCount": 160 }
        }))
        .unwrap();

        assert_eq!(response.text, "Vermutete Ursache: ...");
        assert_eq!(response.input_tokens, 120);
        assert_eq!(response.output_tokens, 40);
        assert_eq!(response.finish_reason, FinishReason::Complete);
    }

    #[test]
    fn skips_thought_parts() {
        let response = parse(json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "thinking...", "thought": true },
                    { "text": "Antwort" }
                ]}
            }]
        }))
        .unwrap();

        assert_eq!(response.text, "Antwort");
    }

    #[test]
    fn max_tokens_still_returns_text() {
        let response = parse(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "abgeschnitten" }] },
                "finishReason": "MAX_TOKENS"
            }]
        }))
        .unwrap();

        assert_eq!(response.finish_reason, FinishReason::Length);
    }

    #[test]
    fn safety_finish_is_an_error() {
        let err = parse(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        }))
        .unwrap_err();

        assert_eq!(err, ProviderError::ContentFiltered("SAFETY".to_string()));
    }

    #[test]
    fn blocked_prompt_is_an_error() {
        let err = parse(json!({
            "promptFeedback": { "blockReason": "OTHER" }
        }))
        .unwrap_err();

        assert_eq!(err, ProviderError::ContentFiltered("OTHER".to_string()));
    }

    #[test]
    fn missing_candidates_is_empty_response() {
        assert_eq!(parse(json!({})).unwrap_err(), ProviderError::EmptyResponse);
    }

    #[test]
    fn api_url_has_no_key() {
        let provider = GeminiTextProvider::new(GeminiConfig {
            api_key: Secret::new("secret-key".to_string()),
            model: "gemini-2.5-flash".to_string(),
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        })
        .unwrap();

        let url = provider.api_url("generateContent");
        assert_eq!(
            url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert!(!url.contains("secret-key"));
    }
}
