//! Mock provider implementation for testing.

use super::{FinishReason, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;
use std::sync::Mutex;

/// What the mock answers with.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Echo the prompt back.
    Echo,
    /// Always return this text.
    Text(String),
    /// Always fail with this error.
    Error(ProviderError),
}

/// One recorded `generate` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub system_instruction: String,
    pub prompt: String,
}

/// Mock text provider for testing. Records every call.
pub struct MockTextProvider {
    outcome: MockOutcome,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTextProvider {
    pub fn new(enabled: bool) -> Self {
        let outcome = if enabled {
            MockOutcome::Echo
        } else {
            MockOutcome::Error(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ))
        };
        Self::with_outcome(outcome)
    }

    pub fn with_outcome(outcome: MockOutcome) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self::with_outcome(MockOutcome::Text(text.into()))
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::with_outcome(MockOutcome::Error(error))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    fn model(&self) -> &str {
        "mock"
    }

    async fn generate(
        &self,
        system_instruction: &str,
        prompt: &str,
    ) -> Result<ProviderResponse, ProviderError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(RecordedCall {
                system_instruction: system_instruction.to_string(),
                prompt: prompt.to_string(),
            });

        let text = match &self.outcome {
            MockOutcome::Echo => format!("Mock response for: {}", prompt),
            MockOutcome::Text(text) => text.clone(),
            MockOutcome::Error(err) => return Err(err.clone()),
        };

        Ok(ProviderResponse {
            input_tokens: prompt.len() as i32 / 4,
            output_tokens: text.len() as i32 / 4,
            text,
            finish_reason: FinishReason::Complete,
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        match &self.outcome {
            MockOutcome::Error(err) => Err(err.clone()),
            _ => Ok(()),
        }
    }
}
