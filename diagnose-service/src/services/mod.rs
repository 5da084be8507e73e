pub mod metrics;
pub mod prompt;
pub mod providers;

pub use prompt::{DiagnosisPrompt, PromptProfile};
pub use providers::TextProvider;
