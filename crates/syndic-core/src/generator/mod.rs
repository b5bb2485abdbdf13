//! Text-generation boundary.
//!
//! The pipeline only knows this contract: role instruction + task instruction,
//! optionally the previous attempt and the corrections it needs, in; raw text
//! plus token usage out. Output parsing lives in [`parse`] and never fails.

pub mod anthropic;
pub mod parse;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::http::ApiError;

pub use anthropic::AnthropicGenerator;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub role_instruction: String,
    pub task_instruction: String,
    /// Raw text of the rejected attempt, replayed as the assistant turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_attempt: Option<String>,
    /// Validation errors the replacement must fix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction_feedback: Option<Vec<String>>,
    /// Short label recorded in the usage log.
    #[serde(default)]
    pub purpose: String,
}

impl GenerationRequest {
    pub fn new(role: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            role_instruction: role.into(),
            task_instruction: task.into(),
            prior_attempt: None,
            correction_feedback: None,
            purpose: String::new(),
        }
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = purpose.into();
        self
    }

    /// The same request, extended with a rejected attempt and its errors.
    pub fn with_correction(&self, prior_attempt: &str, errors: &[String]) -> Self {
        Self {
            prior_attempt: Some(prior_attempt.to_string()),
            correction_feedback: Some(errors.to_vec()),
            ..self.clone()
        }
    }

    /// User turn that asks for a full replacement of the prior attempt.
    pub fn correction_message(&self) -> Option<String> {
        let errors = self.correction_feedback.as_ref()?;
        let mut msg = String::from(
            "The previous draft was rejected by automated review for these reasons:\n",
        );
        for e in errors {
            msg.push_str("- ");
            msg.push_str(e);
            msg.push('\n');
        }
        msg.push_str(
            "\nRewrite the whole piece from scratch so that none of these problems remain. \
             Keep the required output format exactly and output only the replacement.",
        );
        Some(msg)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub text: String,
    pub usage: TokenUsage,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("generator not configured: {0}")]
    NotConfigured(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("generator returned no text")]
    EmptyResponse,
}

impl GenerationError {
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::NotConfigured(_) => "not_configured",
            GenerationError::Api(e) => e.kind(),
            GenerationError::EmptyResponse => "empty_response",
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model identifier recorded with usage.
    fn model(&self) -> &str;

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError>;
}

/// Stand-in used when no API key is configured; every call fails cleanly.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredGenerator;

#[async_trait]
impl TextGenerator for UnconfiguredGenerator {
    fn model(&self) -> &str {
        "unconfigured"
    }

    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError> {
        Err(GenerationError::NotConfigured(
            "ANTHROPIC_API_KEY is not set".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correction_carries_prior_attempt_and_every_error() {
        let base = GenerationRequest::new("role", "task").with_purpose("devto article");
        let retry = base.with_correction("old text", &["too short".into(), "stale year".into()]);
        assert_eq!(retry.prior_attempt.as_deref(), Some("old text"));
        assert_eq!(retry.purpose, "devto article");
        let msg = retry.correction_message().unwrap();
        assert!(msg.contains("- too short\n"));
        assert!(msg.contains("- stale year\n"));
        assert!(base.correction_message().is_none());
    }
}
