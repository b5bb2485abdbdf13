//! Anthropic Messages API generator.
//!
//! A retry turn is sent as a three-message conversation: the original task,
//! the rejected attempt as the assistant turn, and the correction request.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{GenerationError, GenerationOutput, GenerationRequest, TextGenerator, TokenUsage};
use crate::http;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const SERVICE: &str = "anthropic";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

pub struct AnthropicGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicGenerator {
    pub fn new(client: Client, api_key: impl Into<String>, model: Option<String>) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

fn build_messages(request: &GenerationRequest) -> Vec<AnthropicMessage> {
    let mut messages = vec![AnthropicMessage {
        role: "user".to_string(),
        content: request.task_instruction.clone(),
    }];
    if let (Some(prior), Some(correction)) =
        (request.prior_attempt.as_ref(), request.correction_message())
    {
        messages.push(AnthropicMessage {
            role: "assistant".to_string(),
            content: prior.clone(),
        });
        messages.push(AnthropicMessage {
            role: "user".to_string(),
            content: correction,
        });
    }
    messages
}

fn extract_output(
    body: AnthropicResponse,
    model: &str,
) -> Result<GenerationOutput, GenerationError> {
    let text: String = body
        .content
        .into_iter()
        .filter(|b| b.content_type == "text")
        .filter_map(|b| b.text)
        .collect();
    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    let usage = body
        .usage
        .map(|u| TokenUsage {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
        })
        .unwrap_or_default();
    Ok(GenerationOutput {
        text,
        usage,
        model: model.to_string(),
    })
}

#[async_trait]
impl TextGenerator for AnthropicGenerator {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError> {
        if self.api_key.is_empty() {
            return Err(GenerationError::NotConfigured(
                "ANTHROPIC_API_KEY is not set".to_string(),
            ));
        }
        let body = AnthropicRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: Some(request.role_instruction.as_str()).filter(|s| !s.is_empty()),
            messages: build_messages(request),
        };
        debug!(
            provider = SERVICE,
            model = %self.model,
            retry_turn = request.prior_attempt.is_some(),
            purpose = %request.purpose,
            "invoking generator"
        );

        let builder = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);
        let response = http::send_with_retry(SERVICE, builder).await?;
        let parsed: AnthropicResponse = http::read_json(SERVICE, response).await?;
        let output = extract_output(parsed, &self.model)?;
        debug!(
            provider = SERVICE,
            input_tokens = output.usage.input_tokens,
            output_tokens = output.usage.output_tokens,
            "generator returned"
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_attempt_is_a_single_user_turn() {
        let req = GenerationRequest::new("be a peer", "write it");
        let msgs = build_messages(&req);
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].role, "user");
    }

    #[test]
    fn retry_replays_attempt_then_feedback() {
        let req = GenerationRequest::new("be a peer", "write it")
            .with_correction("TITLE: x\n\nbody", &["too short".into()]);
        let msgs = build_messages(&req);
        let roles: Vec<_> = msgs.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["user", "assistant", "user"]);
        assert_eq!(msgs[1].content, "TITLE: x\n\nbody");
        assert!(msgs[2].content.contains("too short"));
    }

    #[test]
    fn text_blocks_are_concatenated_with_usage() {
        let body: AnthropicResponse = serde_json::from_value(serde_json::json!({
            "content": [
                {"type": "text", "text": "TITLE: a"},
                {"type": "tool_use", "id": "x"},
                {"type": "text", "text": "\n\nbody"}
            ],
            "usage": {"input_tokens": 12, "output_tokens": 34}
        }))
        .unwrap();
        let out = extract_output(body, "m").unwrap();
        assert_eq!(out.text, "TITLE: a\n\nbody");
        assert_eq!(out.usage.input_tokens, 12);
        assert_eq!(out.usage.output_tokens, 34);
    }

    #[test]
    fn empty_text_is_an_error() {
        let body: AnthropicResponse =
            serde_json::from_value(serde_json::json!({"content": []})).unwrap();
        assert_eq!(
            extract_output(body, "m").unwrap_err(),
            GenerationError::EmptyResponse
        );
    }
}
