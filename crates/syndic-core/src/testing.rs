//! Scripted doubles for the generator and publisher seams (testing only)
//!
//! Requests are routed by platform: the first word of a request's purpose
//! is the platform name (`"devto article (...)"`).

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use syndic_state::Platform;

use crate::generator::{
    GenerationError, GenerationOutput, GenerationRequest, TextGenerator, TokenUsage,
};
use crate::http::ApiError;
use crate::publisher::{Envelope, PublishError, PublishReceipt, Publisher};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

type Reply = Result<String, GenerationError>;

/// Replays queued replies per platform. The last reply in a queue repeats.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, platform: Platform, reply: Reply) -> Self {
        lock(&self.scripts)
            .entry(platform.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn respond(self, platform: Platform, text: impl Into<String>) -> Self {
        self.push(platform, Ok(text.into()))
    }

    pub fn fail(self, platform: Platform, error: GenerationError) -> Self {
        self.push(platform, Err(error))
    }

    /// Every request received, in arrival order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        lock(&self.requests).clone()
    }

    pub fn calls_for(&self, platform: Platform) -> usize {
        let name = platform.to_string();
        lock(&self.requests)
            .iter()
            .filter(|r| route(r) == name)
            .count()
    }
}

fn route(request: &GenerationRequest) -> &str {
    request.purpose.split_whitespace().next().unwrap_or_default()
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError> {
        lock(&self.requests).push(request.clone());
        let reply = {
            let mut scripts = lock(&self.scripts);
            match scripts.get_mut(route(request)) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };
        let text = reply.unwrap_or(Err(GenerationError::EmptyResponse))?;
        Ok(GenerationOutput {
            text,
            usage: TokenUsage {
                input_tokens: 120,
                output_tokens: 80,
            },
            model: "scripted".to_string(),
        })
    }
}

/// Accepts every envelope unless told to fail; ids are `<platform>-<n>`.
#[derive(Debug)]
pub struct RecordingPublisher {
    platform: Platform,
    failure: Option<ApiError>,
    envelopes: Mutex<Vec<Envelope>>,
}

impl RecordingPublisher {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            failure: None,
            envelopes: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(platform: Platform, error: ApiError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new(platform)
        }
    }

    /// Envelopes received, including ones that were answered with a failure.
    pub fn envelopes(&self) -> Vec<Envelope> {
        lock(&self.envelopes).clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn publish(&self, envelope: &Envelope) -> Result<PublishReceipt, PublishError> {
        let n = {
            let mut seen = lock(&self.envelopes);
            seen.push(envelope.clone());
            seen.len()
        };
        if let Some(err) = &self.failure {
            return Err(err.clone().into());
        }
        let external_id = format!("{}-{n}", self.platform);
        Ok(PublishReceipt {
            url: format!("https://example.test/{external_id}"),
            external_id,
        })
    }
}
