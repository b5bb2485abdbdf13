use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use syndic_core::generator::TokenUsage;
use syndic_core::retry::{Correction, DraftSource, GeneratedDraft};
use syndic_core::{
    generate_validated, validate, ContentDraft, DraftState, GenerationError, RetryPolicy,
    SyndicError, ValidationContext,
};
use syndic_state::Platform;

/// Hands out queued bodies and remembers the corrections it was given.
struct QueuedSource {
    bodies: Mutex<VecDeque<Result<String, GenerationError>>>,
    corrections: Mutex<Vec<Correction>>,
}

impl QueuedSource {
    fn new(bodies: Vec<Result<&str, GenerationError>>) -> Self {
        Self {
            bodies: Mutex::new(bodies.into_iter().map(|b| b.map(String::from)).collect()),
            corrections: Mutex::new(Vec::new()),
        }
    }

    fn corrections(&self) -> Vec<Correction> {
        self.corrections.lock().unwrap().clone()
    }
}

#[async_trait]
impl DraftSource for QueuedSource {
    async fn draft(&self, correction: Option<&Correction>) -> Result<GeneratedDraft, GenerationError> {
        if let Some(c) = correction {
            self.corrections.lock().unwrap().push(c.clone());
        }
        let body = self
            .bodies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(GenerationError::EmptyResponse))?;
        Ok(GeneratedDraft {
            raw: body.clone(),
            draft: ContentDraft::new(Platform::Bluesky, "", body),
            usage: TokenUsage::default(),
        })
    }
}

fn ctx() -> ValidationContext {
    ValidationContext::new(Platform::Bluesky, 2026)
}

fn too_long() -> String {
    "a".repeat(301)
}

#[tokio::test]
async fn valid_first_draft_is_generated_once() {
    let source = QueuedSource::new(vec![Ok("Spent the evening chasing one flaky redirect.")]);
    let ctx = ctx();
    let outcome = generate_validated(Platform::Bluesky, &source, |d| validate(d, &ctx), RetryPolicy::default())
        .await
        .unwrap();
    assert_eq!(outcome.state, DraftState::Validated);
    assert_eq!(outcome.attempts.len(), 1);
    assert!(source.corrections().is_empty());
}

#[tokio::test]
async fn invalid_then_valid_is_accepted_after_one_correction() {
    let long = too_long();
    let source = QueuedSource::new(vec![Ok(long.as_str()), Ok("Shorter now.")]);
    let ctx = ctx();
    let outcome = generate_validated(Platform::Bluesky, &source, |d| validate(d, &ctx), RetryPolicy::default())
        .await
        .unwrap();

    assert_eq!(outcome.state, DraftState::Validated);
    assert_eq!(outcome.accepted().unwrap().body, "Shorter now.");
    let corrections = source.corrections();
    assert_eq!(corrections.len(), 1);
    assert_eq!(corrections[0].prior_raw, long);
    assert!(corrections[0].errors.iter().any(|e| e.starts_with("[max_length]")));

    let path: Vec<(DraftState, DraftState)> =
        outcome.transitions.iter().map(|t| (t.from, t.to)).collect();
    assert_eq!(
        path,
        vec![
            (DraftState::Generated, DraftState::Invalid),
            (DraftState::Invalid, DraftState::Regenerated),
            (DraftState::Regenerated, DraftState::Validated),
        ]
    );
}

#[tokio::test]
async fn two_invalid_drafts_are_discarded_without_a_third_call() {
    let long = too_long();
    let source = QueuedSource::new(vec![Ok(long.as_str()), Ok(long.as_str()), Ok("never used")]);
    let ctx = ctx();
    let outcome = generate_validated(Platform::Bluesky, &source, |d| validate(d, &ctx), RetryPolicy::default())
        .await
        .unwrap();
    assert_eq!(outcome.state, DraftState::Discarded);
    assert!(outcome.accepted().is_none());
    assert_eq!(outcome.attempts.len(), 2);
    assert_eq!(source.bodies.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn generation_failure_aborts() {
    let long = too_long();
    let source = QueuedSource::new(vec![Ok(long.as_str()), Err(GenerationError::EmptyResponse)]);
    let ctx = ctx();
    let err = generate_validated(Platform::Bluesky, &source, |d| validate(d, &ctx), RetryPolicy::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SyndicError::Generation(GenerationError::EmptyResponse)));
}
