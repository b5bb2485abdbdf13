//! Bounded generate → validate → regenerate state machine.
//!
//! ```text
//! Generated ──valid──▶ Validated
//!     │
//!   invalid
//!     ▼
//!  Invalid ──budget left──▶ Regenerated ──valid──▶ Validated
//!     │                          │
//!  budget spent               invalid ──▶ Invalid ──▶ Discarded
//!     ▼
//!  Discarded
//! ```
//!
//! The controller itself is synchronous and has no notion of the generator;
//! [`generate_validated`] drives it against any [`DraftSource`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use syndic_state::Platform;

use crate::domain::{ContentDraft, Result, SyndicError, ValidationResult};
use crate::generator::{GenerationError, TokenUsage};
use crate::obs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftState {
    Generated,
    Invalid,
    Regenerated,
    Validated,
    Discarded,
}

impl DraftState {
    pub fn is_terminal(self) -> bool {
        matches!(self, DraftState::Validated | DraftState::Discarded)
    }
}

/// Bounded retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_regenerations: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_regenerations: 1,
        }
    }
}

/// One auditable step in a draft's timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: DraftState,
    pub to: DraftState,
    /// Generation attempt the transition belongs to (1-based).
    pub attempt: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// What the caller must do after a validation verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    Accept,
    /// Regenerate with these errors as corrective feedback.
    Regenerate { feedback: Vec<String> },
    Discard { errors: Vec<String> },
}

#[derive(Debug, Clone)]
pub struct RetryController {
    state: DraftState,
    policy: RetryPolicy,
    attempt: u32,
    regenerations_used: u32,
    transitions: Vec<Transition>,
}

impl Default for RetryController {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl RetryController {
    /// A controller for a draft that has just been generated.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            state: DraftState::Generated,
            policy,
            attempt: 1,
            regenerations_used: 0,
            transitions: Vec::new(),
        }
    }

    pub fn state(&self) -> DraftState {
        self.state
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn into_transitions(self) -> Vec<Transition> {
        self.transitions
    }

    fn move_to(&mut self, to: DraftState, errors: Vec<String>) {
        self.transitions.push(Transition {
            from: self.state,
            to,
            attempt: self.attempt,
            errors,
        });
        self.state = to;
    }

    /// Feed the verdict for the current draft.
    pub fn observe(&mut self, result: &ValidationResult) -> Result<RetryDecision> {
        if !matches!(self.state, DraftState::Generated | DraftState::Regenerated) {
            return Err(SyndicError::InvalidTransition(format!(
                "cannot validate a draft in state {:?}",
                self.state
            )));
        }
        if result.valid {
            self.move_to(DraftState::Validated, Vec::new());
            return Ok(RetryDecision::Accept);
        }

        self.move_to(DraftState::Invalid, result.errors.clone());
        if self.regenerations_used < self.policy.max_regenerations {
            Ok(RetryDecision::Regenerate {
                feedback: result.errors.clone(),
            })
        } else {
            self.move_to(DraftState::Discarded, Vec::new());
            Ok(RetryDecision::Discard {
                errors: result.errors.clone(),
            })
        }
    }

    /// Record that a full replacement draft was produced.
    pub fn regenerated(&mut self) -> Result<()> {
        if self.state != DraftState::Invalid
            || self.regenerations_used >= self.policy.max_regenerations
        {
            return Err(SyndicError::InvalidTransition(format!(
                "cannot regenerate from state {:?} with {} of {} regenerations used",
                self.state, self.regenerations_used, self.policy.max_regenerations
            )));
        }
        self.regenerations_used += 1;
        self.attempt += 1;
        self.move_to(DraftState::Regenerated, Vec::new());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// The prior attempt and the errors its replacement must fix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub prior_raw: String,
    pub errors: Vec<String>,
}

/// One generation call, parsed into a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDraft {
    pub raw: String,
    pub draft: ContentDraft,
    pub usage: TokenUsage,
}

/// Produces drafts: a first attempt, or a full replacement given a correction.
#[async_trait]
pub trait DraftSource: Send + Sync {
    async fn draft(
        &self,
        correction: Option<&Correction>,
    ) -> std::result::Result<GeneratedDraft, GenerationError>;
}

/// A generated draft together with its verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckedAttempt {
    pub attempt: u32,
    pub draft: ContentDraft,
    pub validation: ValidationResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetryOutcome {
    /// `Validated` or `Discarded`.
    pub state: DraftState,
    pub attempts: Vec<CheckedAttempt>,
    pub transitions: Vec<Transition>,
}

impl RetryOutcome {
    pub fn accepted(&self) -> Option<&ContentDraft> {
        match self.state {
            DraftState::Validated => self.attempts.last().map(|a| &a.draft),
            _ => None,
        }
    }

    pub fn last(&self) -> Option<&CheckedAttempt> {
        self.attempts.last()
    }

    pub fn regenerated(&self) -> bool {
        self.attempts.len() > 1
    }
}

/// Drive the controller to a terminal state.
///
/// A generation failure on either attempt aborts with
/// [`SyndicError::Generation`]; nothing is accepted in that case.
pub async fn generate_validated<S, V>(
    platform: Platform,
    source: &S,
    validate: V,
    policy: RetryPolicy,
) -> Result<RetryOutcome>
where
    S: DraftSource + ?Sized,
    V: Fn(&ContentDraft) -> ValidationResult + Send + Sync,
{
    let mut controller = RetryController::new(policy);
    let mut attempts = Vec::new();

    let mut current = source.draft(None).await?;
    loop {
        let validation = validate(&current.draft);
        let attempt = controller.attempt();
        if !validation.valid {
            obs::emit_validation_failed(platform, attempt, &validation.errors);
        }
        let decision = controller.observe(&validation)?;
        attempts.push(CheckedAttempt {
            attempt,
            draft: current.draft.clone(),
            validation,
        });

        match decision {
            RetryDecision::Accept | RetryDecision::Discard { .. } => break,
            RetryDecision::Regenerate { feedback } => {
                obs::emit_retry_issued(platform, feedback.len());
                let correction = Correction {
                    prior_raw: std::mem::take(&mut current.raw),
                    errors: feedback,
                };
                current = source.draft(Some(&correction)).await?;
                controller.regenerated()?;
            }
        }
    }

    Ok(RetryOutcome {
        state: controller.state(),
        attempts,
        transitions: controller.into_transitions(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Finding, Severity};

    fn invalid(msg: &str) -> ValidationResult {
        ValidationResult::from_findings(vec![Finding {
            rule: "max_length".into(),
            severity: Severity::Error,
            message: msg.into(),
        }])
    }

    fn valid() -> ValidationResult {
        ValidationResult::from_findings(Vec::new())
    }

    #[test]
    fn valid_first_attempt_goes_straight_to_validated() {
        let mut c = RetryController::default();
        assert_eq!(c.observe(&valid()).unwrap(), RetryDecision::Accept);
        assert_eq!(c.state(), DraftState::Validated);
        assert_eq!(c.transitions().len(), 1);
    }

    #[test]
    fn second_failure_discards() {
        let mut c = RetryController::default();
        let first = c.observe(&invalid("too long")).unwrap();
        assert_eq!(
            first,
            RetryDecision::Regenerate {
                feedback: vec!["[max_length] too long".into()]
            }
        );
        c.regenerated().unwrap();
        let second = c.observe(&invalid("still long")).unwrap();
        assert!(matches!(second, RetryDecision::Discard { .. }));
        let path: Vec<_> = c.transitions().iter().map(|t| t.to).collect();
        assert_eq!(
            path,
            vec![
                DraftState::Invalid,
                DraftState::Regenerated,
                DraftState::Invalid,
                DraftState::Discarded
            ]
        );
    }

    #[test]
    fn budget_cannot_be_exceeded() {
        let mut c = RetryController::default();
        c.observe(&invalid("x")).unwrap();
        c.regenerated().unwrap();
        assert!(c.regenerated().is_err());
        c.observe(&invalid("x")).unwrap();
        assert!(c.observe(&valid()).is_err());
    }

    #[test]
    fn zero_budget_discards_immediately() {
        let mut c = RetryController::new(RetryPolicy {
            max_regenerations: 0,
        });
        assert!(matches!(
            c.observe(&invalid("x")).unwrap(),
            RetryDecision::Discard { .. }
        ));
        assert!(c.state().is_terminal());
    }
}
