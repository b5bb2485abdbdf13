//! Pre-publish gate rules engine.
//!
//! Evaluates a [`GateCandidate`] against a [`GateRuleSet`] to produce a
//! [`GateVerdict`]. The pipeline runs the gate twice per platform: before
//! generation, so no tokens are spent on a branch that cannot publish, and
//! again right before the publisher call against freshly loaded state.
//! A failed gate is a clean skip, never a failure.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use syndic_state::{Entity, Platform, PostedLog};

use crate::platforms::PlatformProfile;

// ---------------------------------------------------------------------------
// Candidate (input to the gate)
// ---------------------------------------------------------------------------

/// Facts about one prospective post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateCandidate {
    pub platform: Platform,
    pub content_reference: String,
    /// The entity still lists this platform in its schedule.
    pub entity_enabled: bool,
    /// A publisher implementation exists for the platform.
    pub has_publisher: bool,
    /// Credentials for that publisher are present.
    pub publisher_configured: bool,
    /// The content reference is already in the platform's posted log.
    pub already_posted: bool,
    pub destination: Option<String>,
    /// Last post to `destination`, when one is set.
    pub last_to_destination: Option<NaiveDate>,
    pub min_interval_days: Option<i64>,
    pub today: NaiveDate,
}

impl GateCandidate {
    /// Assemble a candidate from the entity, the platform's posted log and
    /// the set of configured publishers.
    pub fn gather(
        entity: &Entity,
        profile: &PlatformProfile,
        posted: &PostedLog,
        content_reference: &str,
        destination: Option<&str>,
        publisher_configured: bool,
        today: NaiveDate,
    ) -> Self {
        Self {
            platform: profile.platform,
            content_reference: content_reference.to_string(),
            entity_enabled: entity.is_enabled_for(profile.platform),
            has_publisher: profile.publishes,
            publisher_configured,
            already_posted: posted.contains(content_reference),
            destination: destination.map(str::to_string),
            last_to_destination: destination.and_then(|d| posted.last_to_destination(d)),
            min_interval_days: profile.min_interval_days,
            today,
        }
    }
}

// ---------------------------------------------------------------------------
// Gate rules
// ---------------------------------------------------------------------------

/// A single gate rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GateRule {
    /// The entity's schedule must still enable the platform.
    ScheduleEnabled,
    /// The platform must have a publisher implementation.
    PublisherAvailable,
    /// The publisher's credentials must be configured.
    PublisherConfigured,
    /// The content reference must not be in the posted log yet.
    NotAlreadyPosted,
    /// For time-gated platforms, enough days must have passed since the last
    /// post to the same sub-destination.
    MinInterval,
}

/// A set of gate rules with a fail-fast flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GateRuleSet {
    pub rules: Vec<GateRule>,
    pub fail_fast: bool,
}

impl GateRuleSet {
    /// Every rule, stopping at the first violation.
    pub fn standard() -> Self {
        Self {
            rules: vec![
                GateRule::ScheduleEnabled,
                GateRule::PublisherAvailable,
                GateRule::PublisherConfigured,
                GateRule::NotAlreadyPosted,
                GateRule::MinInterval,
            ],
            fail_fast: true,
        }
    }

    /// The re-check right before publishing: schedule and interval only.
    pub fn pre_publish() -> Self {
        Self {
            rules: vec![
                GateRule::ScheduleEnabled,
                GateRule::NotAlreadyPosted,
                GateRule::MinInterval,
            ],
            fail_fast: true,
        }
    }

    /// Append a rule.
    pub fn with_rule(mut self, rule: GateRule) -> Self {
        self.rules.push(rule);
        self
    }
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateViolation {
    pub rule: GateRule,
    /// Human-readable skip reason.
    pub reason: String,
}

impl fmt::Display for GateViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// The outcome of evaluating a gate rule set against a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateVerdict {
    pub passed: bool,
    pub violations: Vec<GateViolation>,
}

impl GateVerdict {
    fn pass() -> Self {
        Self {
            passed: true,
            violations: Vec::new(),
        }
    }

    fn fail(violations: Vec<GateViolation>) -> Self {
        Self {
            passed: false,
            violations,
        }
    }

    /// The first violation, used as the logged skip reason.
    pub fn skip_reason(&self) -> Option<&GateViolation> {
        self.violations.first()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Evaluate a [`GateCandidate`] against a [`GateRuleSet`].
///
/// When `fail_fast` is true, evaluation stops at the first violation.
pub fn evaluate_gate(rule_set: &GateRuleSet, candidate: &GateCandidate) -> GateVerdict {
    let mut violations = Vec::new();

    for rule in &rule_set.rules {
        if let Some(v) = check_rule(*rule, candidate) {
            violations.push(v);
            if rule_set.fail_fast {
                return GateVerdict::fail(violations);
            }
        }
    }

    if violations.is_empty() {
        GateVerdict::pass()
    } else {
        GateVerdict::fail(violations)
    }
}

fn violation(rule: GateRule, reason: String) -> Option<GateViolation> {
    Some(GateViolation { rule, reason })
}

fn check_rule(rule: GateRule, candidate: &GateCandidate) -> Option<GateViolation> {
    match rule {
        GateRule::ScheduleEnabled if !candidate.entity_enabled => violation(
            rule,
            format!("{} is not enabled in the entity schedule", candidate.platform),
        ),
        GateRule::PublisherAvailable if !candidate.has_publisher => violation(
            rule,
            format!("no publisher exists for {}", candidate.platform),
        ),
        GateRule::PublisherConfigured if !candidate.publisher_configured => violation(
            rule,
            format!("{} credentials are not configured", candidate.platform),
        ),
        GateRule::NotAlreadyPosted if candidate.already_posted => violation(
            rule,
            format!(
                "{} already posted to {}",
                candidate.content_reference, candidate.platform
            ),
        ),
        GateRule::MinInterval => {
            let required = candidate.min_interval_days?;
            let last = candidate.last_to_destination?;
            let days_since = (candidate.today - last).num_days();
            if days_since >= required {
                return None;
            }
            violation(
                rule,
                format!(
                    "last post to {} was {} day(s) ago, minimum interval is {}",
                    candidate.destination.as_deref().unwrap_or("destination"),
                    days_since,
                    required
                ),
            )
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn open_candidate() -> GateCandidate {
        GateCandidate {
            platform: Platform::Reddit,
            content_reference: "2026-10-18-alpha".into(),
            entity_enabled: true,
            has_publisher: true,
            publisher_configured: true,
            already_posted: false,
            destination: Some("webdev".into()),
            last_to_destination: None,
            min_interval_days: Some(14),
            today: d(2026, 10, 18),
        }
    }

    #[test]
    fn open_candidate_passes() {
        assert!(evaluate_gate(&GateRuleSet::standard(), &open_candidate()).passed);
    }

    #[test]
    fn fail_fast_reports_first_violation_only() {
        let c = GateCandidate {
            entity_enabled: false,
            publisher_configured: false,
            ..open_candidate()
        };
        let v = evaluate_gate(&GateRuleSet::standard(), &c);
        assert!(!v.passed);
        assert_eq!(v.violations.len(), 1);
        assert_eq!(v.violations[0].rule, GateRule::ScheduleEnabled);
    }

    #[test]
    fn collect_all_when_not_fail_fast() {
        let c = GateCandidate {
            entity_enabled: false,
            publisher_configured: false,
            ..open_candidate()
        };
        let rules = GateRuleSet {
            fail_fast: false,
            ..GateRuleSet::standard()
        };
        assert_eq!(evaluate_gate(&rules, &c).violations.len(), 2);
    }

    #[test]
    fn interval_boundary_is_inclusive() {
        let mut c = open_candidate();
        c.last_to_destination = Some(d(2026, 10, 5));
        assert!(!evaluate_gate(&GateRuleSet::standard(), &c).passed);
        c.last_to_destination = Some(d(2026, 10, 4));
        assert!(evaluate_gate(&GateRuleSet::standard(), &c).passed);
    }
}
