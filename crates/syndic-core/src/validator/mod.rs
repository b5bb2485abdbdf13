//! Declarative draft validation.
//!
//! Every rule is a `{id, severity, applies, check}` entry. [`validate`] runs
//! every applicable rule in [`RULES`] and merges the findings; nothing here
//! touches the clock, the network or the filesystem, so the same draft and
//! context always produce the same result.

mod freshness;
mod length;
mod structural;
pub mod text;
mod title;
mod topical;

use serde::Serialize;
use syndic_state::Platform;

use crate::domain::{ContentDraft, Finding, Severity, ValidationResult};
use crate::platforms::{profile_for, PlatformProfile};

/// Titles closer than this (bigram Jaccard) to a used title are rejected.
pub const NEAR_DUPLICATE_THRESHOLD: f64 = 0.8;

/// Rule groups, used for reporting and for running a subset in isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleGroup {
    Structural,
    Length,
    Code,
    Topical,
    Freshness,
    Title,
}

/// Everything a rule may consult besides the draft itself.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    pub profile: PlatformProfile,
    pub current_year: i32,
    /// Titles already used for the same destination.
    pub previous_titles: Vec<String>,
    /// Entity-specific technology names banned from peer-voice posts.
    pub stack_terms: Vec<String>,
}

impl ValidationContext {
    pub fn new(platform: Platform, current_year: i32) -> Self {
        Self {
            profile: profile_for(platform),
            current_year,
            previous_titles: Vec::new(),
            stack_terms: Vec::new(),
        }
    }

    pub fn with_previous_titles(mut self, titles: Vec<String>) -> Self {
        self.previous_titles = titles;
        self
    }

    pub fn with_stack_terms(mut self, terms: Vec<String>) -> Self {
        self.stack_terms = terms;
        self
    }
}

pub type AppliesFn = fn(&PlatformProfile) -> bool;
pub type CheckFn = fn(&ContentDraft, &ValidationContext) -> Vec<String>;

/// One declarative rule. `check` returns one message per violation.
pub struct Rule {
    pub id: &'static str,
    pub group: RuleGroup,
    pub severity: Severity,
    pub applies: AppliesFn,
    pub check: CheckFn,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("group", &self.group)
            .field("severity", &self.severity)
            .finish()
    }
}

impl Rule {
    /// Evaluate this rule alone. Rules that do not apply yield nothing.
    pub fn evaluate(&self, draft: &ContentDraft, ctx: &ValidationContext) -> Vec<Finding> {
        if !(self.applies)(&ctx.profile) {
            return Vec::new();
        }
        (self.check)(draft, ctx)
            .into_iter()
            .map(|message| Finding {
                rule: self.id.to_string(),
                severity: self.severity,
                message,
            })
            .collect()
    }
}

fn always(_: &PlatformProfile) -> bool {
    true
}

fn titled(p: &PlatformProfile) -> bool {
    p.kind.is_titled()
}

fn has_front_matter(p: &PlatformProfile) -> bool {
    p.front_matter.is_some()
}

fn has_min_len(p: &PlatformProfile) -> bool {
    p.min_len.is_some()
}

fn has_max_len(p: &PlatformProfile) -> bool {
    p.max_len.is_some()
}

fn needs_code(p: &PlatformProfile) -> bool {
    p.min_code_blocks.is_some()
}

fn peer_voice(p: &PlatformProfile) -> bool {
    p.peer_voice
}

fn no_links(p: &PlatformProfile) -> bool {
    !p.allow_links
}

fn community(p: &PlatformProfile) -> bool {
    p.kind == crate::domain::ContentKind::Community
}

fn long_form(p: &PlatformProfile) -> bool {
    p.kind == crate::domain::ContentKind::LongForm
}

fn is_twitter(p: &PlatformProfile) -> bool {
    p.platform == Platform::Twitter
}

fn is_devto(p: &PlatformProfile) -> bool {
    p.platform == Platform::Devto
}

macro_rules! rule {
    ($id:literal, $group:ident, $sev:ident, $applies:expr, $check:expr) => {
        Rule {
            id: $id,
            group: RuleGroup::$group,
            severity: Severity::$sev,
            applies: $applies,
            check: $check,
        }
    };
}

/// The full rule set, in reporting order.
pub static RULES: &[Rule] = &[
    rule!("front_matter", Structural, Error, has_front_matter, structural::front_matter_keys),
    rule!("published_flag", Structural, Error, has_front_matter, structural::published_flag),
    rule!("title_present", Structural, Error, titled, structural::title_present),
    rule!("body_present", Structural, Error, always, structural::body_present),
    rule!("placeholder", Structural, Error, always, structural::placeholders),
    rule!("min_length", Length, Error, has_min_len, length::min_length),
    rule!("max_length", Length, Error, has_max_len, length::max_length),
    rule!("title_length", Length, Error, community, length::community_title_length),
    rule!("code_blocks", Code, Error, needs_code, length::code_blocks),
    rule!("listicle", Topical, Error, always, topical::listicle),
    rule!("fabricated_score", Topical, Error, always, topical::fabricated_scores),
    rule!("hype", Topical, Error, always, topical::hype),
    rule!("community_promo", Topical, Error, community, topical::community_promo),
    rule!("stack_terms", Topical, Error, peer_voice, topical::stack_terms),
    rule!("links", Topical, Error, no_links, topical::links),
    rule!("stale_year", Freshness, Error, always, freshness::stale_year_in_body),
    rule!("title_pattern", Title, Error, titled, title::banned_patterns),
    rule!("title_stale_year", Title, Error, titled, freshness::stale_year_in_title),
    rule!("title_reuse", Title, Error, titled, title::reuse),
    rule!("hashtags", Topical, Warning, is_twitter, topical::hashtag_count),
    rule!("blog_link", Structural, Warning, is_devto, structural::blog_link),
    rule!("very_long", Length, Warning, long_form, length::very_long),
];

/// Run every applicable rule and merge the findings.
pub fn validate(draft: &ContentDraft, ctx: &ValidationContext) -> ValidationResult {
    validate_with(RULES, draft, ctx)
}

/// Run an explicit rule list.
pub fn validate_with(
    rules: &[Rule],
    draft: &ContentDraft,
    ctx: &ValidationContext,
) -> ValidationResult {
    let findings = rules
        .iter()
        .flat_map(|rule| rule.evaluate(draft, ctx))
        .collect();
    ValidationResult::from_findings(findings)
}

/// Look up a rule by id.
pub fn rule(id: &str) -> Option<&'static Rule> {
    RULES.iter().find(|r| r.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_ids_are_unique() {
        let mut ids: Vec<_> = RULES.iter().map(|r| r.id).collect();
        ids.sort();
        let before = ids.len();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }

    #[test]
    fn inapplicable_rules_yield_nothing() {
        let ctx = ValidationContext::new(Platform::Bluesky, 2026);
        let draft = ContentDraft::new(Platform::Bluesky, "", "short post");
        assert!(rule("code_blocks").unwrap().evaluate(&draft, &ctx).is_empty());
        assert!(rule("title_present").unwrap().evaluate(&draft, &ctx).is_empty());
    }

    #[test]
    fn findings_carry_rule_id_and_severity() {
        let ctx = ValidationContext::new(Platform::Bluesky, 2026);
        let draft = ContentDraft::new(Platform::Bluesky, "", "TODO write this");
        let findings = rule("placeholder").unwrap().evaluate(&draft, &ctx);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, "placeholder");
        assert_eq!(findings[0].severity, Severity::Error);
    }
}
