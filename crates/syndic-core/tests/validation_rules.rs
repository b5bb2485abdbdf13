use syndic_core::{validate, ContentDraft, ValidationContext};
use syndic_state::Platform;

const YEAR: i32 = 2026;

fn article_body() -> String {
    "Caching the rendered page at the edge cut the wait for returning readers. \
     The tricky part was deciding when a stale copy is still good enough.\n\n"
        .repeat(25)
}

// ── Length ──────────────────────────────────────────────────────────────

#[test]
fn bluesky_accepts_exactly_three_hundred_graphemes() {
    let ctx = ValidationContext::new(Platform::Bluesky, YEAR);
    let draft = ContentDraft::new(Platform::Bluesky, "", "a".repeat(300));
    let result = validate(&draft, &ctx);
    assert!(result.valid, "{:?}", result.errors);
}

#[test]
fn bluesky_rejects_three_hundred_and_one_graphemes() {
    let ctx = ValidationContext::new(Platform::Bluesky, YEAR);
    let draft = ContentDraft::new(Platform::Bluesky, "", "a".repeat(301));
    let result = validate(&draft, &ctx);
    assert!(!result.valid);
    assert!(result.has_rule("max_length"));
}

#[test]
fn bluesky_counts_emoji_with_modifiers_once() {
    let ctx = ValidationContext::new(Platform::Bluesky, YEAR);
    let draft = ContentDraft::new(Platform::Bluesky, "", "👍🏽".repeat(300));
    assert!(!validate(&draft, &ctx).has_rule("max_length"));
}

#[test]
fn devto_minimum_is_enforced() {
    let ctx = ValidationContext::new(Platform::Devto, YEAR);
    let draft = ContentDraft::new(Platform::Devto, "Edge caching notes", "Too short.");
    let result = validate(&draft, &ctx);
    assert!(result.has_rule("min_length"));
}

// ── Freshness ───────────────────────────────────────────────────────────

#[test]
fn last_year_in_title_is_an_error() {
    let ctx = ValidationContext::new(Platform::Devto, YEAR);
    let draft = ContentDraft::new(Platform::Devto, "What I learned in 2025", article_body());
    let result = validate(&draft, &ctx);
    assert!(!result.valid);
    assert!(result
        .errors
        .iter()
        .any(|e| e.starts_with("[title_stale_year]") && e.contains("2025")));
}

#[test]
fn current_year_in_title_is_fine() {
    let ctx = ValidationContext::new(Platform::Devto, YEAR);
    let draft = ContentDraft::new(Platform::Devto, "What I learned in 2026", article_body());
    let result = validate(&draft, &ctx);
    assert!(result.valid, "{:?}", result.errors);
}

// ── Topical and title policy ────────────────────────────────────────────

#[test]
fn peer_voice_rejects_entity_stack_terms() {
    let ctx = ValidationContext::new(Platform::Mastodon, YEAR)
        .with_stack_terms(vec!["Remix".to_string()]);
    let draft = ContentDraft::new(
        Platform::Mastodon,
        "",
        "Rebuilt the settings page with Remix over the weekend.",
    );
    assert!(validate(&draft, &ctx).has_rule("stack_terms"));
}

#[test]
fn listicle_titles_are_rejected() {
    let ctx = ValidationContext::new(Platform::Devto, YEAR);
    let draft = ContentDraft::new(Platform::Devto, "Top 5 caching tricks", article_body());
    let result = validate(&draft, &ctx);
    assert!(result.has_rule("title_pattern"));
}

#[test]
fn near_duplicate_titles_are_rejected() {
    let ctx = ValidationContext::new(Platform::Devto, YEAR)
        .with_previous_titles(vec!["Caching at the edge".to_string()]);
    let draft = ContentDraft::new(Platform::Devto, "Caching at the edges", article_body());
    assert!(validate(&draft, &ctx).has_rule("title_reuse"));
}

#[test]
fn every_error_is_reported_together() {
    let ctx = ValidationContext::new(Platform::Devto, YEAR);
    let draft = ContentDraft::new(
        Platform::Devto,
        "Top 5 lessons from 2024",
        "A revolutionary fix. TODO: finish this.",
    );
    let result = validate(&draft, &ctx);
    for rule in ["min_length", "hype", "placeholder", "title_pattern", "title_stale_year"] {
        assert!(result.has_rule(rule), "missing {rule}: {:?}", result.errors);
    }
}

#[test]
fn same_draft_validates_identically() {
    let ctx = ValidationContext::new(Platform::Devto, YEAR)
        .with_previous_titles(vec!["Caching at the edge".to_string()]);
    let draft = ContentDraft::new(Platform::Devto, "Caching at the edges in 2025", "TODO");
    let first = validate(&draft, &ctx);
    let second = validate(&draft, &ctx);
    assert!(!first.findings.is_empty());
    assert_eq!(first, second);
}
