//! Title policy: banned shapes and reuse of earlier titles.

use once_cell::sync::Lazy;
use regex::Regex;

use super::text::title_similarity;
use super::topical::LISTICLE;
use super::{ValidationContext, NEAR_DUPLICATE_THRESHOLD};
use crate::domain::ContentDraft;

static BANNED_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:introducing|announcing)\b|\b(?:ultimate|complete|definitive)\s+guide\b|\byou won't believe\b|\beverything you need to know\b|完全(?:ガイド|版|解説)|徹底(?:解説|比較)|決定版|まとめ\s*$",
    )
    .unwrap()
});

pub(super) fn banned_patterns(draft: &ContentDraft, _ctx: &ValidationContext) -> Vec<String> {
    let mut errors = Vec::new();
    for re in [&*BANNED_TITLE, &*LISTICLE] {
        if let Some(m) = re.find(&draft.title) {
            errors.push(format!("title uses a banned pattern (\"{}\")", m.as_str().trim()));
        }
    }
    errors
}

pub(super) fn reuse(draft: &ContentDraft, ctx: &ValidationContext) -> Vec<String> {
    if draft.title.trim().is_empty() {
        return Vec::new();
    }
    let closest = ctx
        .previous_titles
        .iter()
        .map(|prev| (prev, title_similarity(&draft.title, prev)))
        .max_by(|a, b| a.1.total_cmp(&b.1));
    match closest {
        Some((prev, score)) if score >= 1.0 => {
            vec![format!("title was already used: \"{prev}\"")]
        }
        Some((prev, score)) if score >= NEAR_DUPLICATE_THRESHOLD => {
            vec![format!(
                "title is a near-duplicate of \"{prev}\" (similarity {score:.2})"
            )]
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syndic_state::Platform;

    fn ctx_with(titles: &[&str]) -> ValidationContext {
        ValidationContext::new(Platform::Devto, 2026)
            .with_previous_titles(titles.iter().map(|t| t.to_string()).collect())
    }

    #[test]
    fn banned_shapes() {
        let ctx = ctx_with(&[]);
        let d = |t: &str| ContentDraft::new(Platform::Devto, t, "");
        assert_eq!(banned_patterns(&d("Introducing Acme"), &ctx).len(), 1);
        assert_eq!(banned_patterns(&d("The Ultimate Guide to caching"), &ctx).len(), 1);
        assert_eq!(banned_patterns(&d("Top 5 caching tricks"), &ctx).len(), 1);
        assert!(banned_patterns(&d("Why our cache kept missing"), &ctx).is_empty());
    }

    #[test]
    fn exact_and_near_duplicates_are_rejected() {
        let ctx = ctx_with(&["How I cut build times in half", "Unrelated story"]);
        let exact = ContentDraft::new(Platform::Devto, "how I cut build times in half!", "");
        assert!(reuse(&exact, &ctx)[0].contains("already used"));
        let near = ContentDraft::new(Platform::Devto, "How I cut build times in half again", "");
        assert!(reuse(&near, &ctx)[0].contains("near-duplicate"));
        let fresh = ContentDraft::new(Platform::Devto, "Profiling a slow test suite", "");
        assert!(reuse(&fresh, &ctx).is_empty());
    }
}
