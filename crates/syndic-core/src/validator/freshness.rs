//! Stale-year checks. Code is excluded: version strings and sample data are
//! not claims about when something happened.

use super::text::{prose, stale_years};
use super::ValidationContext;
use crate::domain::ContentDraft;

fn describe(years: Vec<i32>, current_year: i32, place: &str) -> Vec<String> {
    years
        .into_iter()
        .map(|y| format!("{place} mentions {y}, before the current year {current_year}"))
        .collect()
}

pub(super) fn stale_year_in_body(draft: &ContentDraft, ctx: &ValidationContext) -> Vec<String> {
    describe(
        stale_years(&prose(&draft.body), ctx.current_year),
        ctx.current_year,
        "body",
    )
}

pub(super) fn stale_year_in_title(draft: &ContentDraft, ctx: &ValidationContext) -> Vec<String> {
    describe(
        stale_years(&draft.title, ctx.current_year),
        ctx.current_year,
        "title",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use syndic_state::Platform;

    #[test]
    fn last_year_in_title_is_stale_this_year_is_not() {
        let ctx = ValidationContext::new(Platform::Devto, 2026);
        let stale = ContentDraft::new(Platform::Devto, "What I learned in 2025", "");
        assert_eq!(
            stale_year_in_title(&stale, &ctx),
            vec!["title mentions 2025, before the current year 2026"]
        );
        let fresh = ContentDraft::new(Platform::Devto, "What I learned in 2026", "");
        assert!(stale_year_in_title(&fresh, &ctx).is_empty());
    }

    #[test]
    fn years_inside_code_do_not_count() {
        let ctx = ValidationContext::new(Platform::Qiita, 2026);
        let draft = ContentDraft::new(
            Platform::Qiita,
            "t",
            "```toml\nedition = \"2021\"\n```\n`2018` aside, this shipped in 2026.",
        );
        assert!(stale_year_in_body(&draft, &ctx).is_empty());
    }
}
