//! Length and code-content checks.

use super::text::code_block_count;
use super::ValidationContext;
use crate::domain::ContentDraft;
use crate::generator::parse;

const COMMUNITY_TITLE_MAX: usize = 300;
const VERY_LONG_CHARS: usize = 20_000;

fn measured_body(draft: &ContentDraft, ctx: &ValidationContext) -> usize {
    ctx.profile
        .length_unit
        .measure(parse::strip_front_matter(&draft.body).trim())
}

pub(super) fn min_length(draft: &ContentDraft, ctx: &ValidationContext) -> Vec<String> {
    let Some(min) = ctx.profile.min_len else {
        return Vec::new();
    };
    let len = measured_body(draft, ctx);
    if len < min {
        vec![format!(
            "body is {len} {unit}, below the minimum of {min} by {}",
            min - len,
            unit = ctx.profile.length_unit.name()
        )]
    } else {
        Vec::new()
    }
}

/// Inclusive limit: a body of exactly `max` units passes.
pub(super) fn max_length(draft: &ContentDraft, ctx: &ValidationContext) -> Vec<String> {
    let Some(max) = ctx.profile.max_len else {
        return Vec::new();
    };
    let len = measured_body(draft, ctx);
    if len > max {
        vec![format!(
            "text is {len} {unit}, exceeds the limit of {max} by {}",
            len - max,
            unit = ctx.profile.length_unit.name()
        )]
    } else {
        Vec::new()
    }
}

pub(super) fn community_title_length(draft: &ContentDraft, _ctx: &ValidationContext) -> Vec<String> {
    let len = draft.title.chars().count();
    if len > COMMUNITY_TITLE_MAX {
        vec![format!(
            "title is {len} characters, exceeds the {COMMUNITY_TITLE_MAX}-character limit"
        )]
    } else {
        Vec::new()
    }
}

pub(super) fn code_blocks(draft: &ContentDraft, ctx: &ValidationContext) -> Vec<String> {
    let Some(min) = ctx.profile.min_code_blocks else {
        return Vec::new();
    };
    let found = code_block_count(&draft.body);
    if found < min {
        vec![format!(
            "{found} fenced code block(s), at least {min} required"
        )]
    } else {
        Vec::new()
    }
}

pub(super) fn very_long(draft: &ContentDraft, _ctx: &ValidationContext) -> Vec<String> {
    let len = draft.body.chars().count();
    if len > VERY_LONG_CHARS {
        vec![format!("body is {len} characters; consider tightening it")]
    } else {
        Vec::new()
    }
}
