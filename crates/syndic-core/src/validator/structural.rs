//! Front matter, presence and placeholder checks.

use once_cell::sync::Lazy;
use regex::Regex;

use super::text::prose;
use super::ValidationContext;
use crate::domain::ContentDraft;
use crate::generator::parse;

static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\[\]\n]{1,80})\]").unwrap());
static MARKERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(TODO|FIXME|TBD|XXX)\b").unwrap());
static LOREM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)lorem ipsum").unwrap());
static OMISSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[(（]\s*(以下)?略\s*[)）]").unwrap());

pub(super) fn front_matter_keys(draft: &ContentDraft, ctx: &ValidationContext) -> Vec<String> {
    let Some(required) = ctx.profile.front_matter else {
        return Vec::new();
    };
    match parse::front_matter(&draft.body) {
        None => vec!["missing front matter block (--- ... ---) at the top".to_string()],
        Some(fields) => required
            .iter()
            .filter(|key| !fields.contains_key(**key))
            .map(|key| format!("front matter is missing `{key}`"))
            .collect(),
    }
}

pub(super) fn published_flag(draft: &ContentDraft, _ctx: &ValidationContext) -> Vec<String> {
    match parse::front_matter(&draft.body) {
        // Reported by the front matter rule.
        None => Vec::new(),
        Some(fields) if fields.get("published").map(String::as_str) == Some("true") => Vec::new(),
        Some(_) => vec!["front matter must set `published: true`".to_string()],
    }
}

pub(super) fn title_present(draft: &ContentDraft, _ctx: &ValidationContext) -> Vec<String> {
    if draft.title.trim().is_empty() {
        vec!["title is empty".to_string()]
    } else {
        Vec::new()
    }
}

pub(super) fn body_present(draft: &ContentDraft, _ctx: &ValidationContext) -> Vec<String> {
    if parse::strip_front_matter(&draft.body).trim().is_empty() {
        vec!["body is empty".to_string()]
    } else {
        Vec::new()
    }
}

fn is_fill_in(inner: &str) -> bool {
    let inner = inner.trim();
    if inner.is_empty() || inner.eq_ignore_ascii_case("x") {
        // Task-list checkboxes.
        return false;
    }
    if inner.starts_with('^') || inner.chars().all(|c| c.is_ascii_digit()) {
        // Footnotes and numeric citations.
        return false;
    }
    true
}

fn bracket_fill_ins(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    for caps in BRACKETED.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        // Markdown links, reference links and link definitions.
        let next = text[whole.end()..].chars().next();
        if matches!(next, Some('(') | Some('[') | Some(':')) {
            continue;
        }
        if whole.start() > 0 && text[..whole.start()].ends_with('!') {
            continue;
        }
        if is_fill_in(inner.as_str()) {
            found.push(whole.as_str().to_string());
        }
    }
    found
}

fn truncated(text: &str) -> bool {
    let is_ellipsis = |s: &str| matches!(s.trim(), "..." | "…" | "……");
    if text.lines().any(is_ellipsis) || OMISSION.is_match(text) {
        return true;
    }
    let end = text.trim_end();
    end.ends_with("...") || end.ends_with('…')
}

pub(super) fn placeholders(draft: &ContentDraft, _ctx: &ValidationContext) -> Vec<String> {
    let mut errors = Vec::new();
    for text in [draft.title.as_str(), draft.body.as_str()] {
        let clean = prose(text);
        for fill_in in bracket_fill_ins(&clean) {
            errors.push(format!("unfilled placeholder {fill_in}"));
        }
        for m in MARKERS.find_iter(&clean) {
            errors.push(format!("leftover {} marker", m.as_str()));
        }
        if LOREM.is_match(&clean) {
            errors.push("filler text (lorem ipsum)".to_string());
        }
        if truncated(&clean) {
            errors.push("text looks truncated (trailing or standalone ellipsis)".to_string());
        }
        if text.contains("<!--") {
            errors.push("HTML comment left in the text".to_string());
        }
    }
    errors.dedup();
    errors
}

pub(super) fn blog_link(draft: &ContentDraft, _ctx: &ValidationContext) -> Vec<String> {
    if draft.body.contains("/blog/") {
        Vec::new()
    } else {
        vec!["no link back to the blog article".to_string()]
    }
}
