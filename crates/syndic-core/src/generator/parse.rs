//! Parsing raw generator output. Nothing here fails: malformed output becomes
//! an empty title or an unstructured body, and the validator decides.

use std::collections::BTreeMap;

use crate::domain::{ContentDraft, ContentKind};
use crate::platforms::PlatformProfile;

pub const TITLE_MARKER: &str = "TITLE:";
pub const VARIANT_DELIMITER: &str = "---VARIANT---";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedContent {
    pub title: String,
    pub body: String,
}

/// Split `TITLE: ...` / blank line / body.
///
/// Without the marker on the first line the whole response is the body and
/// the title is empty.
pub fn parse_titled(raw: &str) -> ParsedContent {
    let raw = raw.trim_start_matches('\u{feff}');
    let (first, rest) = match raw.split_once('\n') {
        Some((first, rest)) => (first, rest),
        None => (raw, ""),
    };
    let first_trimmed = first.trim();
    match first_trimmed.strip_prefix(TITLE_MARKER) {
        Some(title) => {
            let body = rest
                .strip_prefix("\r\n")
                .or_else(|| rest.strip_prefix('\n'))
                .unwrap_or(rest);
            ParsedContent {
                title: title.trim().to_string(),
                body: body.trim_end().to_string(),
            }
        }
        None => ParsedContent {
            title: String::new(),
            body: raw.trim().to_string(),
        },
    }
}

/// Split a multi-variant response on delimiter lines. Empty segments are dropped.
pub fn split_variants(raw: &str) -> Vec<String> {
    let mut variants = Vec::new();
    let mut current = String::new();
    for line in raw.lines() {
        if line.trim() == VARIANT_DELIMITER {
            variants.push(std::mem::take(&mut current));
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    variants.push(current);
    variants
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// First variant of a short post, or the whole trimmed text.
pub fn first_variant(raw: &str) -> String {
    split_variants(raw)
        .into_iter()
        .next()
        .unwrap_or_default()
}

/// Drop a single code fence wrapped around the entire response.
pub fn unwrap_outer_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") || !trimmed.ends_with("```") || trimmed.len() < 6 {
        return raw;
    }
    let Some((_, inner)) = trimmed.split_once('\n') else {
        return raw;
    };
    let inner = inner.trim_end().trim_end_matches("```");
    // Only unwrap when no other fences remain inside.
    if inner.contains("```") {
        raw
    } else {
        inner.trim_end()
    }
}

/// Flat `key: value` front matter between leading `---` lines.
///
/// Returns `None` when the document does not open with a closed front-matter
/// block. Values keep their raw text minus surrounding quotes.
pub fn front_matter(doc: &str) -> Option<BTreeMap<String, String>> {
    let doc = doc.trim_start_matches('\u{feff}').trim_start();
    let mut lines = doc.lines();
    if lines.next()?.trim() != "---" {
        return None;
    }
    let mut fields = BTreeMap::new();
    for line in lines {
        if line.trim() == "---" {
            return Some(fields);
        }
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            if key.is_empty() || key.starts_with('#') || line.starts_with(' ') {
                continue;
            }
            fields.insert(key.to_string(), unquote(value.trim()).to_string());
        }
    }
    None
}

fn unquote(v: &str) -> &str {
    let stripped = v
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| v.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')));
    stripped.unwrap_or(v)
}

/// Body text after the front-matter block (the whole doc if there is none).
pub fn strip_front_matter(doc: &str) -> &str {
    let trimmed = doc.trim_start();
    let Some(rest) = trimmed.strip_prefix("---") else {
        return doc;
    };
    match rest.find("\n---") {
        Some(end) => {
            let after = &rest[end + 4..];
            after.trim_start_matches(['\r', '\n'])
        }
        None => doc,
    }
}

/// Shape raw generator text into a draft for `profile`.
///
/// Front-matter platforms keep the whole document as the body and lift the
/// title out of the front matter; titled kinds split on the title marker;
/// short posts keep the first variant.
pub fn draft_from_text(profile: &PlatformProfile, raw: &str) -> ContentDraft {
    let text = unwrap_outer_fence(raw);
    if profile.front_matter.is_some() {
        let body = text.trim().to_string();
        let title = front_matter(&body)
            .and_then(|mut fields| fields.remove("title"))
            .unwrap_or_default();
        return ContentDraft::new(profile.platform, title, body);
    }
    match profile.kind {
        ContentKind::LongForm | ContentKind::Community => {
            let parsed = parse_titled(text);
            ContentDraft::new(profile.platform, parsed.title, parsed.body)
        }
        ContentKind::ShortForm => ContentDraft::new(profile.platform, "", first_variant(text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn title_marker_splits_title_and_body() {
        let parsed = parse_titled("TITLE: Caching at the edge\n\nFirst paragraph.\n\nSecond.");
        assert_eq!(parsed.title, "Caching at the edge");
        assert_eq!(parsed.body, "First paragraph.\n\nSecond.");
    }

    #[test]
    fn missing_marker_keeps_everything_as_body() {
        let parsed = parse_titled("Just some text\nwith lines");
        assert_eq!(parsed.title, "");
        assert_eq!(parsed.body, "Just some text\nwith lines");
    }

    #[test]
    fn marker_without_blank_line_keeps_second_line() {
        let parsed = parse_titled("TITLE: T\nbody starts here");
        assert_eq!(parsed.title, "T");
        assert_eq!(parsed.body, "body starts here");
    }

    #[test]
    fn empty_input_never_panics() {
        assert_eq!(parse_titled("").title, "");
        assert!(split_variants("").is_empty());
        assert_eq!(first_variant(""), "");
    }

    #[test]
    fn variants_split_on_delimiter_lines() {
        let raw = "first post\n---VARIANT---\nsecond post\n  ---VARIANT---  \n\n";
        assert_eq!(split_variants(raw), vec!["first post", "second post"]);
        assert_eq!(first_variant(raw), "first post");
    }

    #[test]
    fn front_matter_fields_are_unquoted() {
        let doc = "---\ntitle: \"Edge caching\"\nemoji: \"⚡\"\ntype: \"tech\"\ntopics: [\"rust\"]\npublished: true\n---\n\nBody";
        let fm = front_matter(doc).unwrap();
        assert_eq!(fm["title"], "Edge caching");
        assert_eq!(fm["published"], "true");
        assert_eq!(fm["topics"], "[\"rust\"]");
        assert_eq!(strip_front_matter(doc), "Body");
    }

    #[test]
    fn unclosed_front_matter_is_none() {
        assert!(front_matter("---\ntitle: x\n").is_none());
        assert!(front_matter("title: x\n---\n").is_none());
    }

    #[test]
    fn drafts_follow_the_platform_shape() {
        use crate::platforms::profile_for;
        use syndic_state::Platform;

        let zenn = draft_from_text(
            &profile_for(Platform::Zenn),
            "---\ntitle: \"Edge caching\"\npublished: true\n---\nBody",
        );
        assert_eq!(zenn.title, "Edge caching");
        assert!(zenn.body.starts_with("---"));

        let devto = draft_from_text(&profile_for(Platform::Devto), "TITLE: T\n\nBody");
        assert_eq!((devto.title.as_str(), devto.body.as_str()), ("T", "Body"));

        let post = draft_from_text(
            &profile_for(Platform::Bluesky),
            "one\n---VARIANT---\ntwo",
        );
        assert_eq!((post.title.as_str(), post.body.as_str()), ("", "one"));
    }

    #[test]
    fn outer_fence_is_unwrapped_once() {
        assert_eq!(unwrap_outer_fence("```markdown\nhello\n```"), "hello");
        let nested = "```\na\n```\ntext\n```\nb\n```";
        assert_eq!(unwrap_outer_fence(nested), nested);
    }
}
