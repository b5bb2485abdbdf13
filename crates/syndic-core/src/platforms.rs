//! Static per-platform constraints.
//!
//! A [`PlatformProfile`] tells the validator which rule groups apply, tells the
//! gate which interval to enforce, and tells the pipeline which angle list to
//! rotate and whether rejected drafts are archived.

use chrono::NaiveDate;
use serde::Serialize;
use syndic_state::{Category, Entity, Platform};
use unicode_segmentation::UnicodeSegmentation;

use crate::angles::{Angle, ARTICLE_ANGLES, SHORT_POST_ANGLES, TUTORIAL_ANGLES};
use crate::domain::ContentKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    Chars,
    Graphemes,
}

impl LengthUnit {
    pub fn measure(&self, text: &str) -> usize {
        match self {
            LengthUnit::Chars => text.chars().count(),
            LengthUnit::Graphemes => text.graphemes(true).count(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LengthUnit::Chars => "characters",
            LengthUnit::Graphemes => "graphemes",
        }
    }
}

pub const ZENN_FRONT_MATTER: &[&str] = &["title", "emoji", "type", "topics", "published"];
pub const BLOG_FRONT_MATTER: &[&str] = &[
    "title",
    "titleJa",
    "slug",
    "date",
    "tags",
    "description",
    "descriptionJa",
    "project",
    "published",
];

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PlatformProfile {
    pub platform: Platform,
    pub kind: ContentKind,
    pub length_unit: LengthUnit,
    pub min_len: Option<usize>,
    /// Inclusive upper bound on the body.
    pub max_len: Option<usize>,
    pub max_tags: usize,
    pub min_code_blocks: Option<usize>,
    /// Required front-matter keys; `None` for platforms without front matter.
    pub front_matter: Option<&'static [&'static str]>,
    /// Written in a peer's voice; stack and technology names are banned.
    pub peer_voice: bool,
    pub allow_links: bool,
    /// Minimum days between posts to the same sub-destination.
    pub min_interval_days: Option<i64>,
    pub archive_rejected: bool,
    #[serde(skip)]
    pub angles: &'static [Angle],
    /// Whether a publisher exists for this platform at all.
    pub publishes: bool,
}

const LONG_FORM_MIN: usize = 3000;

const fn base(platform: Platform, kind: ContentKind) -> PlatformProfile {
    PlatformProfile {
        platform,
        kind,
        length_unit: LengthUnit::Chars,
        min_len: None,
        max_len: None,
        max_tags: 0,
        min_code_blocks: None,
        front_matter: None,
        peer_voice: false,
        allow_links: true,
        min_interval_days: None,
        archive_rejected: false,
        angles: &[],
        publishes: true,
    }
}

const fn long_form(platform: Platform, max_tags: usize, angles: &'static [Angle]) -> PlatformProfile {
    PlatformProfile {
        min_len: Some(LONG_FORM_MIN),
        max_tags,
        archive_rejected: true,
        angles,
        ..base(platform, ContentKind::LongForm)
    }
}

const fn short_form(platform: Platform, unit: LengthUnit, limit: usize) -> PlatformProfile {
    PlatformProfile {
        length_unit: unit,
        max_len: Some(limit),
        peer_voice: true,
        angles: SHORT_POST_ANGLES,
        ..base(platform, ContentKind::ShortForm)
    }
}

pub fn profile_for(platform: Platform) -> PlatformProfile {
    match platform {
        Platform::Twitter => short_form(platform, LengthUnit::Chars, 280),
        Platform::Bluesky => short_form(platform, LengthUnit::Graphemes, 300),
        Platform::Mastodon => short_form(platform, LengthUnit::Chars, 500),
        Platform::Devto => long_form(platform, 4, ARTICLE_ANGLES),
        Platform::Hashnode => long_form(platform, 5, ARTICLE_ANGLES),
        Platform::Qiita => PlatformProfile {
            min_code_blocks: Some(2),
            ..long_form(platform, 5, TUTORIAL_ANGLES)
        },
        Platform::Zenn => PlatformProfile {
            min_code_blocks: Some(2),
            front_matter: Some(ZENN_FRONT_MATTER),
            ..long_form(platform, 5, TUTORIAL_ANGLES)
        },
        Platform::Blog => PlatformProfile {
            front_matter: Some(BLOG_FRONT_MATTER),
            ..long_form(platform, 4, &[])
        },
        Platform::Reddit => PlatformProfile {
            min_len: Some(1500),
            max_len: Some(40_000),
            allow_links: false,
            min_interval_days: Some(14),
            archive_rejected: true,
            ..base(platform, ContentKind::Community)
        },
        Platform::GithubReleases => PlatformProfile {
            publishes: false,
            ..base(platform, ContentKind::LongForm)
        },
    }
}

/// Idempotence key for one entity on one platform on one day.
pub fn content_reference(slug: &str, date: NaiveDate) -> String {
    format!("{}-{}", date.format("%Y-%m-%d"), slug)
}

// ---------------------------------------------------------------------------
// Community destinations
// ---------------------------------------------------------------------------

pub fn subreddits_for(category: Category) -> &'static [&'static str] {
    match category {
        Category::Crypto => &["cryptocurrency", "CryptoTechnology", "algotrading"],
        Category::Tool => &["sideproject", "webdev"],
        Category::Saas => &["sideproject", "SaaS"],
        Category::Platform => &["sideproject", "webdev"],
        Category::Other => &["sideproject"],
    }
}

/// Rotate through the category's subreddits by the entity's Reddit post count.
pub fn select_subreddit(category: Category, posted_count: usize) -> &'static str {
    let list = subreddits_for(category);
    list[posted_count % list.len()]
}

pub fn subreddit_guidance(subreddit: &str) -> &'static str {
    match subreddit {
        "cryptocurrency" => "Focus on market analysis findings and data-driven insights. Share specific patterns or anomalies you discovered. The tool is mentioned only as \"the analysis method I used\", never as a product recommendation.",
        "CryptoTechnology" => "Focus on the technical implementation of crypto-related analysis. Discuss algorithms, data processing approaches, and architecture decisions. This is a technical audience.",
        "algotrading" => "Focus purely on the algorithm and methodology. Share specific technical decisions (indicators used, thresholds, backtesting results). The audience cares about methodology, not products.",
        "webdev" => "Focus on the web development aspects: architecture decisions, framework choices, performance optimizations. Share code snippets and technical insights relevant to web developers.",
        "SaaS" => "Discuss the business and technical aspects of building a SaaS product. Share metrics, user feedback, technical architecture decisions, and lessons from the journey.",
        _ => "Write in honest \"Show HN\" style. Share what you built, what challenges you faced, what metrics you have so far, and what you'd do differently. Be candid about both successes and failures.",
    }
}

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

fn devto_tags(category: Category) -> &'static [&'static str] {
    match category {
        Category::Crypto => &["crypto", "javascript", "webdev", "opensource"],
        Category::Tool => &["opensource", "productivity", "webdev", "tutorial"],
        Category::Saas => &["saas", "webdev", "startup", "javascript"],
        Category::Platform | Category::Other => &["webdev", "opensource", "javascript", "tutorial"],
    }
}

/// Lowercase, hyphen-separated slug.
pub fn slugify(raw: &str) -> String {
    let mut out = String::new();
    for ch in raw.trim().to_lowercase().chars() {
        if ch.is_alphanumeric() {
            out.push(ch);
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}

fn alnum_lower(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

fn dedup_nonempty(tags: impl IntoIterator<Item = String>, max: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for t in tags {
        if !t.is_empty() && !out.contains(&t) {
            out.push(t);
        }
        if out.len() == max {
            break;
        }
    }
    out
}

/// Platform-shaped tags for an entity, capped at the profile's `max_tags`.
pub fn tags_for(platform: Platform, entity: &Entity) -> Vec<String> {
    let max = profile_for(platform).max_tags;
    match platform {
        Platform::Devto => dedup_nonempty(
            devto_tags(entity.category).iter().map(|t| alnum_lower(t)),
            max,
        ),
        Platform::Qiita => dedup_nonempty(
            entity.tech_stack.iter().map(|t| t.trim().replace(' ', "")),
            max,
        ),
        Platform::Zenn => dedup_nonempty(entity.tech_stack.iter().map(|t| alnum_lower(t)), max),
        Platform::Hashnode => dedup_nonempty(entity.tags.iter().map(|t| slugify(t)), max),
        Platform::Blog => dedup_nonempty(entity.tags.iter().cloned(), max),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bluesky_counts_graphemes() {
        let family = "👨‍👩‍👧";
        assert_eq!(LengthUnit::Graphemes.measure(family), 1);
        assert!(LengthUnit::Chars.measure(family) > 1);
    }

    #[test]
    fn subreddit_rotation_wraps() {
        assert_eq!(select_subreddit(Category::Crypto, 0), "cryptocurrency");
        assert_eq!(select_subreddit(Category::Crypto, 2), "algotrading");
        assert_eq!(select_subreddit(Category::Crypto, 3), "cryptocurrency");
        assert_eq!(select_subreddit(Category::Other, 7), "sideproject");
    }

    #[test]
    fn devto_tags_follow_category() {
        let entity = Entity {
            category: Category::Saas,
            ..Entity::default()
        };
        assert_eq!(
            tags_for(Platform::Devto, &entity),
            vec!["saas", "webdev", "startup", "javascript"]
        );
    }

    #[test]
    fn qiita_tags_cap_at_five() {
        let entity = Entity {
            tech_stack: ["Next.js", "Type Script", "Rust", "Rust", "Go", "Deno", "Bun"]
                .map(String::from)
                .to_vec(),
            ..Entity::default()
        };
        assert_eq!(
            tags_for(Platform::Qiita, &entity),
            vec!["Next.js", "TypeScript", "Rust", "Go", "Deno"]
        );
    }

    #[test]
    fn hashnode_tags_are_slugs() {
        assert_eq!(slugify("  Web Dev / Tools "), "web-dev-tools");
    }

    #[test]
    fn content_reference_is_dated() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(content_reference("alpha", date), "2026-10-18-alpha");
    }

    #[test]
    fn only_github_releases_lacks_a_publisher() {
        for p in Platform::ALL {
            assert_eq!(profile_for(p).publishes, p != Platform::GithubReleases);
        }
    }
}
