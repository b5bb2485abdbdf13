//! Topical bans: rankings, made-up scores, hype, promotion, stack names, links.

use once_cell::sync::Lazy;
use regex::Regex;

use super::text::{contains_term, prose};
use super::ValidationContext;
use crate::domain::ContentDraft;

pub(super) static LISTICLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\btop\s*\d+\b|\b\d+\s+best\b|\bbest\s+\d+\b|\branking\b|\d+\s*選|ランキング|トップ\s*\d+|ベスト\s*\d+",
    )
    .unwrap()
});

static SCORES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)[★☆⭐]{2,}|\b\d(?:\.\d)?\s*(?:/|out of)\s*(?:5|10)\s*stars?\b|\b\d(?:\.\d)?\s*stars?\b|\b(?:rating|score|rated)\s*[:：]?\s*\d+(?:\.\d+)?\s*/\s*\d+|(?:評価|スコア|点数)\s*[:：]?\s*\d+(?:\.\d+)?",
    )
    .unwrap()
});

static HYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:game[- ]?changer|revolutionary|revolutioni[sz]e[sd]?|mind[- ]?blowing|must[- ]have|best[- ]ever|world[- ]class|next[- ]level|blazing(?:ly)?[- ]fast|10x (?:faster|better|developer)|check it out|sign up (?:now|today|for free)|download (?:it )?now|don't miss(?: out)?|link in bio|limited time)\b|革命的|神ツール|最強|圧倒的|爆速|今すぐ(?:ダウンロード|登録|チェック)|ぜひ使ってみてください",
    )
    .unwrap()
});

static COMMUNITY_PROMO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:try it|download|sign up|subscribe|free trial|use my code|upvote)\b")
        .unwrap()
});

static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bhttps?://|\bwww\.[a-z0-9-]+\.[a-z]").unwrap());

static HASHTAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\s)#[^\s#]+").unwrap());

/// Technology names that peer-voice posts must never mention, on top of the
/// entity's own stack.
pub const COMMON_STACK_TERMS: &[&str] = &[
    "TypeScript",
    "JavaScript",
    "React",
    "Next.js",
    "Vue",
    "Svelte",
    "Node.js",
    "Python",
    "Django",
    "Rails",
    "Docker",
    "Kubernetes",
    "GraphQL",
    "PostgreSQL",
    "Supabase",
    "Firebase",
    "Tailwind",
    "Vercel",
    "AWS",
];

const MAX_HASHTAGS: usize = 3;

fn matches_in(re: &Regex, draft: &ContentDraft) -> Vec<String> {
    let mut hits: Vec<String> = Vec::new();
    for text in [draft.title.as_str(), draft.body.as_str()] {
        for m in re.find_iter(&prose(text)) {
            let hit = m.as_str().trim().to_string();
            if !hits.contains(&hit) {
                hits.push(hit);
            }
        }
    }
    hits
}

pub(super) fn listicle(draft: &ContentDraft, _ctx: &ValidationContext) -> Vec<String> {
    matches_in(&LISTICLE, draft)
        .into_iter()
        .map(|hit| format!("ranking or listicle format (\"{hit}\")"))
        .collect()
}

pub(super) fn fabricated_scores(draft: &ContentDraft, _ctx: &ValidationContext) -> Vec<String> {
    matches_in(&SCORES, draft)
        .into_iter()
        .map(|hit| format!("score or star rating (\"{hit}\")"))
        .collect()
}

pub(super) fn hype(draft: &ContentDraft, _ctx: &ValidationContext) -> Vec<String> {
    matches_in(&HYPE, draft)
        .into_iter()
        .map(|hit| format!("promotional or hype phrasing (\"{hit}\")"))
        .collect()
}

pub(super) fn community_promo(draft: &ContentDraft, _ctx: &ValidationContext) -> Vec<String> {
    matches_in(&COMMUNITY_PROMO, draft)
        .into_iter()
        .map(|hit| format!("call to action not allowed in community posts (\"{hit}\")"))
        .collect()
}

pub(super) fn stack_terms(draft: &ContentDraft, ctx: &ValidationContext) -> Vec<String> {
    let text = format!("{}\n{}", draft.title, draft.body);
    let mut hits: Vec<String> = Vec::new();
    let terms = ctx
        .stack_terms
        .iter()
        .map(String::as_str)
        .chain(COMMON_STACK_TERMS.iter().copied());
    for term in terms {
        let term = term.trim();
        if term.chars().count() < 2 || hits.iter().any(|h| h.eq_ignore_ascii_case(term)) {
            continue;
        }
        if contains_term(&text, term) {
            hits.push(term.to_string());
        }
    }
    hits.into_iter()
        .map(|t| format!("technology name \"{t}\" in a peer-voice post"))
        .collect()
}

pub(super) fn links(draft: &ContentDraft, _ctx: &ValidationContext) -> Vec<String> {
    if LINK.is_match(&draft.body) {
        vec!["links are not allowed; describe the project instead".to_string()]
    } else {
        Vec::new()
    }
}

pub(super) fn hashtag_count(draft: &ContentDraft, _ctx: &ValidationContext) -> Vec<String> {
    let count = HASHTAG.find_iter(&draft.body).count();
    if count == 0 {
        vec!["no hashtags".to_string()]
    } else if count > MAX_HASHTAGS {
        vec![format!("{count} hashtags, more than {MAX_HASHTAGS}")]
    } else {
        Vec::new()
    }
}
