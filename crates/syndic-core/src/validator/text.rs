//! Text helpers shared by the rule groups.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::generator::parse;

static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`[^`\n]*`").unwrap());
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

fn is_fence(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("```") || t.starts_with("~~~")
}

/// Number of fenced code blocks: fence marker lines divided by two.
pub fn code_block_count(text: &str) -> usize {
    text.lines().filter(|l| is_fence(l)).count() / 2
}

/// Prose only: front matter, fenced blocks and inline code removed.
pub fn prose(text: &str) -> String {
    let body = parse::strip_front_matter(text);
    let mut out = String::with_capacity(body.len());
    let mut in_fence = false;
    for line in body.lines() {
        if is_fence(line) {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        out.push_str(&INLINE_CODE.replace_all(line, " "));
        out.push('\n');
    }
    out
}

/// Four-digit years in `text` strictly before `current_year`, in order of
/// appearance, without repeats.
///
/// Digit runs are scanned whole so a year glued to CJK text (`2024年`) is still
/// found while longer numbers (`120245`) are not.
pub fn stale_years(text: &str, current_year: i32) -> Vec<i32> {
    let mut seen = Vec::new();
    for m in DIGITS.find_iter(text) {
        let run = m.as_str();
        if run.len() != 4 || !(run.starts_with("19") || run.starts_with("20")) {
            continue;
        }
        if let Ok(year) = run.parse::<i32>() {
            if year < current_year && !seen.contains(&year) {
                seen.push(year);
            }
        }
    }
    seen
}

/// Lowercased alphanumeric characters only.
pub fn normalize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn bigrams(s: &str) -> HashSet<(char, char)> {
    let chars: Vec<char> = s.chars().collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

/// Character-bigram Jaccard similarity of two normalized titles.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let (na, nb) = (normalize_title(a), normalize_title(b));
    if na == nb {
        return 1.0;
    }
    let (ba, bb) = (bigrams(&na), bigrams(&nb));
    if ba.is_empty() || bb.is_empty() {
        return 0.0;
    }
    let inter = ba.intersection(&bb).count() as f64;
    let union = ba.union(&bb).count() as f64;
    inter / union
}

/// Case-insensitive whole-word search for an ASCII-ish term.
pub fn contains_term(haystack: &str, term: &str) -> bool {
    let pattern = format!(
        r"(?i)(?:^|[^A-Za-z0-9_]){}(?:$|[^A-Za-z0-9_])",
        regex::escape(term)
    );
    Regex::new(&pattern)
        .map(|re| re.is_match(haystack))
        .unwrap_or(false)
}
