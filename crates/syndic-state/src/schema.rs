//! Catalog schema: promotable entities as stored in `content/projects/<slug>.json`.
//!
//! Field names follow the on-disk camelCase layout. Every optional field has a
//! serde default so hand-written catalog files with missing keys still load.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

/// Publication destinations known to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Twitter,
    Zenn,
    Qiita,
    Blog,
    Devto,
    Reddit,
    Bluesky,
    Mastodon,
    Hashnode,
    GithubReleases,
}

impl Platform {
    pub const ALL: [Platform; 10] = [
        Platform::Twitter,
        Platform::Zenn,
        Platform::Qiita,
        Platform::Blog,
        Platform::Devto,
        Platform::Reddit,
        Platform::Bluesky,
        Platform::Mastodon,
        Platform::Hashnode,
        Platform::GithubReleases,
    ];

    /// Platforms enabled for an entity whose schedule does not list any.
    pub const DEFAULT_ENABLED: [Platform; 8] = [
        Platform::Qiita,
        Platform::Zenn,
        Platform::Devto,
        Platform::Hashnode,
        Platform::Bluesky,
        Platform::Mastodon,
        Platform::GithubReleases,
        Platform::Blog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::Zenn => "zenn",
            Platform::Qiita => "qiita",
            Platform::Blog => "blog",
            Platform::Devto => "devto",
            Platform::Reddit => "reddit",
            Platform::Bluesky => "bluesky",
            Platform::Mastodon => "mastodon",
            Platform::Hashnode => "hashnode",
            Platform::GithubReleases => "github_releases",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a platform name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == needle)
            .ok_or_else(|| UnknownPlatform(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Cadence
// ---------------------------------------------------------------------------

/// Promotion cadence. Anything unrecognised reads as `Weekly`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Frequency {
    #[default]
    Weekly,
    Biweekly,
    Monthly,
}

impl From<String> for Frequency {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "biweekly" => Frequency::Biweekly,
            "monthly" => Frequency::Monthly,
            _ => Frequency::Weekly,
        }
    }
}

impl From<Frequency> for String {
    fn from(f: Frequency) -> Self {
        match f {
            Frequency::Weekly => "weekly",
            Frequency::Biweekly => "biweekly",
            Frequency::Monthly => "monthly",
        }
        .to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(default, deserialize_with = "lenient_frequency")]
    pub frequency: Frequency,
    /// `None` means the entity falls back to [`Platform::DEFAULT_ENABLED`].
    #[serde(
        default,
        deserialize_with = "known_platforms",
        skip_serializing_if = "Option::is_none"
    )]
    pub platforms: Option<Vec<Platform>>,
}

fn lenient_frequency<'de, D>(de: D) -> Result<Frequency, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw.map(Frequency::from).unwrap_or_default())
}

/// Unknown platform names are dropped with a warning instead of failing the catalog load.
fn known_platforms<'de, D>(de: D) -> Result<Option<Vec<Platform>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<String>>::deserialize(de)?;
    Ok(raw.map(|names| {
        names
            .iter()
            .filter_map(|name| match name.parse::<Platform>() {
                Ok(p) => Some(p),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring schedule platform");
                    None
                }
            })
            .collect()
    }))
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Crypto,
    Saas,
    Tool,
    Platform,
    #[default]
    #[serde(other)]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Crypto => "crypto",
            Category::Saas => "saas",
            Category::Tool => "tool",
            Category::Platform => "platform",
            Category::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_ja: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_ja: Option<String>,
}

/// First-hand material that grounds generated content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceNotes {
    #[serde(default)]
    pub experiences: Vec<String>,
    #[serde(default)]
    pub observations: Vec<String>,
    #[serde(default)]
    pub metrics: Vec<String>,
    #[serde(default)]
    pub failures: Vec<String>,
}

impl SourceNotes {
    pub fn is_empty(&self) -> bool {
        self.experiences.is_empty()
            && self.observations.is_empty()
            && self.metrics.is_empty()
            && self.failures.is_empty()
    }
}

/// A promotable project. `slug` is unique and joins the entity to every ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub slug: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_ja: Option<String>,
    #[serde(default)]
    pub tagline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline_ja: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_ja: Option<String>,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub target_audience: Vec<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_problem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_problem_ja: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_ja: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_to_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_to_action_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,
    #[serde(default)]
    pub promotion_keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_notes: Option<SourceNotes>,
    #[serde(default)]
    pub schedule: Schedule,
    #[serde(default)]
    pub auto_promote: bool,
}

impl Entity {
    pub fn display_name_ja(&self) -> &str {
        self.name_ja.as_deref().unwrap_or(&self.name)
    }

    pub fn tagline_ja(&self) -> &str {
        self.tagline_ja.as_deref().unwrap_or(&self.tagline)
    }

    pub fn description_ja(&self) -> &str {
        self.description_ja.as_deref().unwrap_or(&self.description)
    }

    pub fn frequency(&self) -> Frequency {
        self.schedule.frequency
    }

    pub fn enabled_platforms(&self) -> Vec<Platform> {
        match &self.schedule.platforms {
            Some(list) => list.clone(),
            None => Platform::DEFAULT_ENABLED.to_vec(),
        }
    }

    pub fn is_enabled_for(&self, platform: Platform) -> bool {
        self.enabled_platforms().contains(&platform)
    }

    /// Link promoted content should point at, in order of preference.
    pub fn primary_url(&self) -> Option<&str> {
        self.call_to_action_url
            .as_deref()
            .or(self.live_url.as_deref())
            .or(self.repository_url.as_deref())
    }

    /// Keywords for hashtags, falling back to plain tags.
    pub fn keywords(&self) -> &[String] {
        if self.promotion_keywords.is_empty() {
            &self.tags
        } else {
            &self.promotion_keywords
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_parses_case_insensitively() {
        assert_eq!("DevTo".parse::<Platform>().unwrap(), Platform::Devto);
        assert_eq!(
            "github_releases".parse::<Platform>().unwrap(),
            Platform::GithubReleases
        );
        assert!("myspace".parse::<Platform>().is_err());
    }

    #[test]
    fn unknown_frequency_reads_as_weekly() {
        let s: Schedule = serde_json::from_str(r#"{"frequency":"fortnightly"}"#).unwrap();
        assert_eq!(s.frequency, Frequency::Weekly);
        let s: Schedule = serde_json::from_str(r#"{"frequency":null}"#).unwrap();
        assert_eq!(s.frequency, Frequency::Weekly);
        let s: Schedule = serde_json::from_str(r#"{"frequency":"monthly"}"#).unwrap();
        assert_eq!(s.frequency, Frequency::Monthly);
    }

    #[test]
    fn missing_schedule_platforms_use_defaults() {
        let e: Entity = serde_json::from_str(r#"{"slug":"a","name":"A"}"#).unwrap();
        assert_eq!(e.enabled_platforms(), Platform::DEFAULT_ENABLED.to_vec());
        assert!(!e.is_enabled_for(Platform::Twitter));
        assert!(!e.auto_promote);
    }

    #[test]
    fn unknown_schedule_platforms_are_dropped() {
        let e: Entity = serde_json::from_str(
            r#"{"slug":"a","name":"A","schedule":{"platforms":["devto","friendster"]}}"#,
        )
        .unwrap();
        assert_eq!(e.enabled_platforms(), vec![Platform::Devto]);
    }

    #[test]
    fn unknown_category_is_other() {
        let e: Entity =
            serde_json::from_str(r#"{"slug":"a","name":"A","category":"hardware"}"#).unwrap();
        assert_eq!(e.category, Category::Other);
    }

    #[test]
    fn camel_case_fields_load() {
        let e: Entity = serde_json::from_str(
            r#"{"slug":"a","name":"A","nameJa":"エー","autoPromote":true,
                "techStack":["Rust"],"callToActionUrl":"https://a.example",
                "sourceNotes":{"metrics":["p95 40ms"]}}"#,
        )
        .unwrap();
        assert_eq!(e.display_name_ja(), "エー");
        assert!(e.auto_promote);
        assert_eq!(e.primary_url(), Some("https://a.example"));
        assert_eq!(e.source_notes.unwrap().metrics, vec!["p95 40ms"]);
    }
}
