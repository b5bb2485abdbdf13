//! Transient content drafts.

use serde::{Deserialize, Serialize};
use syndic_state::Platform;

/// Broad shape of the content a platform expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Titled technical article.
    LongForm,
    /// Single post under a hard length limit.
    ShortForm,
    /// Titled community discussion post.
    Community,
}

impl ContentKind {
    pub fn is_titled(&self) -> bool {
        matches!(self, ContentKind::LongForm | ContentKind::Community)
    }
}

/// Generated content for one platform, before or after validation.
///
/// For front-matter platforms `body` is the complete markdown file and
/// `title` is lifted from the front matter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDraft {
    pub platform: Platform,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Sub-destination, e.g. a subreddit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<String>,
}

impl ContentDraft {
    pub fn new(platform: Platform, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            platform,
            title: title.into(),
            body: body.into(),
            tags: Vec::new(),
            destination: None,
            angle: None,
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_destination(mut self, destination: Option<String>) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_angle(mut self, angle: Option<String>) -> Self {
        self.angle = angle;
        self
    }
}
