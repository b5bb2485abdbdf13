//! Publishing boundary.
//!
//! A publisher takes a destination-shaped [`Envelope`] and returns the
//! platform's id and canonical URL for the new post, or a typed
//! [`PublishError`]. Publishing calls are sent exactly once: a request that
//! failed after the platform accepted it must not produce a duplicate post.

pub mod bluesky;
pub mod devto;
pub mod file_drop;
pub mod gate;
pub mod hashnode;
pub mod mastodon;
pub mod qiita;
pub mod reddit;
pub mod twitter;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use syndic_state::{Entity, Platform};

use crate::config::Credentials;
use crate::domain::ContentDraft;
use crate::http::ApiError;
use crate::prompt::blog_article_url;

pub use bluesky::BlueskyPublisher;
pub use devto::DevtoPublisher;
pub use file_drop::FileDropPublisher;
pub use hashnode::HashnodePublisher;
pub use mastodon::MastodonPublisher;
pub use qiita::QiitaPublisher;
pub use reddit::RedditPublisher;
pub use twitter::TwitterPublisher;

/// Destination-shaped post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Envelope {
    Article {
        title: String,
        body: String,
        tags: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        canonical_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        series: Option<String>,
    },
    Text {
        text: String,
    },
    Community {
        destination: String,
        title: String,
        body: String,
    },
    /// A complete file handed to a git-backed platform.
    File {
        name: String,
        contents: String,
    },
}

impl Envelope {
    pub fn shape(&self) -> &'static str {
        match self {
            Envelope::Article { .. } => "article",
            Envelope::Text { .. } => "text",
            Envelope::Community { .. } => "community",
            Envelope::File { .. } => "file",
        }
    }
}

/// What the platform returned for an accepted post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub external_id: String,
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("{0} publisher is not configured")]
    NotConfigured(Platform),

    #[error("{platform} cannot publish a {shape} envelope")]
    UnsupportedEnvelope {
        platform: Platform,
        shape: &'static str,
    },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("refusing to overwrite published file {path}")]
    AlreadyExists { path: PathBuf },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PublishError {
    pub fn kind(&self) -> &'static str {
        match self {
            PublishError::NotConfigured(_) => "not_configured",
            PublishError::UnsupportedEnvelope { .. } => "malformed_payload",
            PublishError::Api(e) => e.kind(),
            PublishError::AlreadyExists { .. } => "already_exists",
            PublishError::Io { .. } => "io",
        }
    }

    pub(crate) fn unsupported(platform: Platform, envelope: &Envelope) -> Self {
        PublishError::UnsupportedEnvelope {
            platform,
            shape: envelope.shape(),
        }
    }
}

#[async_trait]
pub trait Publisher: Send + Sync {
    fn platform(&self) -> Platform;

    async fn publish(&self, envelope: &Envelope) -> Result<PublishReceipt, PublishError>;
}

pub type PublisherMap = HashMap<Platform, Arc<dyn Publisher>>;

/// Zenn article file: `<yyyymmdd>-<slug>.md`.
pub fn zenn_file_name(slug: &str, date: NaiveDate) -> String {
    format!("{}-{}.md", date.format("%Y%m%d"), slug)
}

/// Blog post file: `<slug>-<yyyymmdd>.mdx`.
pub fn blog_file_name(slug: &str, date: NaiveDate) -> String {
    format!("{}-{}.mdx", slug, date.format("%Y%m%d"))
}

/// Shape a validated draft for its platform.
pub fn build_envelope(
    draft: &ContentDraft,
    entity: &Entity,
    site_url: Option<&str>,
    today: NaiveDate,
) -> Envelope {
    match draft.platform {
        Platform::Twitter | Platform::Bluesky | Platform::Mastodon => Envelope::Text {
            text: draft.body.trim().to_string(),
        },
        Platform::Reddit => Envelope::Community {
            destination: draft
                .destination
                .clone()
                .unwrap_or_else(|| "sideproject".to_string()),
            title: draft.title.clone(),
            body: draft.body.clone(),
        },
        Platform::Zenn => Envelope::File {
            name: zenn_file_name(&entity.slug, today),
            contents: ensure_trailing_newline(&draft.body),
        },
        Platform::Blog => Envelope::File {
            name: blog_file_name(&entity.slug, today),
            contents: ensure_trailing_newline(&draft.body),
        },
        Platform::Devto => Envelope::Article {
            title: draft.title.clone(),
            body: draft.body.clone(),
            tags: draft.tags.clone(),
            canonical_url: site_url.map(|site| blog_article_url(site, &entity.slug)),
            series: Some(entity.name.clone()).filter(|n| !n.is_empty()),
        },
        Platform::Qiita | Platform::Hashnode | Platform::GithubReleases => Envelope::Article {
            title: draft.title.clone(),
            body: draft.body.clone(),
            tags: draft.tags.clone(),
            canonical_url: None,
            series: None,
        },
    }
}

fn ensure_trailing_newline(text: &str) -> String {
    let mut out = text.trim_end().to_string();
    out.push('\n');
    out
}

/// Where file-drop platforms write.
#[derive(Debug, Clone)]
pub struct FileDropDirs {
    /// Zenn repository `articles/` directory.
    pub articles_dir: PathBuf,
    /// Blog posts directory (`content/blog`).
    pub blog_dir: PathBuf,
}

impl FileDropDirs {
    pub fn new(articles_dir: impl AsRef<Path>, content_dir: impl AsRef<Path>) -> Self {
        Self {
            articles_dir: articles_dir.as_ref().to_path_buf(),
            blog_dir: content_dir.as_ref().join("blog"),
        }
    }
}

/// One publisher per platform whose credentials are present.
///
/// Platforms missing from the map are skipped by the gate as not configured.
pub fn publishers_from_credentials(
    client: &Client,
    credentials: &Credentials,
    dirs: &FileDropDirs,
    site_url: Option<&str>,
) -> PublisherMap {
    let mut map: PublisherMap = HashMap::new();
    let mut add = |p: Arc<dyn Publisher>| {
        map.insert(p.platform(), p);
    };

    if let Some(key) = &credentials.devto_api_key {
        add(Arc::new(DevtoPublisher::new(client.clone(), key)));
    }
    if let Some(token) = &credentials.qiita_token {
        add(Arc::new(QiitaPublisher::new(client.clone(), token)));
    }
    if let Some(pat) = &credentials.hashnode_pat {
        add(Arc::new(HashnodePublisher::new(client.clone(), pat)));
    }
    if let Some(bsky) = &credentials.bluesky {
        add(Arc::new(BlueskyPublisher::new(client.clone(), bsky.clone())));
    }
    if let Some(masto) = &credentials.mastodon {
        add(Arc::new(MastodonPublisher::new(client.clone(), masto.clone())));
    }
    if let Some(reddit) = &credentials.reddit {
        add(Arc::new(RedditPublisher::new(client.clone(), reddit.clone())));
    }
    if let Some(token) = &credentials.twitter_access_token {
        add(Arc::new(TwitterPublisher::new(client.clone(), token)));
    }
    add(Arc::new(FileDropPublisher::zenn(&dirs.articles_dir)));
    add(Arc::new(FileDropPublisher::blog(&dirs.blog_dir, site_url)));
    map
}
