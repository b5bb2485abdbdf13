//! Runtime configuration read from the environment.
//!
//! Credentials are never validated here; a missing one only means the
//! corresponding platform is skipped as not configured.

use serde::Serialize;
use syndic_state::Platform;

use crate::angles::AngleScope;

pub const DEFAULT_CONCURRENCY: usize = 4;

/// Bluesky app-password login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlueskyCredentials {
    pub handle: String,
    pub app_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MastodonCredentials {
    pub instance: String,
    pub access_token: String,
}

/// Reddit script-app credentials (password grant).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

/// Per-platform credentials. `None` means not configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub devto_api_key: Option<String>,
    pub qiita_token: Option<String>,
    pub hashnode_pat: Option<String>,
    pub bluesky: Option<BlueskyCredentials>,
    pub mastodon: Option<MastodonCredentials>,
    pub reddit: Option<RedditCredentials>,
    pub twitter_access_token: Option<String>,
}

impl Credentials {
    /// Whether the credentials a network publisher needs are present.
    ///
    /// File-drop platforms need none; `github_releases` has no publisher.
    pub fn is_configured(&self, platform: Platform) -> bool {
        match platform {
            Platform::Devto => self.devto_api_key.is_some(),
            Platform::Qiita => self.qiita_token.is_some(),
            Platform::Hashnode => self.hashnode_pat.is_some(),
            Platform::Bluesky => self.bluesky.is_some(),
            Platform::Mastodon => self.mastodon.is_some(),
            Platform::Reddit => self.reddit.is_some(),
            Platform::Twitter => self.twitter_access_token.is_some(),
            Platform::Zenn | Platform::Blog => true,
            Platform::GithubReleases => false,
        }
    }

    /// Environment variables a platform reads, for setup diagnostics.
    pub fn required_vars(platform: Platform) -> &'static [&'static str] {
        match platform {
            Platform::Devto => &["DEVTO_API_KEY"],
            Platform::Qiita => &["QIITA_API_TOKEN"],
            Platform::Hashnode => &["HASHNODE_PAT"],
            Platform::Bluesky => &["BLUESKY_HANDLE", "BLUESKY_APP_PASSWORD"],
            Platform::Mastodon => &["MASTODON_INSTANCE", "MASTODON_ACCESS_TOKEN"],
            Platform::Reddit => &[
                "REDDIT_CLIENT_ID",
                "REDDIT_CLIENT_SECRET",
                "REDDIT_USERNAME",
                "REDDIT_PASSWORD",
            ],
            Platform::Twitter => &["TWITTER_ACCESS_TOKEN"],
            Platform::Zenn | Platform::Blog | Platform::GithubReleases => &[],
        }
    }
}

/// Everything the binary reads from the environment.
#[derive(Debug, Clone, Default)]
pub struct SyndicConfig {
    pub anthropic_api_key: Option<String>,
    pub model: Option<String>,
    pub site_url: Option<String>,
    pub credentials: Credentials,
}

impl SyndicConfig {
    /// Read configuration from the process environment.
    ///
    /// Reads `ANTHROPIC_API_KEY`, `SYNDIC_MODEL`, `SITE_URL` and the
    /// per-platform credential variables listed by
    /// [`Credentials::required_vars`]. Empty values count as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bluesky = match (var("BLUESKY_HANDLE"), var("BLUESKY_APP_PASSWORD")) {
            (Some(handle), Some(app_password)) => Some(BlueskyCredentials {
                handle,
                app_password,
            }),
            _ => None,
        };
        let mastodon = match (var("MASTODON_INSTANCE"), var("MASTODON_ACCESS_TOKEN")) {
            (Some(instance), Some(access_token)) => Some(MastodonCredentials {
                instance,
                access_token,
            }),
            _ => None,
        };
        let reddit = match (
            var("REDDIT_CLIENT_ID"),
            var("REDDIT_CLIENT_SECRET"),
            var("REDDIT_USERNAME"),
            var("REDDIT_PASSWORD"),
        ) {
            (Some(client_id), Some(client_secret), Some(username), Some(password)) => {
                Some(RedditCredentials {
                    client_id,
                    client_secret,
                    username,
                    password,
                })
            }
            _ => None,
        };

        Self {
            anthropic_api_key: var("ANTHROPIC_API_KEY"),
            model: var("SYNDIC_MODEL"),
            site_url: var("SITE_URL").map(|s| s.trim_end_matches('/').to_string()),
            credentials: Credentials {
                devto_api_key: var("DEVTO_API_KEY"),
                qiita_token: var("QIITA_API_TOKEN"),
                hashnode_pat: var("HASHNODE_PAT"),
                bluesky,
                mastodon,
                reddit,
                twitter_access_token: var("TWITTER_ACCESS_TOKEN"),
            },
        }
    }
}

/// Knobs for one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    pub angle_scope: AngleScope,
    /// Platform branches processed at once.
    pub concurrency: usize,
    /// Generate and validate, but publish and record nothing.
    pub dry_run: bool,
    pub site_url: Option<String>,
    pub max_regenerations: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            angle_scope: AngleScope::default(),
            concurrency: DEFAULT_CONCURRENCY,
            dry_run: false,
            site_url: None,
            max_regenerations: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> SyndicConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SyndicConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn empty_values_count_as_unset() {
        let cfg = config_from(&[("DEVTO_API_KEY", ""), ("QIITA_API_TOKEN", "  ")]);
        assert!(!cfg.credentials.is_configured(Platform::Devto));
        assert!(!cfg.credentials.is_configured(Platform::Qiita));
    }

    #[test]
    fn multi_part_credentials_need_every_part() {
        let cfg = config_from(&[("BLUESKY_HANDLE", "me.bsky.social")]);
        assert!(cfg.credentials.bluesky.is_none());

        let cfg = config_from(&[
            ("BLUESKY_HANDLE", "me.bsky.social"),
            ("BLUESKY_APP_PASSWORD", "xxxx-xxxx"),
        ]);
        assert!(cfg.credentials.is_configured(Platform::Bluesky));
    }

    #[test]
    fn site_url_loses_trailing_slash() {
        let cfg = config_from(&[("SITE_URL", "https://example.dev/")]);
        assert_eq!(cfg.site_url.as_deref(), Some("https://example.dev"));
    }

    #[test]
    fn file_drop_platforms_need_no_credentials() {
        let creds = Credentials::default();
        assert!(creds.is_configured(Platform::Zenn));
        assert!(creds.is_configured(Platform::Blog));
        assert!(!creds.is_configured(Platform::GithubReleases));
    }
}
