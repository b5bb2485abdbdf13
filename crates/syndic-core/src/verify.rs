//! Setup diagnostics: which platforms could publish with the current
//! environment, and what is missing for the rest.

use serde::Serialize;
use syndic_state::Platform;

use crate::config::{Credentials, SyndicConfig};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformCheck {
    pub platform: Platform,
    pub ready: bool,
    /// Variables that are required but unset.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    pub generator_ready: bool,
    pub site_url: Option<String>,
    pub platforms: Vec<PlatformCheck>,
}

impl VerifyReport {
    pub fn ready_count(&self) -> usize {
        self.platforms.iter().filter(|p| p.ready).count()
    }

    /// Runs can generate and at least one platform can publish.
    pub fn is_usable(&self) -> bool {
        self.generator_ready && self.ready_count() > 0
    }
}

/// Check every known platform against the configuration.
///
/// `lookup` reports whether an individual variable is set; it only feeds the
/// `missing` list, readiness comes from the parsed credentials.
pub fn verify<F>(config: &SyndicConfig, lookup: F) -> VerifyReport
where
    F: Fn(&str) -> bool,
{
    let platforms = Platform::ALL
        .iter()
        .map(|&platform| {
            let ready = config.credentials.is_configured(platform);
            let missing = if ready {
                Vec::new()
            } else {
                Credentials::required_vars(platform)
                    .iter()
                    .copied()
                    .filter(|var| !lookup(var))
                    .collect()
            };
            let note = match platform {
                Platform::Zenn | Platform::Blog => Some("writes files; no credentials needed"),
                Platform::GithubReleases => Some("no publisher; always skipped"),
                _ => None,
            };
            PlatformCheck {
                platform,
                ready,
                missing,
                note,
            }
        })
        .collect();

    VerifyReport {
        generator_ready: config.anthropic_api_key.is_some(),
        site_url: config.site_url.clone(),
        platforms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &HashMap<&str, &str>) -> SyndicConfig {
        SyndicConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()))
    }

    #[test]
    fn partial_reddit_credentials_list_what_is_missing() {
        let vars = HashMap::from([
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("REDDIT_CLIENT_ID", "id"),
            ("REDDIT_USERNAME", "me"),
        ]);
        let report = verify(&config_from(&vars), |k| vars.contains_key(k));
        let reddit = report
            .platforms
            .iter()
            .find(|p| p.platform == Platform::Reddit)
            .unwrap();
        assert!(!reddit.ready);
        assert_eq!(reddit.missing, vec!["REDDIT_CLIENT_SECRET", "REDDIT_PASSWORD"]);
        assert!(report.generator_ready);
    }

    #[test]
    fn file_drops_are_ready_without_credentials() {
        let vars = HashMap::new();
        let report = verify(&config_from(&vars), |_| false);
        assert_eq!(report.ready_count(), 2);
        assert!(!report.is_usable());
        let gh = report
            .platforms
            .iter()
            .find(|p| p.platform == Platform::GithubReleases)
            .unwrap();
        assert!(!gh.ready);
        assert!(gh.missing.is_empty());
    }
}
