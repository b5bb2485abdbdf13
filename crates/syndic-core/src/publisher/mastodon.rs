//! Mastodon statuses API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use syndic_state::Platform;

use super::{Envelope, PublishError, PublishReceipt, Publisher};
use crate::config::MastodonCredentials;
use crate::http;

const SERVICE: &str = "mastodon";

#[derive(Debug, Deserialize)]
struct Status {
    id: String,
    #[serde(default)]
    url: Option<String>,
}

/// `https://mastodon.social/` → `mastodon.social`.
pub fn instance_host(instance: &str) -> &str {
    let host = instance.trim();
    let host = host
        .strip_prefix("https://")
        .or_else(|| host.strip_prefix("http://"))
        .unwrap_or(host);
    host.trim_end_matches('/')
}

pub struct MastodonPublisher {
    client: Client,
    base_url: String,
    access_token: String,
}

impl MastodonPublisher {
    pub fn new(client: Client, credentials: MastodonCredentials) -> Self {
        Self {
            client,
            base_url: format!("https://{}", instance_host(&credentials.instance)),
            access_token: credentials.access_token,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Publisher for MastodonPublisher {
    fn platform(&self) -> Platform {
        Platform::Mastodon
    }

    async fn publish(&self, envelope: &Envelope) -> Result<PublishReceipt, PublishError> {
        let Envelope::Text { text } = envelope else {
            return Err(PublishError::unsupported(self.platform(), envelope));
        };

        let request = self
            .client
            .post(format!("{}/api/v1/statuses", self.base_url))
            .bearer_auth(&self.access_token)
            .json(&json!({ "status": text }));
        let response = http::send(SERVICE, request).await?;
        let status: Status = http::read_json(SERVICE, response).await?;
        let url = status
            .url
            .unwrap_or_else(|| format!("{}/web/statuses/{}", self.base_url, status.id));
        Ok(PublishReceipt {
            external_id: status.id,
            url,
        })
    }
}
