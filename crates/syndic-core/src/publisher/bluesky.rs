//! Bluesky (AT Protocol) posts.
//!
//! Each publish opens a session with the app password, then creates an
//! `app.bsky.feed.post` record. URLs in the text are turned into link facets
//! so they render as links; facet ranges are UTF-8 byte offsets.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use syndic_state::Platform;

use super::{Envelope, PublishError, PublishReceipt, Publisher};
use crate::config::BlueskyCredentials;
use crate::http::{self, ApiError};

const PDS_URL: &str = "https://bsky.social";
const SERVICE: &str = "bluesky";

static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://[^\s)>\]]+").unwrap());

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    did: String,
    access_jwt: String,
}

#[derive(Debug, Deserialize)]
struct CreatedRecord {
    uri: String,
}

/// A link facet over `[byte_start, byte_end)` of the post text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkFacet {
    pub byte_start: usize,
    pub byte_end: usize,
    pub uri: String,
}

impl LinkFacet {
    fn to_json(&self) -> Value {
        json!({
            "index": { "byteStart": self.byte_start, "byteEnd": self.byte_end },
            "features": [{ "$type": "app.bsky.richtext.facet#link", "uri": self.uri }],
        })
    }
}

/// Find URLs and their byte ranges. Trailing sentence punctuation is not
/// part of the link.
pub fn link_facets(text: &str) -> Vec<LinkFacet> {
    URL.find_iter(text)
        .map(|m| {
            let uri = m.as_str().trim_end_matches(['.', ',', '!', '?', ';', ':', '」', '。']);
            LinkFacet {
                byte_start: m.start(),
                byte_end: m.start() + uri.len(),
                uri: uri.to_string(),
            }
        })
        .collect()
}

pub fn post_record(text: &str, created_at: &str) -> Value {
    let mut record = json!({
        "$type": "app.bsky.feed.post",
        "text": text,
        "createdAt": created_at,
    });
    let facets = link_facets(text);
    if !facets.is_empty() {
        record["facets"] = Value::Array(facets.iter().map(LinkFacet::to_json).collect());
    }
    record
}

/// `at://<did>/app.bsky.feed.post/<rkey>` → public web URL.
pub fn web_url(handle: &str, at_uri: &str) -> String {
    let rkey = at_uri.rsplit('/').next().unwrap_or_default();
    format!("https://bsky.app/profile/{handle}/post/{rkey}")
}

pub struct BlueskyPublisher {
    client: Client,
    credentials: BlueskyCredentials,
    pds_url: String,
}

impl BlueskyPublisher {
    pub fn new(client: Client, credentials: BlueskyCredentials) -> Self {
        Self {
            client,
            credentials,
            pds_url: PDS_URL.to_string(),
        }
    }

    pub fn with_pds_url(mut self, pds_url: impl Into<String>) -> Self {
        self.pds_url = pds_url.into();
        self
    }

    async fn create_session(&self) -> Result<Session, ApiError> {
        let request = self
            .client
            .post(format!("{}/xrpc/com.atproto.server.createSession", self.pds_url))
            .json(&json!({
                "identifier": self.credentials.handle,
                "password": self.credentials.app_password,
            }));
        let response = http::send(SERVICE, request).await?;
        http::read_json(SERVICE, response).await
    }
}

#[async_trait]
impl Publisher for BlueskyPublisher {
    fn platform(&self) -> Platform {
        Platform::Bluesky
    }

    async fn publish(&self, envelope: &Envelope) -> Result<PublishReceipt, PublishError> {
        let Envelope::Text { text } = envelope else {
            return Err(PublishError::unsupported(self.platform(), envelope));
        };

        let session = self.create_session().await?;
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let request = self
            .client
            .post(format!("{}/xrpc/com.atproto.repo.createRecord", self.pds_url))
            .bearer_auth(&session.access_jwt)
            .json(&json!({
                "repo": session.did,
                "collection": "app.bsky.feed.post",
                "record": post_record(text, &created_at),
            }));
        let response = http::send(SERVICE, request).await?;
        let created: CreatedRecord = http::read_json(SERVICE, response).await?;
        Ok(PublishReceipt {
            url: web_url(&self.credentials.handle, &created.uri),
            external_id: created.uri,
        })
    }
}
