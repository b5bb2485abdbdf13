//! Qiita items API (v2).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use syndic_state::Platform;

use super::{Envelope, PublishError, PublishReceipt, Publisher};
use crate::http;

pub(crate) const API_BASE: &str = "https://qiita.com/api/v2";
const SERVICE: &str = "qiita";
const MAX_TAGS: usize = 5;

#[derive(Debug, Deserialize)]
struct ItemResponse {
    id: String,
    #[serde(default)]
    url: String,
}

pub struct QiitaPublisher {
    client: Client,
    token: String,
    base_url: String,
}

impl QiitaPublisher {
    pub fn new(client: Client, token: &str) -> Self {
        Self {
            client,
            token: token.to_string(),
            base_url: API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

pub fn item_body(title: &str, body: &str, tags: &[String]) -> Value {
    let tags: Vec<Value> = tags
        .iter()
        .filter(|t| !t.trim().is_empty())
        .take(MAX_TAGS)
        .map(|t| json!({ "name": t.trim() }))
        .collect();
    json!({
        "title": title,
        "body": body,
        "tags": tags,
        "private": false,
    })
}

#[async_trait]
impl Publisher for QiitaPublisher {
    fn platform(&self) -> Platform {
        Platform::Qiita
    }

    async fn publish(&self, envelope: &Envelope) -> Result<PublishReceipt, PublishError> {
        let Envelope::Article {
            title, body, tags, ..
        } = envelope
        else {
            return Err(PublishError::unsupported(self.platform(), envelope));
        };

        let request = self
            .client
            .post(format!("{}/items", self.base_url))
            .bearer_auth(&self.token)
            .json(&item_body(title, body, tags));
        let response = http::send(SERVICE, request).await?;
        let item: ItemResponse = http::read_json(SERVICE, response).await?;
        Ok(PublishReceipt {
            external_id: item.id,
            url: item.url,
        })
    }
}
