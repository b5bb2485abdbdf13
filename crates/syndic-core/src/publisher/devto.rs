//! Dev.to (Forem) articles API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use syndic_state::Platform;

use super::{Envelope, PublishError, PublishReceipt, Publisher};
use crate::http::{self, ApiError};

const ARTICLES_URL: &str = "https://dev.to/api/articles";
const SERVICE: &str = "devto";
const MAX_TAGS: usize = 4;

#[derive(Debug, Deserialize)]
struct ArticleResponse {
    id: Value,
    #[serde(default)]
    url: String,
}

pub struct DevtoPublisher {
    client: Client,
    api_key: String,
    base_url: String,
}

impl DevtoPublisher {
    pub fn new(client: Client, api_key: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            base_url: ARTICLES_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Dev.to accepts at most four lowercase alphanumeric tags.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let t: String = tag
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        if !t.is_empty() && !out.contains(&t) {
            out.push(t);
        }
    }
    out.truncate(MAX_TAGS);
    out
}

pub fn article_body(
    title: &str,
    body: &str,
    tags: &[String],
    canonical_url: Option<&str>,
    series: Option<&str>,
) -> Value {
    let mut article = json!({
        "title": title,
        "body_markdown": body,
        "published": true,
        "tags": normalize_tags(tags),
    });
    if let Some(url) = canonical_url {
        article["canonical_url"] = json!(url);
    }
    if let Some(series) = series {
        article["series"] = json!(series);
    }
    json!({ "article": article })
}

fn id_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Publisher for DevtoPublisher {
    fn platform(&self) -> Platform {
        Platform::Devto
    }

    async fn publish(&self, envelope: &Envelope) -> Result<PublishReceipt, PublishError> {
        let Envelope::Article {
            title,
            body,
            tags,
            canonical_url,
            series,
        } = envelope
        else {
            return Err(PublishError::unsupported(self.platform(), envelope));
        };

        let payload = article_body(title, body, tags, canonical_url.as_deref(), series.as_deref());
        let request = self
            .client
            .post(&self.base_url)
            .header("api-key", &self.api_key)
            .json(&payload);
        let response = http::send(SERVICE, request).await?;
        let created: ArticleResponse = http::read_json(SERVICE, response).await?;
        if created.id.is_null() {
            return Err(ApiError::rejected(SERVICE, "response carried no article id").into());
        }
        Ok(PublishReceipt {
            external_id: id_string(&created.id),
            url: created.url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tags_are_cleaned_and_capped() {
        let tags: Vec<String> = ["Web Dev", "open-source", "rust", "webdev", "a", "b"]
            .map(String::from)
            .to_vec();
        assert_eq!(normalize_tags(&tags), vec!["webdev", "opensource", "rust", "a"]);
    }

    #[test]
    fn optional_fields_are_omitted() {
        let body = article_body("T", "B", &[], None, None);
        assert_eq!(body["article"]["published"], json!(true));
        assert!(body["article"].get("canonical_url").is_none());
        assert!(body["article"].get("series").is_none());

        let body = article_body("T", "B", &[], Some("https://x.dev/blog/a-guide/"), Some("A"));
        assert_eq!(body["article"]["series"], json!("A"));
    }

    #[test]
    fn numeric_ids_become_strings() {
        assert_eq!(id_string(&json!(12345)), "12345");
        assert_eq!(id_string(&json!("abc")), "abc");
    }
}
