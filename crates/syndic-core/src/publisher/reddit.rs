//! Reddit self-post submission.
//!
//! Uses the script-app password grant for a token, then `api/submit`. Reddit
//! answers a rejected submission with 200 and a non-empty `json.errors`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use syndic_state::Platform;

use super::{Envelope, PublishError, PublishReceipt, Publisher};
use crate::config::RedditCredentials;
use crate::http::{self, ApiError};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const OAUTH_BASE: &str = "https://oauth.reddit.com";
const SERVICE: &str = "reddit";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct RedditPublisher {
    client: Client,
    credentials: RedditCredentials,
    token_url: String,
    oauth_base: String,
}

impl RedditPublisher {
    pub fn new(client: Client, credentials: RedditCredentials) -> Self {
        Self {
            client,
            credentials,
            token_url: TOKEN_URL.to_string(),
            oauth_base: OAUTH_BASE.to_string(),
        }
    }

    pub fn with_endpoints(
        mut self,
        token_url: impl Into<String>,
        oauth_base: impl Into<String>,
    ) -> Self {
        self.token_url = token_url.into();
        self.oauth_base = oauth_base.into();
        self
    }

    async fn access_token(&self) -> Result<String, ApiError> {
        let request = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", self.credentials.username.as_str()),
                ("password", self.credentials.password.as_str()),
            ]);
        let response = http::send(SERVICE, request).await?;
        let token: TokenResponse = http::read_json(SERVICE, response).await?;
        match (token.access_token, token.error) {
            (Some(t), _) if !t.is_empty() => Ok(t),
            (_, Some(err)) => Err(ApiError::rejected(
                SERVICE,
                format!("token request failed: {err}"),
            )),
            _ => Err(ApiError::decode(SERVICE, "token response has no access_token")),
        }
    }
}

/// Interpret the `api/submit` response body.
pub fn parse_submit(subreddit: &str, body: &Value) -> Result<PublishReceipt, ApiError> {
    let json = &body["json"];
    if let Some(errors) = json["errors"].as_array().filter(|e| !e.is_empty()) {
        let message = errors
            .iter()
            .map(|e| match e {
                Value::Array(parts) => parts
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(": "),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ApiError::rejected(SERVICE, message));
    }
    let data = &json["data"];
    let id = data["name"]
        .as_str()
        .or_else(|| data["id"].as_str())
        .ok_or_else(|| ApiError::decode(SERVICE, "submit response has no post id"))?;
    let url = data["url"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| format!("https://www.reddit.com/r/{subreddit}/"));
    Ok(PublishReceipt {
        external_id: id.to_string(),
        url,
    })
}

#[async_trait]
impl Publisher for RedditPublisher {
    fn platform(&self) -> Platform {
        Platform::Reddit
    }

    async fn publish(&self, envelope: &Envelope) -> Result<PublishReceipt, PublishError> {
        let Envelope::Community {
            destination,
            title,
            body,
        } = envelope
        else {
            return Err(PublishError::unsupported(self.platform(), envelope));
        };

        let token = self.access_token().await?;
        let request = self
            .client
            .post(format!("{}/api/submit", self.oauth_base))
            .bearer_auth(token)
            .form(&[
                ("sr", destination.as_str()),
                ("kind", "self"),
                ("title", title.as_str()),
                ("text", body.as_str()),
                ("resubmit", "true"),
                ("api_type", "json"),
            ]);
        let response = http::send(SERVICE, request).await?;
        let parsed: Value = http::read_json(SERVICE, response).await?;
        parse_submit(destination, &parsed).map_err(PublishError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn submit_errors_are_rejections() {
        let body = json!({ "json": { "errors": [["RATELIMIT", "you are doing that too much", "ratelimit"]] } });
        let err = parse_submit("webdev", &body).unwrap_err();
        assert_eq!(err.kind(), "rejected");
        assert!(err.to_string().contains("RATELIMIT: you are doing that too much"));
    }

    #[test]
    fn submit_success_reads_name_and_url() {
        let body = json!({ "json": { "errors": [], "data": {
            "name": "t3_abc", "url": "https://www.reddit.com/r/webdev/comments/abc/x/"
        } } });
        let receipt = parse_submit("webdev", &body).unwrap();
        assert_eq!(receipt.external_id, "t3_abc");
        assert!(receipt.url.contains("/comments/abc/"));
    }

    #[test]
    fn missing_url_falls_back_to_subreddit() {
        let body = json!({ "json": { "errors": [], "data": { "id": "abc" } } });
        let receipt = parse_submit("sideproject", &body).unwrap();
        assert_eq!(receipt.url, "https://www.reddit.com/r/sideproject/");
    }
}
