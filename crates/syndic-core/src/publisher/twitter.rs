//! X (Twitter) v2 tweets.
//!
//! Authenticates with a user-context OAuth 2.0 access token. An exhausted
//! credit balance comes back as 402 and is classified as rate limited.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use syndic_state::Platform;

use super::{Envelope, PublishError, PublishReceipt, Publisher};
use crate::http::{self, ApiError};

const TWEETS_URL: &str = "https://api.twitter.com/2/tweets";
const SERVICE: &str = "twitter";

#[derive(Debug, Deserialize)]
struct TweetResponse {
    #[serde(default)]
    data: Option<TweetData>,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
}

pub fn status_url(id: &str) -> String {
    format!("https://x.com/i/status/{id}")
}

pub struct TwitterPublisher {
    client: Client,
    access_token: String,
    tweets_url: String,
}

impl TwitterPublisher {
    pub fn new(client: Client, access_token: &str) -> Self {
        Self {
            client,
            access_token: access_token.to_string(),
            tweets_url: TWEETS_URL.to_string(),
        }
    }

    pub fn with_tweets_url(mut self, tweets_url: impl Into<String>) -> Self {
        self.tweets_url = tweets_url.into();
        self
    }
}

#[async_trait]
impl Publisher for TwitterPublisher {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    async fn publish(&self, envelope: &Envelope) -> Result<PublishReceipt, PublishError> {
        let Envelope::Text { text } = envelope else {
            return Err(PublishError::unsupported(self.platform(), envelope));
        };

        let request = self
            .client
            .post(&self.tweets_url)
            .bearer_auth(&self.access_token)
            .json(&json!({ "text": text }));
        let response = http::send(SERVICE, request).await?;
        let tweet: TweetResponse = http::read_json(SERVICE, response).await?;
        let data = tweet
            .data
            .ok_or_else(|| ApiError::decode(SERVICE, "response has no tweet data"))?;
        Ok(PublishReceipt {
            url: status_url(&data.id),
            external_id: data.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::classify_status;

    #[test]
    fn status_url_shape() {
        assert_eq!(status_url("1849"), "https://x.com/i/status/1849");
    }

    #[test]
    fn exhausted_credits_are_rate_limited() {
        assert_eq!(classify_status(SERVICE, 402, "CreditsDepleted").kind(), "rate_limited");
    }
}
