//! Hashnode GraphQL API.
//!
//! Publishing takes two calls: look up the token owner's first publication,
//! then `publishPost` into it. A GraphQL `errors` array on a 2xx response is
//! a rejection.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use syndic_state::Platform;

use super::{Envelope, PublishError, PublishReceipt, Publisher};
use crate::http::{self, ApiError};
use crate::platforms::slugify;

const GRAPHQL_URL: &str = "https://gql.hashnode.com";
const SERVICE: &str = "hashnode";

const PUBLICATION_QUERY: &str = "query { me { publications(first: 1) { edges { node { id } } } } }";
const PUBLISH_MUTATION: &str = "mutation PublishPost($input: PublishPostInput!) { publishPost(input: $input) { post { id url } } }";

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    #[serde(default)]
    message: String,
}

pub struct HashnodePublisher {
    client: Client,
    token: String,
    endpoint: String,
}

impl HashnodePublisher {
    pub fn new(client: Client, token: &str) -> Self {
        Self {
            client,
            token: token.to_string(),
            endpoint: GRAPHQL_URL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn query(&self, body: Value) -> Result<Value, ApiError> {
        let request = self
            .client
            .post(&self.endpoint)
            .header("Authorization", &self.token)
            .json(&body);
        let response = http::send(SERVICE, request).await?;
        let parsed: GraphQlResponse = http::read_json(SERVICE, response).await?;
        graphql_data(parsed)
    }

    async fn publication_id(&self) -> Result<String, ApiError> {
        let data = self.query(json!({ "query": PUBLICATION_QUERY })).await?;
        data.pointer("/me/publications/edges/0/node/id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::rejected(SERVICE, "account has no publication"))
    }
}

fn graphql_data(response: GraphQlResponse) -> Result<Value, ApiError> {
    if let Some(errors) = response.errors.filter(|e| !e.is_empty()) {
        let message = errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ApiError::rejected(SERVICE, message));
    }
    response
        .data
        .ok_or_else(|| ApiError::decode(SERVICE, "response has neither data nor errors"))
}

pub fn publish_variables(publication_id: &str, title: &str, body: &str, tags: &[String]) -> Value {
    let tags: Vec<Value> = tags
        .iter()
        .map(|t| slugify(t))
        .filter(|s| !s.is_empty())
        .map(|slug| json!({ "slug": slug, "name": slug }))
        .collect();
    json!({
        "input": {
            "publicationId": publication_id,
            "title": title,
            "contentMarkdown": body,
            "tags": tags,
        }
    })
}

#[async_trait]
impl Publisher for HashnodePublisher {
    fn platform(&self) -> Platform {
        Platform::Hashnode
    }

    async fn publish(&self, envelope: &Envelope) -> Result<PublishReceipt, PublishError> {
        let Envelope::Article {
            title, body, tags, ..
        } = envelope
        else {
            return Err(PublishError::unsupported(self.platform(), envelope));
        };

        let publication_id = self.publication_id().await?;
        let data = self
            .query(json!({
                "query": PUBLISH_MUTATION,
                "variables": publish_variables(&publication_id, title, body, tags),
            }))
            .await?;
        let post = data
            .pointer("/publishPost/post")
            .ok_or_else(|| ApiError::decode(SERVICE, "publishPost returned no post"))?;
        Ok(PublishReceipt {
            external_id: post["id"].as_str().unwrap_or_default().to_string(),
            url: post["url"].as_str().unwrap_or_default().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graphql_errors_are_rejections() {
        let response: GraphQlResponse = serde_json::from_value(json!({
            "data": null,
            "errors": [{ "message": "Invalid tag" }, { "message": "Title too long" }]
        }))
        .unwrap();
        let err = graphql_data(response).unwrap_err();
        assert_eq!(err.kind(), "rejected");
        assert!(err.to_string().contains("Invalid tag; Title too long"));
    }

    #[test]
    fn empty_error_list_is_success() {
        let response: GraphQlResponse =
            serde_json::from_value(json!({ "data": { "ok": 1 }, "errors": [] })).unwrap();
        assert_eq!(graphql_data(response).unwrap()["ok"], json!(1));
    }

    #[test]
    fn tags_are_slugged() {
        let vars = publish_variables("pub1", "T", "B", &["Web Dev".into(), "".into()]);
        assert_eq!(vars["input"]["tags"], json!([{ "slug": "web-dev", "name": "web-dev" }]));
        assert_eq!(vars["input"]["publicationId"], json!("pub1"));
    }
}
