//! Post metrics from the platforms that expose them.
//!
//! Sources are fetched concurrently and fail independently: a source that
//! errors contributes zero posts, is logged, and is listed in the report's
//! `failures`. The report is saved as `meta/analytics.json`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use futures::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use syndic_state::{ArtifactLocation, ContentStore, Platform, PostedLog};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::Credentials;
use crate::domain::Result;
use crate::http::{self, ApiError};

pub const REPORT_NAME: &str = "analytics";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMetrics {
    pub platform: Platform,
    pub title: String,
    pub url: String,
    pub post_id: String,
    /// Entity slug when the post can be matched to a posted log entry.
    #[serde(default)]
    pub slug: String,
    pub posted_at: Option<NaiveDate>,
    pub views: Option<u64>,
    pub likes: u64,
    pub comments: u64,
    pub stocks: Option<u64>,
    pub upvote_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSummary {
    pub platform: Platform,
    pub total_posts: usize,
    pub total_views: u64,
    pub total_likes: u64,
    pub total_comments: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub platform: Platform,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub fetched_at: DateTime<Utc>,
    /// Newest first.
    pub posts: Vec<PostMetrics>,
    pub summaries: Vec<PlatformSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<SourceFailure>,
}

#[async_trait]
pub trait MetricsSource: Send + Sync {
    fn platform(&self) -> Platform;

    async fn fetch(&self) -> std::result::Result<Vec<PostMetrics>, ApiError>;
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

fn date_prefix(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?;
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

fn count(v: &Value) -> u64 {
    v.as_u64()
        .or_else(|| v.as_i64().map(|n| n.max(0) as u64))
        .unwrap_or(0)
}

fn id_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `GET /authenticated_user/items`: a bare array of items.
pub fn parse_qiita_items(body: &Value) -> Vec<PostMetrics> {
    body.as_array()
        .into_iter()
        .flatten()
        .map(|item| PostMetrics {
            platform: Platform::Qiita,
            title: item["title"].as_str().unwrap_or_default().to_string(),
            url: item["url"].as_str().unwrap_or_default().to_string(),
            post_id: id_text(&item["id"]),
            slug: String::new(),
            posted_at: date_prefix(item["created_at"].as_str()),
            views: item["page_views_count"].as_u64(),
            likes: count(&item["likes_count"]),
            comments: count(&item["comments_count"]),
            stocks: item["stocks_count"].as_u64(),
            upvote_ratio: None,
        })
        .collect()
}

/// `GET /articles/me`: a bare array of articles.
pub fn parse_devto_articles(body: &Value) -> Vec<PostMetrics> {
    body.as_array()
        .into_iter()
        .flatten()
        .map(|a| PostMetrics {
            platform: Platform::Devto,
            title: a["title"].as_str().unwrap_or_default().to_string(),
            url: a["url"].as_str().unwrap_or_default().to_string(),
            post_id: id_text(&a["id"]),
            slug: String::new(),
            posted_at: date_prefix(a["published_at"].as_str()),
            views: a["page_views_count"].as_u64(),
            likes: count(&a["positive_reactions_count"]),
            comments: count(&a["comments_count"]),
            stocks: None,
            upvote_ratio: None,
        })
        .collect()
}

/// `GET /api/info.json`: a listing; `slugs` maps fullnames to entity slugs.
pub fn parse_reddit_info(body: &Value, slugs: &HashMap<String, String>) -> Vec<PostMetrics> {
    body.pointer("/data/children")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .map(|child| {
            let d = &child["data"];
            let name = d["name"].as_str().unwrap_or_default().to_string();
            let posted_at = d["created_utc"]
                .as_f64()
                .and_then(|secs| DateTime::from_timestamp(secs as i64, 0))
                .map(|t| t.date_naive());
            PostMetrics {
                platform: Platform::Reddit,
                title: d["title"].as_str().unwrap_or_default().to_string(),
                url: format!(
                    "https://www.reddit.com{}",
                    d["permalink"].as_str().unwrap_or_default()
                ),
                slug: slugs.get(&name).cloned().unwrap_or_default(),
                post_id: name,
                posted_at,
                views: None,
                likes: count(&d["score"]),
                comments: count(&d["num_comments"]),
                stocks: None,
                upvote_ratio: d["upvote_ratio"].as_f64(),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

pub struct QiitaMetrics {
    client: Client,
    token: String,
    url: String,
}

impl QiitaMetrics {
    pub fn new(client: Client, token: &str) -> Self {
        Self {
            client,
            token: token.to_string(),
            url: format!(
                "{}/authenticated_user/items?per_page=100",
                crate::publisher::qiita::API_BASE
            ),
        }
    }
}

#[async_trait]
impl MetricsSource for QiitaMetrics {
    fn platform(&self) -> Platform {
        Platform::Qiita
    }

    async fn fetch(&self) -> std::result::Result<Vec<PostMetrics>, ApiError> {
        let request = self.client.get(&self.url).bearer_auth(&self.token);
        let response = http::send_with_retry("qiita", request).await?;
        let body: Value = http::read_json("qiita", response).await?;
        Ok(parse_qiita_items(&body))
    }
}

pub struct DevtoMetrics {
    client: Client,
    api_key: String,
    url: String,
}

impl DevtoMetrics {
    pub fn new(client: Client, api_key: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            url: "https://dev.to/api/articles/me?per_page=100".to_string(),
        }
    }
}

#[async_trait]
impl MetricsSource for DevtoMetrics {
    fn platform(&self) -> Platform {
        Platform::Devto
    }

    async fn fetch(&self) -> std::result::Result<Vec<PostMetrics>, ApiError> {
        let request = self.client.get(&self.url).header("api-key", &self.api_key);
        let response = http::send_with_retry("devto", request).await?;
        let body: Value = http::read_json("devto", response).await?;
        Ok(parse_devto_articles(&body))
    }
}

/// Public listing lookup for the posts in the Reddit posted log.
pub struct RedditMetrics {
    client: Client,
    /// Fullname (`t3_...`) to entity slug.
    slugs: HashMap<String, String>,
}

impl RedditMetrics {
    pub fn new(client: Client, posted: &PostedLog) -> Self {
        let slugs = posted
            .records()
            .iter()
            .filter(|r| !r.external_post_id.is_empty())
            .map(|r| (r.external_post_id.clone(), r.entity_slug.clone()))
            .collect();
        Self { client, slugs }
    }
}

#[async_trait]
impl MetricsSource for RedditMetrics {
    fn platform(&self) -> Platform {
        Platform::Reddit
    }

    async fn fetch(&self) -> std::result::Result<Vec<PostMetrics>, ApiError> {
        if self.slugs.is_empty() {
            return Ok(Vec::new());
        }
        let mut ids: Vec<&str> = self.slugs.keys().map(String::as_str).collect();
        ids.sort_unstable();
        let request = self
            .client
            .get("https://www.reddit.com/api/info.json")
            .query(&[("id", ids.join(","))]);
        let response = http::send_with_retry("reddit", request).await?;
        let body: Value = http::read_json("reddit", response).await?;
        Ok(parse_reddit_info(&body, &self.slugs))
    }
}

/// Sources for every platform with the credentials it needs.
pub fn sources_from_credentials(
    client: &Client,
    credentials: &Credentials,
    reddit_posted: &PostedLog,
) -> Vec<Arc<dyn MetricsSource>> {
    let mut sources: Vec<Arc<dyn MetricsSource>> = Vec::new();
    if let Some(token) = &credentials.qiita_token {
        sources.push(Arc::new(QiitaMetrics::new(client.clone(), token)));
    }
    if let Some(key) = &credentials.devto_api_key {
        sources.push(Arc::new(DevtoMetrics::new(client.clone(), key)));
    }
    sources.push(Arc::new(RedditMetrics::new(client.clone(), reddit_posted)));
    sources
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

fn summarize(platform: Platform, posts: &[PostMetrics]) -> PlatformSummary {
    let mine: Vec<&PostMetrics> = posts.iter().filter(|p| p.platform == platform).collect();
    PlatformSummary {
        platform,
        total_posts: mine.len(),
        total_views: mine.iter().map(|p| p.views.unwrap_or(0)).sum(),
        total_likes: mine.iter().map(|p| p.likes).sum(),
        total_comments: mine.iter().map(|p| p.comments).sum(),
    }
}

/// Fetch every source concurrently and merge the results.
pub async fn collect(sources: &[Arc<dyn MetricsSource>], now: DateTime<Utc>) -> AnalyticsReport {
    let results = join_all(sources.iter().map(|s| async move { (s.platform(), s.fetch().await) })).await;

    let mut posts = Vec::new();
    let mut failures = Vec::new();
    let mut platforms = Vec::new();
    for (platform, result) in results {
        platforms.push(platform);
        match result {
            Ok(found) => {
                info!(platform = %platform, posts = found.len(), "fetched post metrics");
                posts.extend(found);
            }
            Err(e) => {
                warn!(platform = %platform, error = %e, "metrics source failed; counting zero posts");
                failures.push(SourceFailure {
                    platform,
                    error: e.to_string(),
                });
            }
        }
    }

    // Newest first; undated posts last.
    posts.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
    let summaries = platforms.iter().map(|p| summarize(*p, &posts)).collect();
    AnalyticsReport {
        fetched_at: now,
        posts,
        summaries,
        failures,
    }
}

/// Collect and persist the report.
pub async fn refresh(
    store: &dyn ContentStore,
    sources: &[Arc<dyn MetricsSource>],
    clock: &dyn Clock,
) -> Result<(AnalyticsReport, ArtifactLocation)> {
    let report = collect(sources, clock.now()).await;
    let value = serde_json::to_value(&report)?;
    let location = store.save_report(REPORT_NAME, &value).await?;
    info!(location = %location.location, posts = report.posts.len(), "analytics saved");
    Ok((report, location))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn qiita_items_parse_with_missing_fields() {
        let body = json!([
            { "id": "abc", "title": "T", "url": "https://qiita.com/x/items/abc",
              "created_at": "2026-09-01T10:00:00+09:00", "likes_count": 4,
              "comments_count": 1, "page_views_count": null, "stocks_count": 2 },
            { "id": "def" }
        ]);
        let posts = parse_qiita_items(&body);
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].posted_at, NaiveDate::from_ymd_opt(2026, 9, 1));
        assert_eq!(posts[0].views, None);
        assert_eq!(posts[0].stocks, Some(2));
        assert_eq!(posts[1].likes, 0);
    }

    #[test]
    fn reddit_scores_floor_at_zero_and_match_slugs() {
        let body = json!({ "data": { "children": [
            { "data": { "name": "t3_a", "title": "T", "permalink": "/r/webdev/comments/a/t/",
                        "created_utc": 1760745600.0, "score": -3, "num_comments": 5,
                        "upvote_ratio": 0.4 } }
        ] } });
        let slugs = HashMap::from([("t3_a".to_string(), "alpha".to_string())]);
        let posts = parse_reddit_info(&body, &slugs);
        assert_eq!(posts[0].likes, 0);
        assert_eq!(posts[0].slug, "alpha");
        assert_eq!(posts[0].url, "https://www.reddit.com/r/webdev/comments/a/t/");
        assert_eq!(posts[0].posted_at, NaiveDate::from_ymd_opt(2025, 10, 18));
    }

    #[test]
    fn devto_ids_become_strings() {
        let posts = parse_devto_articles(&json!([{ "id": 42, "positive_reactions_count": 7 }]));
        assert_eq!(posts[0].post_id, "42");
        assert_eq!(posts[0].likes, 7);
    }

    #[test]
    fn non_array_bodies_yield_nothing() {
        assert!(parse_qiita_items(&json!({ "message": "x" })).is_empty());
        assert!(parse_reddit_info(&json!({}), &HashMap::new()).is_empty());
    }
}
