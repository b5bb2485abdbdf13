//! Shared HTTP plumbing for the generation and publishing boundaries.
//!
//! One `reqwest::Client` per process, a status-code taxonomy shared by every
//! external API, and a bounded retry helper for idempotent calls.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const MAX_RETRIES: u32 = 2;
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BODY_IN_ERROR: usize = 500;

pub const USER_AGENT: &str = concat!("syndic/", env!("CARGO_PKG_VERSION"));

/// Typed failure from an external API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{service} rate limited or out of quota (HTTP {status}): {body}")]
    RateLimited {
        service: String,
        status: u16,
        body: String,
    },

    #[error("{service} rejected credentials (HTTP {status})")]
    Auth {
        service: String,
        status: u16,
        body: String,
    },

    #[error("{service} rejected the payload (HTTP {status}): {body}")]
    MalformedPayload {
        service: String,
        status: u16,
        body: String,
    },

    #[error("{service} unavailable (HTTP {status})")]
    Outage {
        service: String,
        status: u16,
        body: String,
    },

    #[error("{service} returned HTTP {status}: {body}")]
    Http {
        service: String,
        status: u16,
        body: String,
    },

    #[error("{service} request timed out")]
    Timeout { service: String },

    #[error("{service} transport error: {message}")]
    Transport { service: String, message: String },

    /// A 2xx response that carried an API-level error.
    #[error("{service} reported an error: {message}")]
    Rejected { service: String, message: String },

    #[error("{service} response could not be decoded: {message}")]
    Decode { service: String, message: String },
}

impl ApiError {
    /// Short machine-readable kind for reports and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::RateLimited { .. } => "rate_limited",
            ApiError::Auth { .. } => "auth",
            ApiError::MalformedPayload { .. } => "malformed_payload",
            ApiError::Outage { .. } => "outage",
            ApiError::Http { .. } => "http",
            ApiError::Timeout { .. } => "timeout",
            ApiError::Transport { .. } => "transport",
            ApiError::Rejected { .. } => "rejected",
            ApiError::Decode { .. } => "decode",
        }
    }

    pub fn from_reqwest(service: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout {
                service: service.to_string(),
            }
        } else if err.is_decode() {
            ApiError::Decode {
                service: service.to_string(),
                message: redact(&err.to_string()),
            }
        } else {
            ApiError::Transport {
                service: service.to_string(),
                message: redact(&err.to_string()),
            }
        }
    }

    pub fn rejected(service: &str, message: impl Into<String>) -> Self {
        ApiError::Rejected {
            service: service.to_string(),
            message: message.into(),
        }
    }

    pub fn decode(service: &str, message: impl Into<String>) -> Self {
        ApiError::Decode {
            service: service.to_string(),
            message: message.into(),
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Outage { .. } | ApiError::Transport { .. })
    }
}

/// Map a non-success status to its typed failure. Never returns success.
pub fn classify_status(service: &str, status: u16, body: &str) -> ApiError {
    let service = service.to_string();
    let body = truncate(&redact(body), MAX_BODY_IN_ERROR);
    match status {
        401 | 403 => ApiError::Auth {
            service,
            status,
            body,
        },
        402 | 429 => ApiError::RateLimited {
            service,
            status,
            body,
        },
        400 | 413 | 422 => ApiError::MalformedPayload {
            service,
            status,
            body,
        },
        500..=599 => ApiError::Outage {
            service,
            status,
            body,
        },
        _ => ApiError::Http {
            service,
            status,
            body,
        },
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

static BEARER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(bearer|basic)\s+[A-Za-z0-9._~+/=-]+").unwrap());
static LONG_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9_-])[A-Za-z0-9_-]{40,}(?:[^A-Za-z0-9_-]|$)").unwrap()
});

/// Strip credentials that a platform might echo back in an error body.
pub fn redact(message: &str) -> String {
    let out = BEARER.replace_all(message, "$1 [REDACTED]");
    LONG_TOKEN.replace_all(&out, " [REDACTED_KEY] ").to_string()
}

/// Build the process-wide client.
pub fn build_client() -> Result<Client, ApiError> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(DEFAULT_REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .use_rustls_tls()
        .build()
        .map_err(|e| ApiError::Transport {
            service: "http-client".to_string(),
            message: e.to_string(),
        })
}

/// Send once and turn any non-2xx status into a typed error.
pub async fn send(service: &str, request: RequestBuilder) -> Result<Response, ApiError> {
    let response = request
        .send()
        .await
        .map_err(|e| ApiError::from_reqwest(service, e))?;
    ensure_success(service, response).await
}

pub async fn ensure_success(service: &str, response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(classify_status(service, status.as_u16(), &body))
}

pub async fn read_json<T: DeserializeOwned>(service: &str, response: Response) -> Result<T, ApiError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ApiError::from_reqwest(service, e))?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::decode(service, e.to_string()))
}

/// Send with up to two retries on 5xx and network errors (1s, 2s backoff).
///
/// Only for idempotent calls: publishing endpoints go through [`send`] so a
/// post the platform already accepted is never submitted twice.
pub async fn send_with_retry(service: &str, request: RequestBuilder) -> Result<Response, ApiError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let this_try = request.try_clone().ok_or_else(|| ApiError::Transport {
            service: service.to_string(),
            message: "request body cannot be cloned for retry".to_string(),
        })?;
        debug!(service, attempt, "executing HTTP request");
        match send(service, this_try).await {
            Ok(response) => return Ok(response),
            Err(err) if err.is_retryable() && attempt <= MAX_RETRIES => {
                warn!(service, attempt, error = %err, "retrying after transient failure");
                tokio::time::sleep(INITIAL_BACKOFF * attempt).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_taxonomy() {
        assert_eq!(classify_status("devto", 401, "").kind(), "auth");
        assert_eq!(classify_status("devto", 403, "").kind(), "auth");
        assert_eq!(classify_status("x", 402, "credits").kind(), "rate_limited");
        assert_eq!(classify_status("qiita", 429, "").kind(), "rate_limited");
        assert_eq!(classify_status("qiita", 422, "bad tag").kind(), "malformed_payload");
        assert_eq!(classify_status("qiita", 503, "").kind(), "outage");
        assert_eq!(classify_status("qiita", 404, "").kind(), "http");
    }

    #[test]
    fn error_bodies_are_redacted_and_truncated() {
        let body = format!("Authorization: Bearer abc.def {}", "x".repeat(2000));
        let err = classify_status("devto", 400, &body);
        let text = err.to_string();
        assert!(!text.contains("abc.def"));
        assert!(text.len() < 700);
    }

    #[test]
    fn only_outages_and_transport_are_retryable() {
        assert!(classify_status("a", 502, "").is_retryable());
        assert!(!classify_status("a", 429, "").is_retryable());
        assert!(!classify_status("a", 401, "").is_retryable());
    }
}
