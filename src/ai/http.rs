//! HTTP plumbing shared by the remote provider adapters.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

use crate::errors::ProviderError;

/// Upper bound on a whole request; the transport applies the tighter per-operation timeout.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(120);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Build the HTTP client used by provider adapters.
pub fn build_client() -> Result<Client, ProviderError> {
    Client::builder()
        .user_agent(concat!("repurpose/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(CLIENT_TIMEOUT)
        .build()
        .map_err(|e| ProviderError::Network(format!("Failed to build HTTP client: {e}")))
}

/// Parse the `Retry-After` header as whole seconds.
///
/// `None` when the header is missing or not numeric, so the transport keeps its own backoff.
#[must_use]
pub fn parse_retry_after(resp: &Response) -> Option<Duration> {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after_value)
}

fn parse_retry_after_value(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Map a non-success status and its body to a provider error kind.
#[must_use]
pub fn classify_status(
    status: StatusCode,
    body: &str,
    retry_after: Option<Duration>,
) -> ProviderError {
    let detail = format!("status {status}: {}", excerpt(body));
    match status.as_u16() {
        401 | 403 => ProviderError::Auth(detail),
        429 => ProviderError::RateLimited {
            message: detail,
            retry_after,
        },
        408 => ProviderError::Network(detail),
        502..=504 => ProviderError::TemporarilyUnavailable(detail),
        500..=599 => ProviderError::Network(detail),
        _ => ProviderError::MalformedResponse(detail),
    }
}

/// Send a prepared request and return its JSON body, classifying any failure.
pub async fn send_json(request: reqwest::RequestBuilder) -> Result<Value, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::Network(format!("Request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let retry_after = if status == StatusCode::TOO_MANY_REQUESTS {
            parse_retry_after(&response)
        } else {
            None
        };
        let body = response.text().await.unwrap_or_else(|e| {
            format!("Failed to read error response body (status {status}): {e}")
        });
        return Err(classify_status(status, &body, retry_after));
    }

    let text = response
        .text()
        .await
        .map_err(|e| ProviderError::Network(format!("Failed to read response body: {e}")))?;
    serde_json::from_str(&text)
        .map_err(|e| ProviderError::MalformedResponse(format!("Invalid JSON in response: {e}")))
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_ERROR_BODY_CHARS {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
    out.push('…');
    out
}
