//! Content-extraction collaborators: turn a source reference into usable text.
//!
//! Transcript services live outside this crate; the pipeline only depends on
//! [`ContentExtractor`]. A plain web page fetcher is provided for `link` inputs.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use crate::core::models::ContentType;
use crate::errors::ExtractionError;

const PAGE_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_PAGE_BYTES: usize = 2 * 1024 * 1024;
const TEXT_WIDTH: usize = 100;

/// Text recovered from a source reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub text: String,
    pub title: Option<String>,
    pub duration: Option<String>,
}

#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(
        &self,
        source_reference: &str,
        content_type: ContentType,
    ) -> Result<ExtractedContent, ExtractionError>;
}

fn failure(source_reference: &str, message: impl Into<String>) -> ExtractionError {
    ExtractionError {
        source_reference: source_reference.to_string(),
        message: message.into(),
    }
}

/// Rejects every reference. Used when no extraction backend is deployed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoExtractor;

#[async_trait]
impl ContentExtractor for NoExtractor {
    async fn extract(
        &self,
        source_reference: &str,
        content_type: ContentType,
    ) -> Result<ExtractedContent, ExtractionError> {
        Err(failure(
            source_reference,
            format!("no extractor configured for {content_type} content"),
        ))
    }
}

/// Serves pre-fetched text keyed by source reference.
#[derive(Debug, Default, Clone)]
pub struct StaticExtractor {
    entries: HashMap<String, ExtractedContent>,
}

impl StaticExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, source_reference: impl Into<String>, text: impl Into<String>) -> Self {
        self.entries.insert(
            source_reference.into(),
            ExtractedContent {
                text: text.into(),
                title: None,
                duration: None,
            },
        );
        self
    }
}

#[async_trait]
impl ContentExtractor for StaticExtractor {
    async fn extract(
        &self,
        source_reference: &str,
        _content_type: ContentType,
    ) -> Result<ExtractedContent, ExtractionError> {
        self.entries
            .get(source_reference)
            .cloned()
            .ok_or_else(|| failure(source_reference, "unknown source reference"))
    }
}

/// Fetches `http(s)` pages for `link` requests and converts the HTML to text.
/// Other content types are rejected; they need a transcript service.
pub struct HttpPageExtractor {
    http: Client,
}

impl HttpPageExtractor {
    pub fn new() -> Result<Self, ExtractionError> {
        let http = Client::builder()
            .user_agent(concat!("repurpose/", env!("CARGO_PKG_VERSION")))
            .timeout(PAGE_TIMEOUT)
            .build()
            .map_err(|e| failure("-", format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl ContentExtractor for HttpPageExtractor {
    async fn extract(
        &self,
        source_reference: &str,
        content_type: ContentType,
    ) -> Result<ExtractedContent, ExtractionError> {
        if content_type != ContentType::Link {
            return Err(failure(
                source_reference,
                format!("{content_type} content requires a transcript service"),
            ));
        }
        let url = Url::parse(source_reference)
            .map_err(|e| failure(source_reference, format!("invalid URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(failure(source_reference, "only http(s) links are supported"));
        }

        debug!(%url, "Fetching page for extraction");
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| failure(source_reference, format!("request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(failure(source_reference, format!("page returned status {status}")));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| failure(source_reference, format!("failed to read page: {e}")))?;
        let html = &bytes[..bytes.len().min(MAX_PAGE_BYTES)];

        let content = html_to_content(html)
            .map_err(|e| failure(source_reference, format!("failed to convert page: {e}")))?;
        if content.text.trim().is_empty() {
            return Err(failure(source_reference, "page contained no readable text"));
        }
        info!(%url, chars = content.text.len(), "Extracted page text");
        Ok(content)
    }
}

/// Convert an HTML document to plain text, picking up its `<title>`.
pub fn html_to_content(html: &[u8]) -> Result<ExtractedContent, html2text::Error> {
    let text = html2text::from_read(html, TEXT_WIDTH)?;
    let lowered = String::from_utf8_lossy(html);
    let title = extract_title(&lowered);
    Ok(ExtractedContent {
        text: text.trim().to_string(),
        title,
        duration: None,
    })
}

fn extract_title(html: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let start = lower.find("<title")?;
    let open_end = lower[start..].find('>')? + start + 1;
    let close = lower[open_end..].find("</title>")? + open_end;
    let title = html[open_end..close].split_whitespace().collect::<Vec<_>>().join(" ");
    (!title.is_empty()).then_some(title)
}
