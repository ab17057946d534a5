use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of material a request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    #[default]
    Text,
    Link,
    Audio,
    Video,
    /// A reference (e.g. a video id) whose transcript is the usable text.
    #[serde(alias = "transcript-bearing-reference", alias = "youtube")]
    Transcript,
}

impl ContentType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Link => "link",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Transcript => "transcript",
        }
    }

    /// Media whose text normally comes from a transcript and carries timestamps.
    #[must_use]
    pub const fn is_timed_media(self) -> bool {
        matches!(self, Self::Audio | Self::Video | Self::Transcript)
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request generation options. Unset fields fall back to process defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessOptions {
    pub max_summary_length: Option<usize>,
    pub max_quotes: Option<usize>,
    pub social_tone: Option<String>,
    pub generate_blog: Option<bool>,
}

/// Options after merging a request over the configured defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedOptions {
    pub max_summary_length: usize,
    pub max_quotes: usize,
    pub social_tone: String,
    pub generate_blog: bool,
}

impl ProcessOptions {
    /// Shallow merge: every field set on `self` wins over `defaults`.
    #[must_use]
    pub fn resolve(&self, defaults: &ResolvedOptions) -> ResolvedOptions {
        ResolvedOptions {
            max_summary_length: self
                .max_summary_length
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_summary_length),
            max_quotes: self
                .max_quotes
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_quotes),
            social_tone: self
                .social_tone
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map_or_else(|| defaults.social_tone.clone(), ToString::to_string),
            generate_blog: self.generate_blog.unwrap_or(defaults.generate_blog),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub source_reference: Option<String>,
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default)]
    pub options: ProcessOptions,
}

impl ProcessRequest {
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            content_type: ContentType::Text,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn reference(source_reference: impl Into<String>, content_type: ContentType) -> Self {
        Self {
            source_reference: Some(source_reference.into()),
            content_type,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ProcessOptions) -> Self {
        self.options = options;
        self
    }

    /// Inline content, if any non-whitespace text was supplied.
    #[must_use]
    pub fn inline_content(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.trim().is_empty())
    }

    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source_reference
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyQuote {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl KeyQuote {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: None,
        }
    }

    #[must_use]
    pub fn at(text: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: Some(timestamp.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMetadata {
    pub title: String,
    pub source_type: ContentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub summary: String,
    pub key_quotes: Vec<KeyQuote>,
    pub social_post: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blog_post: Option<String>,
    pub content_metadata: ContentMetadata,
    pub is_real_ai_content: bool,
    pub is_mock_fallback: bool,
    pub provider_id: String,
    pub processed_at: DateTime<Utc>,
}

impl ProcessResponse {
    /// Exactly one origin flag set and at least one non-empty artifact.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.is_real_ai_content != self.is_mock_fallback
            && !(self.summary.trim().is_empty() && self.key_quotes.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Queued,
    Processing,
    Complete,
    Error,
}

impl ProgressStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

/// Phase of one request's lifecycle, in the order a run moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStep {
    Queued,
    Resolving,
    Dispatching,
    Assembling,
    Completed,
    FallenBack,
    Aborted,
}

impl ProgressStep {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Queued => "Request queued",
            Self::Resolving => "Resolving content",
            Self::Dispatching => "Generating with provider",
            Self::Assembling => "Assembling results",
            Self::Completed => "Processing complete",
            Self::FallenBack => "Completed with fallback content",
            Self::Aborted => "Processing failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub request_id: String,
    pub status: ProgressStatus,
    pub step: ProgressStep,
    /// Human readable phase label, optionally with detail such as the provider id.
    pub message: String,
}
