//! Capability contract every generation backend implements.

use async_trait::async_trait;
use url::Url;

use crate::core::models::{ContentMetadata, ContentType, KeyQuote};
use crate::errors::ProviderError;

/// One operation a provider can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Summary,
    KeyQuotes,
    SocialPost,
    BlogPost,
    Metadata,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::Summary,
        Capability::KeyQuotes,
        Capability::SocialPost,
        Capability::BlogPost,
        Capability::Metadata,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::KeyQuotes => "key_quotes",
            Self::SocialPost => "social_post",
            Self::BlogPost => "blog_post",
            Self::Metadata => "metadata",
        }
    }
}

/// A generation backend.
///
/// Implementations translate every remote failure into a [`ProviderError`]
/// kind and every successful reply into the normalized return types below.
/// Callers never see a raw provider reply.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable identifier reported as `providerId` on responses.
    fn id(&self) -> &str;

    /// Lower is preferred.
    fn priority(&self) -> u32;

    fn capabilities(&self) -> &[Capability] {
        &Capability::ALL
    }

    fn supports(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    async fn generate_summary(&self, text: &str, max_length: usize)
    -> Result<String, ProviderError>;

    async fn extract_key_quotes(
        &self,
        text: &str,
        max_quotes: usize,
    ) -> Result<Vec<KeyQuote>, ProviderError>;

    async fn generate_social_post(&self, text: &str, tone: &str) -> Result<String, ProviderError>;

    async fn generate_blog_post(&self, text: &str) -> Result<String, ProviderError> {
        let _ = text;
        Err(ProviderError::Unsupported(
            Capability::BlogPost.as_str().to_string(),
        ))
    }

    /// Describe the source. The default derives metadata locally and never fails.
    async fn extract_metadata(
        &self,
        source_reference: Option<&str>,
        content_type: ContentType,
        text: &str,
    ) -> Result<ContentMetadata, ProviderError> {
        Ok(local_metadata(source_reference, content_type, text))
    }

    /// Whether the provider can currently take calls. Must not fail; may probe.
    async fn is_available(&self) -> bool;
}

const MAX_TITLE_CHARS: usize = 80;

/// Metadata derived from the request alone: URL path or host, else first line of text.
#[must_use]
pub fn local_metadata(
    source_reference: Option<&str>,
    content_type: ContentType,
    text: &str,
) -> ContentMetadata {
    let from_reference = source_reference.and_then(title_from_reference);
    let from_text = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| truncate_title(line.trim_start_matches('#').trim()));

    let title = from_reference
        .or(from_text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| default_title(content_type).to_string());

    ContentMetadata {
        title,
        source_type: content_type,
        duration: None,
    }
}

fn title_from_reference(reference: &str) -> Option<String> {
    let url = Url::parse(reference.trim()).ok()?;
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .map(|s| s.replace(['-', '_'], " "));

    match segment {
        Some(seg) if seg.chars().any(char::is_alphabetic) => Some(truncate_title(&seg)),
        _ => url.host_str().map(ToString::to_string),
    }
}

fn truncate_title(raw: &str) -> String {
    let cleaned = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.chars().count() <= MAX_TITLE_CHARS {
        return cleaned;
    }
    let mut out: String = cleaned.chars().take(MAX_TITLE_CHARS - 3).collect();
    out.push_str("...");
    out
}

const fn default_title(content_type: ContentType) -> &'static str {
    match content_type {
        ContentType::Text => "Untitled text",
        ContentType::Link => "Web article",
        ContentType::Audio => "Audio recording",
        ContentType::Video | ContentType::Transcript => "Video transcript",
    }
}
