use std::time::Duration;
use thiserror::Error;

/// Normalized failure kinds a provider adapter may raise.
///
/// Adapters translate whatever the remote service returned into exactly one of
/// these. The transport decides retry behaviour from the kind alone.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider rejected credentials: {0}")]
    Auth(String),

    #[error("Provider rate limited the request: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("Provider temporarily unavailable: {0}")]
    TemporarilyUnavailable(String),

    #[error("Provider reply could not be normalized: {0}")]
    MalformedResponse(String),

    #[error("Failed to reach provider: {0}")]
    Network(String),

    #[error("Provider call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Provider does not support {0}")]
    Unsupported(String),
}

impl ProviderError {
    /// Whether the transport may try the same call again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::TemporarilyUnavailable(_)
                | Self::Network(_)
                | Self::Timeout(_)
        )
    }

    /// Delay the remote service asked for, if any.
    #[must_use]
    pub const fn suggested_delay(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Short stable label used in logs and aggregate reports.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::RateLimited { .. } => "rate_limited",
            Self::TemporarilyUnavailable(_) => "temporarily_unavailable",
            Self::MalformedResponse(_) => "malformed_response",
            Self::Network(_) => "network",
            Self::Timeout(_) => "timeout",
            Self::Unsupported(_) => "unsupported",
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            ProviderError::MalformedResponse(error.to_string())
        } else {
            ProviderError::Network(error.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(error: serde_json::Error) -> Self {
        ProviderError::MalformedResponse(error.to_string())
    }
}

/// One provider's terminal failure inside an aggregate report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub provider_id: String,
    pub error: ProviderError,
}

impl std::fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.provider_id, self.error)
    }
}

/// Failure of the content-extraction collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Failed to extract content from {source_reference}: {message}")]
pub struct ExtractionError {
    pub source_reference: String,
    pub message: String,
}

/// Errors surfaced to callers of the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    TranscriptExtraction(#[from] ExtractionError),

    #[error("All providers failed{}", format_failures(.attempts))]
    AggregateFailure { attempts: Vec<ProviderFailure> },
}

fn format_failures(attempts: &[ProviderFailure]) -> String {
    if attempts.is_empty() {
        return ": no provider was available".to_string();
    }
    let joined = attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    format!(": {joined}")
}
