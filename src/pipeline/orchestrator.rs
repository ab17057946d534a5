//! Drives one request from raw input to a [`ProcessResponse`].

use std::sync::Arc;

use chrono::Utc;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use super::extract::{ContentExtractor, ExtractedContent};
use super::fallback::FallbackSynthesizer;
use super::progress::{ProgressReporter, ProgressTracker};
use crate::ai::normalize::require_text;
use crate::ai::provider::{Capability, Provider};
use crate::ai::registry::ProviderRegistry;
use crate::ai::transport::Transport;
use crate::core::config::Settings;
use crate::core::models::{
    ProcessRequest, ProcessResponse, ProgressStatus, ProgressStep, ResolvedOptions,
};
use crate::errors::{ExtractionError, PipelineError, ProviderError, ProviderFailure};
use crate::prompt::estimate_tokens;

/// Longest resolved input handed to providers, in characters.
pub const MAX_INPUT_CHARS: usize = 48_000;

const BASE_CAPABILITIES: [Capability; 4] = [
    Capability::Summary,
    Capability::KeyQuotes,
    Capability::SocialPost,
    Capability::Metadata,
];

/// Resolved input for one request.
struct Resolved {
    text: String,
    extracted: Option<ExtractedContent>,
}

pub struct Orchestrator {
    settings: Arc<Settings>,
    registry: Arc<ProviderRegistry>,
    transport: Transport,
    fallback: FallbackSynthesizer,
    extractor: Arc<dyn ContentExtractor>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        settings: Arc<Settings>,
        registry: Arc<ProviderRegistry>,
        extractor: Arc<dyn ContentExtractor>,
    ) -> Self {
        let transport = Transport::new(settings.transport);
        Self {
            settings,
            registry,
            transport,
            fallback: FallbackSynthesizer::new(),
            extractor,
        }
    }

    #[must_use]
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Process one request, reporting progress to `reporter`.
    ///
    /// Progress is delivered off the request path, so a slow reporter never
    /// delays the response.
    ///
    /// # Errors
    ///
    /// `Validation` when the request carries neither content nor a source
    /// reference. `TranscriptExtraction` or `AggregateFailure` when no
    /// provider produced a result and emergency fallback is disabled.
    pub async fn process(
        &self,
        request: &ProcessRequest,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Result<ProcessResponse, PipelineError> {
        let request_id = Uuid::new_v4().to_string();
        let span = info_span!(
            "process",
            request_id = %request_id,
            content_type = request.content_type.as_str()
        );
        let tracker = ProgressTracker::new(request_id, reporter);
        self.run(request, &tracker).instrument(span).await
    }

    async fn run(
        &self,
        request: &ProcessRequest,
        tracker: &ProgressTracker,
    ) -> Result<ProcessResponse, PipelineError> {
        tracker.emit(ProgressStatus::Queued, ProgressStep::Queued, None);

        if let Err(e) = validate(request) {
            warn!("Rejecting request: {}", e);
            tracker.emit(ProgressStatus::Error, ProgressStep::Aborted, Some("invalid request"));
            return Err(e);
        }

        let options = request.options.resolve(&self.settings.default_options());
        tracker.emit(ProgressStatus::Processing, ProgressStep::Resolving, None);

        let resolved = match self.resolve(request).await {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!("Content extraction failed: {}", e);
                return self.fall_back(tracker, request, None, &options, e);
            }
        };

        let required: Vec<Capability> = BASE_CAPABILITIES
            .into_iter()
            .chain(options.generate_blog.then_some(Capability::BlogPost))
            .collect();

        let mut tried: Vec<String> = Vec::new();
        let mut failures: Vec<ProviderFailure> = Vec::new();

        while let Some(provider) = self.registry.select(&tried, &required).await {
            let provider_id = provider.id().to_string();
            tried.push(provider_id.clone());
            tracker.emit(
                ProgressStatus::Processing,
                ProgressStep::Dispatching,
                Some(&provider_id),
            );

            match self
                .dispatch(&provider, request, &resolved, &options)
                .await
            {
                Ok(response) => {
                    tracker.emit(ProgressStatus::Processing, ProgressStep::Assembling, None);
                    info!(
                        provider = provider_id.as_str(),
                        attempts = tried.len(),
                        "Request completed with provider output"
                    );
                    tracker.emit(ProgressStatus::Complete, ProgressStep::Completed, None);
                    return Ok(response);
                }
                Err(error) => {
                    warn!(
                        provider = provider_id.as_str(),
                        kind = error.kind(),
                        "Provider batch failed: {}",
                        error
                    );
                    self.registry.invalidate(&provider_id);
                    failures.push(ProviderFailure { provider_id, error });
                }
            }
        }

        let aggregate = PipelineError::AggregateFailure { attempts: failures };
        self.fall_back(tracker, request, Some(&resolved.text), &options, aggregate)
    }

    /// Substitute synthesized output for `cause` when emergency fallback is
    /// enabled; otherwise surface `cause`.
    fn fall_back(
        &self,
        tracker: &ProgressTracker,
        request: &ProcessRequest,
        text: Option<&str>,
        options: &ResolvedOptions,
        cause: PipelineError,
    ) -> Result<ProcessResponse, PipelineError> {
        if !self.settings.emergency_fallback_enabled {
            error!("Request failed: {}", cause);
            tracker.emit(ProgressStatus::Error, ProgressStep::Aborted, None);
            return Err(cause);
        }

        warn!("Serving fallback content: {}", cause);
        let response = self.fallback.synthesize(request, text, options);
        tracker.emit(ProgressStatus::Complete, ProgressStep::FallenBack, None);
        Ok(response)
    }

    async fn resolve(&self, request: &ProcessRequest) -> Result<Resolved, PipelineError> {
        let (text, extracted) = match request.inline_content() {
            Some(content) => (content.to_string(), None),
            None => {
                // validate() guarantees a source reference when content is blank.
                let source = request.source().unwrap_or_default();
                debug!(source, "Extracting content from source reference");
                let extracted = self.extractor.extract(source, request.content_type).await?;
                if extracted.text.trim().is_empty() {
                    return Err(ExtractionError {
                        source_reference: source.to_string(),
                        message: "extracted content is empty".to_string(),
                    }
                    .into());
                }
                (extracted.text.clone(), Some(extracted))
            }
        };

        let text = truncate_input(text.trim());
        debug!(
            chars = text.chars().count(),
            estimated_tokens = estimate_tokens(&text),
            "Resolved input text"
        );
        Ok(Resolved { text, extracted })
    }

    /// Run every capability the request needs against one provider. All calls
    /// run concurrently and the first failure fails the whole batch.
    async fn dispatch(
        &self,
        provider: &Arc<dyn Provider>,
        request: &ProcessRequest,
        resolved: &Resolved,
        options: &ResolvedOptions,
    ) -> Result<ProcessResponse, ProviderError> {
        let id = provider.id();
        let text = resolved.text.as_str();
        let transport = &self.transport;

        let summary = async {
            let raw = transport
                .call(id, Capability::Summary, || {
                    provider.generate_summary(text, options.max_summary_length)
                })
                .await?;
            require_text(&raw, "summary")
        };

        let quotes = async {
            let mut quotes = transport
                .call(id, Capability::KeyQuotes, || {
                    provider.extract_key_quotes(text, options.max_quotes)
                })
                .await?;
            quotes.retain(|q| !q.text.trim().is_empty());
            if quotes.is_empty() {
                return Err(ProviderError::MalformedResponse(
                    "provider returned no key quotes".to_string(),
                ));
            }
            quotes.truncate(options.max_quotes.max(1));
            Ok(quotes)
        };

        let social = async {
            let raw = transport
                .call(id, Capability::SocialPost, || {
                    provider.generate_social_post(text, &options.social_tone)
                })
                .await?;
            require_text(&raw, "social post")
        };

        let metadata = transport.call(id, Capability::Metadata, || {
            provider.extract_metadata(request.source(), request.content_type, text)
        });

        let blog = async {
            if !options.generate_blog {
                return Ok(None);
            }
            let raw = transport
                .call(id, Capability::BlogPost, || provider.generate_blog_post(text))
                .await?;
            require_text(&raw, "blog post").map(Some)
        };

        let (summary, key_quotes, social_post, mut content_metadata, blog_post) =
            futures::try_join!(summary, quotes, social, metadata, blog)?;

        if let Some(extracted) = &resolved.extracted {
            if let Some(title) = &extracted.title {
                content_metadata.title.clone_from(title);
            }
            if content_metadata.duration.is_none() {
                content_metadata.duration.clone_from(&extracted.duration);
            }
        }

        Ok(ProcessResponse {
            summary,
            key_quotes,
            social_post,
            blog_post,
            content_metadata,
            is_real_ai_content: true,
            is_mock_fallback: false,
            provider_id: id.to_string(),
            processed_at: Utc::now(),
        })
    }
}

fn validate(request: &ProcessRequest) -> Result<(), PipelineError> {
    if request.inline_content().is_none() && request.source().is_none() {
        return Err(PipelineError::Validation(
            "either content or sourceReference is required".to_string(),
        ));
    }
    Ok(())
}

fn truncate_input(text: &str) -> String {
    match text.char_indices().nth(MAX_INPUT_CHARS) {
        Some((idx, _)) => {
            warn!(
                limit = MAX_INPUT_CHARS,
                "Input exceeds length cap; truncating"
            );
            text[..idx].to_string()
        }
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ContentType;

    #[test]
    fn test_validate_requires_content_or_reference() {
        assert!(validate(&ProcessRequest::text("   ")).is_err());
        assert!(validate(&ProcessRequest::default()).is_err());
        assert!(validate(&ProcessRequest::text("hello")).is_ok());
        assert!(validate(&ProcessRequest::reference("https://a.b/c", ContentType::Link)).is_ok());
    }

    #[test]
    fn test_truncate_input_caps_characters() {
        let long = "é".repeat(MAX_INPUT_CHARS + 10);
        assert_eq!(truncate_input(&long).chars().count(), MAX_INPUT_CHARS);
        assert_eq!(truncate_input("short"), "short");
    }
}
