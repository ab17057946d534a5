/// Repurpose - turns long-form content into summaries, key quotes, social posts
/// and blog drafts using interchangeable AI providers.
///
/// The crate is the orchestration core: a provider capability trait with
/// adapters for OpenAI, Hugging Face and Ollama, a retrying transport, a
/// priority-ordered registry, a deterministic fallback and progress reporting.
///
/// # Architecture
///
/// The system uses:
/// - reqwest for provider HTTP calls
/// - tokio-retry for the backoff schedule
/// - `futures::try_join!` to run one provider's capability batch concurrently
/// - tracing for structured logs
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use repurpose::ai::{ProviderRegistry, build_providers};
/// use repurpose::core::config::Settings;
/// use repurpose::core::models::ProcessRequest;
/// use repurpose::pipeline::{LogReporter, NoExtractor, Orchestrator};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     repurpose::setup_logging();
///
///     let settings = Arc::new(Settings::from_env()?);
///     let registry = Arc::new(ProviderRegistry::new(build_providers(&settings), &settings));
///     let orchestrator = Orchestrator::new(settings, registry, Arc::new(NoExtractor));
///
///     let request = ProcessRequest::text("Short article about remote work.");
///     let response = orchestrator.process(&request, Arc::new(LogReporter)).await?;
///     println!("Summary: {}", response.summary);
///     Ok(())
/// }
/// ```
// Module declarations
pub mod ai;
pub mod core;
pub mod errors;
pub mod pipeline;
pub mod prompt;

pub use errors::{PipelineError, ProviderError};
pub use pipeline::Orchestrator;

/// Configure structured JSON logging.
///
/// The level comes from `RUST_LOG` and defaults to `info`. Calling this more
/// than once is harmless; later calls leave the first subscriber in place.
///
/// # Example
///
/// ```
/// repurpose::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_target(true)
        .with_writer(std::io::stderr);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
