//! Concrete provider adapters

pub mod huggingface;
pub mod ollama;
pub mod openai;

use std::sync::Arc;

use tracing::{info, warn};

use super::provider::Provider;
use crate::core::config::Settings;

pub use huggingface::HuggingFaceProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Build every provider that has configuration. Adapters that fail to
/// initialize are logged and left out.
#[must_use]
pub fn build_providers(settings: &Settings) -> Vec<Arc<dyn Provider>> {
    let mut providers: Vec<Arc<dyn Provider>> = Vec::new();

    if let Some(cfg) = &settings.openai {
        match OpenAiProvider::new(cfg) {
            Ok(p) => providers.push(Arc::new(p)),
            Err(e) => warn!("Skipping OpenAI provider: {}", e),
        }
    }
    if let Some(cfg) = &settings.huggingface {
        match HuggingFaceProvider::new(cfg) {
            Ok(p) => providers.push(Arc::new(p)),
            Err(e) => warn!("Skipping Hugging Face provider: {}", e),
        }
    }
    if let Some(cfg) = &settings.ollama {
        match OllamaProvider::new(cfg) {
            Ok(p) => providers.push(Arc::new(p)),
            Err(e) => warn!("Skipping Ollama provider: {}", e),
        }
    }

    info!(
        providers = ?providers.iter().map(|p| p.id().to_string()).collect::<Vec<_>>(),
        "Configured generation providers"
    );
    providers
}
