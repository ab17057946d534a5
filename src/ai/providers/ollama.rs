//! Local model server adapter (Ollama `/api/generate`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::ai::http;
use crate::ai::normalize::{clamp_chars, parse_quotes, require_text};
use crate::ai::provider::{Capability, Provider};
use crate::core::config::OllamaSettings;
use crate::core::models::KeyQuote;
use crate::errors::ProviderError;
use crate::prompt::single_turn;

pub const PROVIDER_ID: &str = "ollama";

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

pub struct OllamaProvider {
    http: Client,
    base_url: String,
    model: String,
    priority: u32,
}

impl OllamaProvider {
    pub fn new(settings: &OllamaSettings) -> Result<Self, ProviderError> {
        Ok(Self {
            http: http::build_client()?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            priority: settings.priority,
        })
    }

    async fn generate(&self, prompt: String, num_predict: usize) -> Result<String, ProviderError> {
        debug!(model = %self.model, num_predict, "Sending Ollama generate request");
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": { "num_predict": num_predict, "temperature": 0.4 }
        });
        let request = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .json(&body);
        let reply = http::send_json(request).await?;
        normalize_reply(&reply)
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    async fn generate_summary(
        &self,
        text: &str,
        max_length: usize,
    ) -> Result<String, ProviderError> {
        let prompt = single_turn(Capability::Summary, text, max_length, 0, "");
        let raw = self.generate(prompt, max_length / 3 + 64).await?;
        Ok(clamp_chars(&require_text(&raw, "summary")?, max_length))
    }

    async fn extract_key_quotes(
        &self,
        text: &str,
        max_quotes: usize,
    ) -> Result<Vec<KeyQuote>, ProviderError> {
        let prompt = single_turn(Capability::KeyQuotes, text, 0, max_quotes, "");
        let raw = self.generate(prompt, 120 * max_quotes.max(1) + 64).await?;
        parse_quotes(&raw, max_quotes)
    }

    async fn generate_social_post(&self, text: &str, tone: &str) -> Result<String, ProviderError> {
        let prompt = single_turn(Capability::SocialPost, text, 0, 0, tone);
        let raw = self.generate(prompt, 160).await?;
        require_text(&raw, "social post")
    }

    async fn generate_blog_post(&self, text: &str) -> Result<String, ProviderError> {
        let prompt = single_turn(Capability::BlogPost, text, 0, 0, "");
        let raw = self.generate(prompt, 1_500).await?;
        require_text(&raw, "blog post")
    }

    /// The server is up and has the configured model pulled.
    async fn is_available(&self) -> bool {
        let probe = self
            .http
            .get(format!("{}/api/tags", self.base_url))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await;
        let tags: Value = match probe {
            Ok(resp) if resp.status().is_success() => match resp.json().await {
                Ok(v) => v,
                Err(e) => {
                    info!("Ollama tags reply unreadable: {}", e);
                    return false;
                }
            },
            Ok(resp) => {
                info!(status = %resp.status(), "Ollama availability probe rejected");
                return false;
            }
            Err(e) => {
                info!("Ollama availability probe failed: {}", e);
                return false;
            }
        };
        has_model(&tags, &self.model)
    }
}

/// Whether an `/api/tags` listing contains `model` (with or without a `:tag` suffix).
#[must_use]
pub fn has_model(tags: &Value, model: &str) -> bool {
    tags.get("models")
        .and_then(Value::as_array)
        .is_some_and(|models| {
            models.iter().any(|m| {
                m.get("name")
                    .and_then(Value::as_str)
                    .is_some_and(|name| name == model || name.split(':').next() == Some(model))
            })
        })
}

/// Extract generated text from an `/api/generate` reply.
pub fn normalize_reply(reply: &Value) -> Result<String, ProviderError> {
    if let Some(error) = reply.get("error").and_then(Value::as_str) {
        let lowered = error.to_ascii_lowercase();
        return Err(if lowered.contains("not found") || lowered.contains("pull") {
            ProviderError::TemporarilyUnavailable(error.to_string())
        } else {
            ProviderError::MalformedResponse(error.to_string())
        });
    }
    let text = reply
        .get("response")
        .and_then(Value::as_str)
        .or_else(|| {
            reply
                .get("message")
                .and_then(|m| m.get("content"))
                .and_then(Value::as_str)
        })
        .ok_or_else(|| ProviderError::MalformedResponse("No text in Ollama response".to_string()))?;
    require_text(text, "generation")
}
