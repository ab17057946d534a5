//! Hugging Face Inference API adapter.
//!
//! Summaries come from a dedicated summarization model; quotes, social posts and
//! blog posts from an instruction-tuned text-generation model.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

use crate::ai::http;
use crate::ai::normalize::{clamp_chars, parse_quotes, require_text};
use crate::ai::provider::{Capability, Provider};
use crate::core::config::HuggingFaceSettings;
use crate::core::models::KeyQuote;
use crate::errors::ProviderError;
use crate::prompt::{clip_source, single_turn};

pub const PROVIDER_ID: &str = "huggingface";

/// Summarization models reject inputs much past this many characters.
const MAX_SUMMARY_INPUT_CHARS: usize = 3_500;

pub struct HuggingFaceProvider {
    http: Client,
    api_key: String,
    base_url: String,
    summary_model: String,
    generation_model: String,
    priority: u32,
}

impl HuggingFaceProvider {
    pub fn new(settings: &HuggingFaceSettings) -> Result<Self, ProviderError> {
        Ok(Self {
            http: http::build_client()?,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            summary_model: settings.summary_model.clone(),
            generation_model: settings.generation_model.clone(),
            priority: settings.priority,
        })
    }

    async fn infer(&self, model: &str, body: Value) -> Result<Value, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::Auth("HUGGINGFACE_API_KEY is empty".to_string()));
        }
        debug!(model, "Sending Hugging Face inference request");
        let request = self
            .http
            .post(format!("{}/{}", self.base_url, model))
            .bearer_auth(&self.api_key)
            .json(&body);
        http::send_json(request).await
    }

    async fn generate(&self, prompt: String, max_new_tokens: usize) -> Result<String, ProviderError> {
        let body = json!({
            "inputs": prompt,
            "parameters": {
                "max_new_tokens": max_new_tokens,
                "temperature": 0.4,
                "return_full_text": false
            },
            "options": { "wait_for_model": false }
        });
        let reply = self.infer(&self.generation_model, body).await?;
        normalize_reply(&reply, Some(prompt.as_str()))
    }
}

#[async_trait]
impl Provider for HuggingFaceProvider {
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
        let input: String = clip_source(text).chars().take(MAX_SUMMARY_INPUT_CHARS).collect();
        // Model lengths are in tokens; roughly four characters each.
        let max_tokens = (max_length / 4).clamp(30, 512);
        let body = json!({
            "inputs": input,
            "parameters": {
                "max_length": max_tokens,
                "min_length": (max_tokens / 4).max(10),
                "do_sample": false
            },
            "options": { "wait_for_model": false }
        });
        let reply = self.infer(&self.summary_model, body).await?;
        let summary = normalize_reply(&reply, None)?;
        Ok(clamp_chars(&summary, max_length))
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

    /// Credential check only; a real inference probe would spend quota.
    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Extract text from an Inference API reply.
///
/// Handles `[{"summary_text"}]`, `[{"generated_text"}]`, the same objects
/// without the array, and `{"error", "estimated_time"}` replies. When the
/// model echoes `prompt`, the echo is removed.
pub fn normalize_reply(reply: &Value, prompt: Option<&str>) -> Result<String, ProviderError> {
    if let Some(error) = reply.get("error") {
        return Err(classify_inline_error(error, reply.get("estimated_time")));
    }

    let first = match reply {
        Value::Array(items) => items.first(),
        Value::Object(_) => Some(reply),
        _ => None,
    };

    let text = first
        .and_then(|item| {
            item.get("summary_text")
                .or_else(|| item.get("generated_text"))
                .and_then(Value::as_str)
        })
        .or_else(|| reply.as_str())
        .ok_or_else(|| {
            ProviderError::MalformedResponse("No text in Hugging Face response".to_string())
        })?;

    let text = match prompt {
        Some(p) => text.strip_prefix(p).unwrap_or(text),
        None => text,
    };
    require_text(text, "generation")
}

fn classify_inline_error(error: &Value, estimated_time: Option<&Value>) -> ProviderError {
    let message = error
        .as_str()
        .map(ToString::to_string)
        .or_else(|| error.get("message").and_then(Value::as_str).map(ToString::to_string))
        .unwrap_or_else(|| error.to_string());
    let lowered = message.to_ascii_lowercase();

    if estimated_time.is_some() || lowered.contains("loading") {
        ProviderError::TemporarilyUnavailable(message)
    } else if lowered.contains("rate limit") || lowered.contains("too many requests") {
        ProviderError::RateLimited {
            message,
            retry_after: None,
        }
    } else if lowered.contains("authorization") || lowered.contains("invalid token") {
        ProviderError::Auth(message)
    } else {
        ProviderError::MalformedResponse(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_text_shape() {
        let reply = json!([{"summary_text": " A short summary. "}]);
        assert_eq!(normalize_reply(&reply, None).unwrap(), "A short summary.");
    }

    #[test]
    fn test_generated_text_strips_prompt_echo() {
        let prompt = "PROMPT:\n";
        let reply = json!([{"generated_text": "PROMPT:\nThe answer"}]);
        assert_eq!(normalize_reply(&reply, Some(prompt)).unwrap(), "The answer");

        let reply = json!({"generated_text": "Bare object"});
        assert_eq!(normalize_reply(&reply, Some(prompt)).unwrap(), "Bare object");
    }

    #[test]
    fn test_loading_model_is_temporarily_unavailable() {
        let reply = json!({"error": "Model facebook/bart-large-cnn is currently loading", "estimated_time": 20.0});
        assert!(matches!(
            normalize_reply(&reply, None),
            Err(ProviderError::TemporarilyUnavailable(_))
        ));
    }

    #[test]
    fn test_inline_error_kinds() {
        let reply = json!({"error": "Rate limit reached. Please log in"});
        assert!(matches!(
            normalize_reply(&reply, None),
            Err(ProviderError::RateLimited { .. })
        ));

        let reply = json!({"error": "Authorization header is invalid"});
        assert!(matches!(normalize_reply(&reply, None), Err(ProviderError::Auth(_))));
    }

    #[test]
    fn test_token_limit_errors_are_not_auth() {
        let reply = json!({"error": "Input validation error: `inputs` tokens + `max_new_tokens` must be <= 8192"});
        assert!(matches!(
            normalize_reply(&reply, None),
            Err(ProviderError::MalformedResponse(_))
        ));

        let reply = json!({"error": "Invalid token passed"});
        assert!(matches!(normalize_reply(&reply, None), Err(ProviderError::Auth(_))));
    }

    #[test]
    fn test_empty_generation_is_malformed() {
        let reply = json!([{"generated_text": "   "}]);
        assert!(matches!(
            normalize_reply(&reply, None),
            Err(ProviderError::MalformedResponse(_))
        ));
        assert!(normalize_reply(&json!(42), None).is_err());
    }

    #[tokio::test]
    async fn test_availability_requires_credentials() {
        let settings = HuggingFaceSettings {
            api_key: String::new(),
            base_url: "http://127.0.0.1:9".to_string(),
            summary_model: "s".to_string(),
            generation_model: "g".to_string(),
            priority: 2,
        };
        let provider = HuggingFaceProvider::new(&settings).unwrap();
        assert!(!provider.is_available().await);
        assert!(matches!(
            provider.generate_summary("text", 100).await,
            Err(ProviderError::Auth(_))
        ));
    }
}
