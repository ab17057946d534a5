//! OpenAI-compatible Chat Completions adapter.
//!
//! Works against api.openai.com or any server exposing the same
//! `/chat/completions` surface (the base URL is configurable).

use async_trait::async_trait;
use openai_api_rs::v1::chat_completion::{ChatCompletionMessage, Content, MessageRole};
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::ai::http;
use crate::ai::normalize::{clamp_chars, parse_quotes, require_text};
use crate::ai::provider::{Capability, Provider};
use crate::core::config::OpenAiSettings;
use crate::core::models::{ContentMetadata, ContentType, KeyQuote};
use crate::errors::ProviderError;
use crate::prompt::{SYSTEM_PROMPT, clip_source, instruction};

pub const PROVIDER_ID: &str = "openai";

pub struct OpenAiProvider {
    http: Client,
    api_key: String,
    org_id: Option<String>,
    base_url: String,
    model: String,
    priority: u32,
}

impl OpenAiProvider {
    pub fn new(settings: &OpenAiSettings) -> Result<Self, ProviderError> {
        Ok(Self {
            http: http::build_client()?,
            api_key: settings.api_key.clone(),
            org_id: settings.org_id.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            priority: settings.priority,
        })
    }

    #[must_use]
    pub fn build_prompt(
        &self,
        capability: Capability,
        text: &str,
        max_length: usize,
        max_quotes: usize,
        tone: &str,
    ) -> Vec<ChatCompletionMessage> {
        vec![
            ChatCompletionMessage {
                role: MessageRole::system,
                content: Content::Text(SYSTEM_PROMPT.to_string()),
                name: None,
                tool_calls: None,
                tool_call_id: None,
            },
            ChatCompletionMessage {
                role: MessageRole::system,
                content: Content::Text(instruction(capability, max_length, max_quotes, tone)),
                name: None,
                tool_calls: None,
                tool_call_id: None,
            },
            ChatCompletionMessage {
                role: MessageRole::user,
                content: Content::Text(clip_source(text).to_string()),
                name: None,
                tool_calls: None,
                tool_call_id: None,
            },
        ]
    }

    async fn complete(
        &self,
        prompt: Vec<ChatCompletionMessage>,
        max_tokens: usize,
    ) -> Result<String, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::Auth("OPENAI_API_KEY is empty".to_string()));
        }

        #[cfg(feature = "debug-logs")]
        info!("Using OpenAI prompt:\n{:?}", prompt);

        #[cfg(not(feature = "debug-logs"))]
        debug!(messages = prompt.len(), max_tokens, "Sending OpenAI chat completion");

        let request_body = json!({
            "model": self.model,
            "messages": build_chat_messages(&prompt),
            "max_tokens": max_tokens,
            "temperature": 0.4
        });

        let mut request = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body);
        if let Some(org) = &self.org_id {
            request = request.header("OpenAI-Organization", org);
        }

        let response_json = http::send_json(request).await?;
        normalize_reply(&response_json)
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
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
        let prompt = self.build_prompt(Capability::Summary, text, max_length, 0, "");
        let raw = self.complete(prompt, max_length / 3 + 64).await?;
        Ok(clamp_chars(&require_text(&raw, "summary")?, max_length))
    }

    async fn extract_key_quotes(
        &self,
        text: &str,
        max_quotes: usize,
    ) -> Result<Vec<KeyQuote>, ProviderError> {
        let prompt = self.build_prompt(Capability::KeyQuotes, text, 0, max_quotes, "");
        let raw = self.complete(prompt, 120 * max_quotes.max(1) + 64).await?;
        parse_quotes(&raw, max_quotes)
    }

    async fn generate_social_post(&self, text: &str, tone: &str) -> Result<String, ProviderError> {
        let prompt = self.build_prompt(Capability::SocialPost, text, 0, 0, tone);
        let raw = self.complete(prompt, 160).await?;
        require_text(&raw, "social post")
    }

    async fn generate_blog_post(&self, text: &str) -> Result<String, ProviderError> {
        let prompt = self.build_prompt(Capability::BlogPost, text, 0, 0, "");
        let raw = self.complete(prompt, 2_000).await?;
        require_text(&raw, "blog post")
    }

    async fn extract_metadata(
        &self,
        source_reference: Option<&str>,
        content_type: ContentType,
        text: &str,
    ) -> Result<ContentMetadata, ProviderError> {
        let mut metadata = crate::ai::provider::local_metadata(source_reference, content_type, text);
        // Inline text has no reference to derive a title from; ask the model.
        if source_reference.is_none() && !text.trim().is_empty() {
            let prompt = self.build_prompt(Capability::Metadata, text, 0, 0, "");
            let raw = self.complete(prompt, 40).await?;
            metadata.title = clamp_chars(&require_text(&raw, "title")?, 80);
        }
        Ok(metadata)
    }

    async fn is_available(&self) -> bool {
        if self.api_key.is_empty() {
            return false;
        }
        let probe = self
            .http
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await;
        match probe {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                info!(status = %resp.status(), "OpenAI availability probe rejected");
                false
            }
            Err(e) => {
                info!("OpenAI availability probe failed: {}", e);
                false
            }
        }
    }
}

/// Serialize chat messages into the Chat Completions `messages` array.
pub(crate) fn build_chat_messages(prompt: &[ChatCompletionMessage]) -> Vec<Value> {
    prompt
        .iter()
        .filter_map(|m| {
            let role = match m.role {
                MessageRole::system => "system",
                MessageRole::user | MessageRole::function | MessageRole::tool => "user",
                MessageRole::assistant => "assistant",
            };
            match &m.content {
                Content::Text(t) => Some(json!({ "role": role, "content": t })),
                Content::ImageUrl(_) => None,
            }
        })
        .collect()
}

/// Extract generated text from a completion reply.
///
/// Accepts Chat Completions (`choices[].message.content`), legacy completions
/// (`choices[].text`), and Responses API shapes (`output_text`, or
/// `output[].content[]` parts of type `output_text`). An `error` object in a
/// success reply is classified like an HTTP failure.
pub fn normalize_reply(response_json: &Value) -> Result<String, ProviderError> {
    if let Some(err) = response_json.get("error").filter(|e| !e.is_null()) {
        return Err(classify_inline_error(err));
    }

    let from_choices = response_json
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| {
            choice
                .get("message")
                .and_then(|m| m.get("content"))
                .and_then(Value::as_str)
                .or_else(|| choice.get("text").and_then(Value::as_str))
        })
        .map(ToString::to_string);

    let text_opt = from_choices
        .or_else(|| {
            response_json
                .get("output_text")
                .and_then(Value::as_str)
                .map(ToString::to_string)
        })
        .or_else(|| {
            let mut collected: Vec<String> = Vec::new();
            if let Some(items) = response_json.get("output").and_then(Value::as_array) {
                for item in items {
                    if let Some(parts) = item.get("content").and_then(Value::as_array) {
                        for p in parts {
                            let is_output_text = p
                                .get("type")
                                .and_then(Value::as_str)
                                .is_some_and(|t| t == "output_text");
                            if !is_output_text {
                                continue;
                            }
                            if let Some(s) = p.get("text").and_then(Value::as_str) {
                                collected.push(s.to_string());
                            } else if let Some(s) = p
                                .get("text")
                                .and_then(|t| t.get("value"))
                                .and_then(Value::as_str)
                            {
                                collected.push(s.to_string());
                            }
                        }
                    }
                }
            }
            if collected.is_empty() {
                None
            } else {
                Some(collected.join("\n"))
            }
        });

    text_opt.ok_or_else(|| ProviderError::MalformedResponse("No text in OpenAI response".to_string()))
}

fn classify_inline_error(err: &Value) -> ProviderError {
    let message = err
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| err.as_str())
        .unwrap_or("unknown error")
        .to_string();
    let kind = err
        .get("type")
        .or_else(|| err.get("code"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_ascii_lowercase();

    if kind.contains("auth") || kind.contains("api_key") {
        ProviderError::Auth(message)
    } else if kind.contains("rate_limit") || kind.contains("quota") {
        ProviderError::RateLimited {
            message,
            retry_after: None,
        }
    } else if kind.contains("overloaded") || kind.contains("server_error") {
        ProviderError::TemporarilyUnavailable(message)
    } else {
        ProviderError::MalformedResponse(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenAiProvider {
        OpenAiProvider::new(&OpenAiSettings {
            api_key: "test_key".to_string(),
            org_id: None,
            base_url: "http://127.0.0.1:9/v1/".to_string(),
            model: "gpt-4o-mini".to_string(),
            priority: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        assert_eq!(provider().base_url, "http://127.0.0.1:9/v1");
    }

    #[test]
    fn test_build_prompt_has_system_instruction_and_user_text() {
        let prompt = provider().build_prompt(Capability::SocialPost, "hello", 0, 0, "witty");
        let messages = build_chat_messages(&prompt);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "system");
        assert!(messages[1]["content"].as_str().unwrap().contains("witty"));
        assert_eq!(messages[2]["role"], "user");
        assert_eq!(messages[2]["content"], "hello");
    }

    #[test]
    fn test_normalize_chat_completion_shape() {
        let reply = json!({"choices": [{"message": {"role": "assistant", "content": "Done."}}]});
        assert_eq!(normalize_reply(&reply).unwrap(), "Done.");
    }

    #[test]
    fn test_normalize_legacy_and_responses_shapes() {
        let legacy = json!({"choices": [{"text": "legacy"}]});
        assert_eq!(normalize_reply(&legacy).unwrap(), "legacy");

        let output_text = json!({"output_text": "direct"});
        assert_eq!(normalize_reply(&output_text).unwrap(), "direct");

        let parts = json!({"output": [{"content": [
            {"type": "reasoning", "text": "skip"},
            {"type": "output_text", "text": "first"},
            {"type": "output_text", "text": {"value": "second"}}
        ]}]});
        assert_eq!(normalize_reply(&parts).unwrap(), "first\nsecond");
    }

    #[test]
    fn test_normalize_inline_errors() {
        let rate = json!({"error": {"type": "rate_limit_exceeded", "message": "slow"}});
        assert!(matches!(
            normalize_reply(&rate),
            Err(ProviderError::RateLimited { .. })
        ));

        let auth = json!({"error": {"code": "invalid_api_key", "message": "bad key"}});
        assert!(matches!(normalize_reply(&auth), Err(ProviderError::Auth(_))));
    }

    #[test]
    fn test_normalize_rejects_unknown_shape() {
        let reply = json!({"data": []});
        assert!(matches!(
            normalize_reply(&reply),
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let err = provider()
            .generate_summary("some text", 200)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
        assert!(!provider().is_available().await);
    }
}
