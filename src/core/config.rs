use std::env;
use std::time::Duration;

use crate::ai::transport::TransportPolicy;
use crate::core::models::ResolvedOptions;

pub const DEFAULT_MAX_SUMMARY_LENGTH: usize = 500;
pub const DEFAULT_MAX_QUOTES: usize = 3;
pub const DEFAULT_SOCIAL_TONE: &str = "professional";
pub const DEFAULT_AVAILABILITY_TTL: Duration = Duration::from_secs(30);

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_HUGGINGFACE_BASE_URL: &str = "https://api-inference.huggingface.co/models";
pub const DEFAULT_HUGGINGFACE_SUMMARY_MODEL: &str = "facebook/bart-large-cnn";
pub const DEFAULT_HUGGINGFACE_GENERATION_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.2";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub org_id: Option<String>,
    pub base_url: String,
    pub model: String,
    pub priority: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuggingFaceSettings {
    pub api_key: String,
    pub base_url: String,
    pub summary_model: String,
    pub generation_model: String,
    pub priority: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OllamaSettings {
    pub base_url: String,
    pub model: String,
    pub priority: u32,
}

/// Process-wide settings, read once at start-up and shared immutably.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub force_real_generation: bool,
    pub emergency_fallback_enabled: bool,
    pub preferred_provider_override: Option<String>,
    pub default_max_summary_length: usize,
    pub default_max_quotes: usize,
    pub default_social_tone: String,
    pub availability_ttl: Duration,
    pub transport: TransportPolicy,
    pub openai: Option<OpenAiSettings>,
    pub huggingface: Option<HuggingFaceSettings>,
    pub ollama: Option<OllamaSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            force_real_generation: false,
            emergency_fallback_enabled: true,
            preferred_provider_override: None,
            default_max_summary_length: DEFAULT_MAX_SUMMARY_LENGTH,
            default_max_quotes: DEFAULT_MAX_QUOTES,
            default_social_tone: DEFAULT_SOCIAL_TONE.to_string(),
            availability_ttl: DEFAULT_AVAILABILITY_TTL,
            transport: TransportPolicy::default(),
            openai: None,
            huggingface: None,
            ollama: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Unset keys take defaults;
    /// set-but-unparseable keys are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = Self::default();
        let transport_defaults = TransportPolicy::default();

        let transport = TransportPolicy {
            max_attempts: parse_or(&get, "TRANSPORT_MAX_ATTEMPTS", transport_defaults.max_attempts)?
                .max(1),
            base_delay: millis_or(&get, "TRANSPORT_BASE_DELAY_MS", transport_defaults.base_delay)?,
            standard_timeout: secs_or(
                &get,
                "TRANSPORT_TIMEOUT_SECS",
                transport_defaults.standard_timeout,
            )?,
            long_timeout: secs_or(
                &get,
                "TRANSPORT_LONG_TIMEOUT_SECS",
                transport_defaults.long_timeout,
            )?,
        };

        let openai = get("OPENAI_API_KEY")
            .map(|api_key| -> Result<OpenAiSettings, String> {
                Ok(OpenAiSettings {
                    api_key,
                    org_id: get("OPENAI_ORG_ID"),
                    base_url: get("OPENAI_BASE_URL")
                        .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
                    model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                    priority: parse_or(&get, "OPENAI_PRIORITY", 10)?,
                })
            })
            .transpose()?;

        let huggingface = get("HUGGINGFACE_API_KEY")
            .map(|api_key| -> Result<HuggingFaceSettings, String> {
                Ok(HuggingFaceSettings {
                    api_key,
                    base_url: get("HUGGINGFACE_BASE_URL")
                        .unwrap_or_else(|| DEFAULT_HUGGINGFACE_BASE_URL.to_string()),
                    summary_model: get("HUGGINGFACE_SUMMARY_MODEL")
                        .unwrap_or_else(|| DEFAULT_HUGGINGFACE_SUMMARY_MODEL.to_string()),
                    generation_model: get("HUGGINGFACE_GENERATION_MODEL")
                        .unwrap_or_else(|| DEFAULT_HUGGINGFACE_GENERATION_MODEL.to_string()),
                    priority: parse_or(&get, "HUGGINGFACE_PRIORITY", 20)?,
                })
            })
            .transpose()?;

        let ollama = get("OLLAMA_BASE_URL")
            .map(|base_url| -> Result<OllamaSettings, String> {
                Ok(OllamaSettings {
                    base_url,
                    model: get("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
                    priority: parse_or(&get, "OLLAMA_PRIORITY", 30)?,
                })
            })
            .transpose()?;

        Ok(Self {
            force_real_generation: bool_or(&get, "FORCE_REAL_GENERATION", false)?,
            emergency_fallback_enabled: bool_or(&get, "EMERGENCY_FALLBACK_ENABLED", true)?,
            preferred_provider_override: get("PREFERRED_PROVIDER"),
            default_max_summary_length: parse_or(
                &get,
                "DEFAULT_MAX_SUMMARY_LENGTH",
                defaults.default_max_summary_length,
            )?,
            default_max_quotes: parse_or(&get, "DEFAULT_MAX_QUOTES", defaults.default_max_quotes)?,
            default_social_tone: get("DEFAULT_SOCIAL_TONE").unwrap_or(defaults.default_social_tone),
            availability_ttl: secs_or(&get, "AVAILABILITY_CACHE_TTL_SECS", defaults.availability_ttl)?,
            transport,
            openai,
            huggingface,
            ollama,
        })
    }

    /// Defaults that request options are merged over.
    #[must_use]
    pub fn default_options(&self) -> ResolvedOptions {
        ResolvedOptions {
            max_summary_length: self.default_max_summary_length,
            max_quotes: self.default_max_quotes,
            social_tone: self.default_social_tone.clone(),
            generate_blog: false,
        }
    }
}

fn parse_or<G, T>(get: &G, key: &str, default: T) -> Result<T, String>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|e| format!("{key}: {e}")),
        None => Ok(default),
    }
}

fn secs_or<G>(get: &G, key: &str, default: Duration) -> Result<Duration, String>
where
    G: Fn(&str) -> Option<String>,
{
    parse_or(get, key, default.as_secs()).map(Duration::from_secs)
}

fn millis_or<G>(get: &G, key: &str, default: Duration) -> Result<Duration, String>
where
    G: Fn(&str) -> Option<String>,
{
    let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    parse_or(get, key, default_ms).map(Duration::from_millis)
}

fn bool_or<G>(get: &G, key: &str, default: bool) -> Result<bool, String>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(format!("{key}: expected a boolean, got {other:?}")),
        },
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_empty_lookup_yields_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.emergency_fallback_enabled);
        assert!(settings.openai.is_none());
    }

    #[test]
    fn test_flags_and_providers_are_read() {
        let settings = Settings::from_lookup(lookup(&[
            ("FORCE_REAL_GENERATION", "true"),
            ("EMERGENCY_FALLBACK_ENABLED", "off"),
            ("PREFERRED_PROVIDER", "ollama"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OLLAMA_BASE_URL", "http://localhost:11434"),
            ("DEFAULT_MAX_QUOTES", "5"),
        ]))
        .unwrap();

        assert!(settings.force_real_generation);
        assert!(!settings.emergency_fallback_enabled);
        assert_eq!(settings.preferred_provider_override.as_deref(), Some("ollama"));
        assert_eq!(settings.default_max_quotes, 5);

        let openai = settings.openai.unwrap();
        assert_eq!(openai.model, DEFAULT_OPENAI_MODEL);
        assert_eq!(openai.priority, 10);
        assert_eq!(settings.ollama.unwrap().model, DEFAULT_OLLAMA_MODEL);
        assert!(settings.huggingface.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = Settings::from_lookup(lookup(&[("FORCE_REAL_GENERATION", "maybe")])).unwrap_err();
        assert!(err.contains("FORCE_REAL_GENERATION"));

        let err = Settings::from_lookup(lookup(&[("DEFAULT_MAX_QUOTES", "many")])).unwrap_err();
        assert!(err.contains("DEFAULT_MAX_QUOTES"));
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let settings =
            Settings::from_lookup(lookup(&[("OPENAI_API_KEY", "   "), ("PREFERRED_PROVIDER", "")]))
                .unwrap();
        assert!(settings.openai.is_none());
        assert!(settings.preferred_provider_override.is_none());
    }
}
