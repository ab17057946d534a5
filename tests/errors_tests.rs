use std::error::Error;
use std::time::Duration;

use repurpose::errors::{ExtractionError, PipelineError, ProviderError, ProviderFailure};

#[test]
fn test_errors_implement_error_trait() {
    fn assert_error<T: Error>(_: &T) {}

    assert_error(&ProviderError::Network("reset".to_string()));
    assert_error(&PipelineError::Validation("empty".to_string()));
}

#[test]
fn test_provider_error_display() {
    let error = ProviderError::Auth("bad key".to_string());
    assert_eq!(format!("{error}"), "Provider rejected credentials: bad key");

    let error = ProviderError::Timeout(Duration::from_secs(20));
    assert_eq!(format!("{error}"), "Provider call timed out after 20s");

    let error = ProviderError::Unsupported("blog_post".to_string());
    assert_eq!(format!("{error}"), "Provider does not support blog_post");
}

#[test]
fn test_retry_classification() {
    let retryable = [
        ProviderError::RateLimited {
            message: "slow".to_string(),
            retry_after: None,
        },
        ProviderError::TemporarilyUnavailable("loading".to_string()),
        ProviderError::Network("reset".to_string()),
        ProviderError::Timeout(Duration::from_secs(1)),
    ];
    for error in &retryable {
        assert!(error.is_retryable(), "{} should be retryable", error.kind());
    }

    let terminal = [
        ProviderError::Auth("key".to_string()),
        ProviderError::MalformedResponse("empty".to_string()),
        ProviderError::Unsupported("blog_post".to_string()),
    ];
    for error in &terminal {
        assert!(!error.is_retryable(), "{} should not be retryable", error.kind());
    }
}

#[test]
fn test_only_rate_limits_suggest_a_delay() {
    let limited = ProviderError::RateLimited {
        message: "slow".to_string(),
        retry_after: Some(Duration::from_secs(4)),
    };
    assert_eq!(limited.suggested_delay(), Some(Duration::from_secs(4)));
    assert_eq!(ProviderError::Network("x".to_string()).suggested_delay(), None);
}

#[test]
fn test_serde_error_converts_to_malformed() {
    let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let provider_err: ProviderError = err.into();
    assert!(matches!(provider_err, ProviderError::MalformedResponse(_)));

    // Verifies the reqwest conversion exists.
    #[allow(unused)]
    #[allow(clippy::items_after_statements)]
    fn _check_reqwest_conversion(err: reqwest::Error) -> ProviderError {
        ProviderError::from(err)
    }
}

#[test]
fn test_aggregate_failure_lists_attempts() {
    let error = PipelineError::AggregateFailure {
        attempts: vec![
            ProviderFailure {
                provider_id: "openai".to_string(),
                error: ProviderError::Auth("bad key".to_string()),
            },
            ProviderFailure {
                provider_id: "ollama".to_string(),
                error: ProviderError::Network("refused".to_string()),
            },
        ],
    };
    assert_eq!(
        error.to_string(),
        "All providers failed: openai: Provider rejected credentials: bad key; \
         ollama: Failed to reach provider: refused"
    );

    let empty = PipelineError::AggregateFailure { attempts: vec![] };
    assert_eq!(empty.to_string(), "All providers failed: no provider was available");
}

#[test]
fn test_extraction_error_converts_transparently() {
    let source = ExtractionError {
        source_reference: "vid-1".to_string(),
        message: "no captions".to_string(),
    };
    let error: PipelineError = source.into();
    assert_eq!(
        error.to_string(),
        "Failed to extract content from vid-1: no captions"
    );
}
