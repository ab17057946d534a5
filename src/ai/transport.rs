//! Resilient wrapper around a single provider call: timeout, retry, backoff.

use std::future::Future;
use std::time::Duration;

use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, info, warn};

use super::provider::Capability;
use crate::errors::ProviderError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_STANDARD_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_LONG_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportPolicy {
    /// Total attempts including the first call.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub standard_timeout: Duration,
    /// Budget for heavyweight operations such as blog generation.
    pub long_timeout: Duration,
}

impl Default for TransportPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            standard_timeout: DEFAULT_STANDARD_TIMEOUT,
            long_timeout: DEFAULT_LONG_TIMEOUT,
        }
    }
}

impl TransportPolicy {
    #[must_use]
    pub const fn timeout_for(&self, capability: Capability) -> Duration {
        match capability {
            Capability::BlogPost => self.long_timeout,
            _ => self.standard_timeout,
        }
    }

    /// Delays between attempts: `base`, `2 * base`, `4 * base`, ...
    pub fn backoff(&self) -> impl Iterator<Item = Duration> + use<> {
        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX / 4);
        // from_millis(2) yields 2, 4, 8, ... times the factor; halve to start at base.
        ExponentialBackoff::from_millis(2)
            .factor(base_ms)
            .map(|d| (d / 2).min(MAX_BACKOFF))
    }
}

/// Executes provider calls under a [`TransportPolicy`].
///
/// The transport only classifies and retries. When the attempt budget is spent
/// it returns the last error unchanged; substituting content is left to the
/// caller.
#[derive(Debug, Clone, Default)]
pub struct Transport {
    policy: TransportPolicy,
}

impl Transport {
    #[must_use]
    pub const fn new(policy: TransportPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub const fn policy(&self) -> &TransportPolicy {
        &self.policy
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error, or
    /// the attempt budget is exhausted. Each attempt is bounded by the timeout
    /// for `capability`; an expired attempt is dropped and counts as a
    /// retryable [`ProviderError::Timeout`].
    ///
    /// A rate-limit reply carrying a suggested delay replaces the computed
    /// backoff for that wait and still consumes an attempt.
    pub async fn call<T, F, Fut>(
        &self,
        provider_id: &str,
        capability: Capability,
        mut operation: F,
    ) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, ProviderError>> + Send,
        T: Send,
    {
        let timeout = self.policy.timeout_for(capability);
        let max_attempts = self.policy.max_attempts.max(1);
        let mut delays = self.policy.backoff();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!(
                provider = provider_id,
                capability = capability.as_str(),
                attempt,
                "Dispatching provider call"
            );

            let outcome = match tokio::time::timeout(timeout, operation()).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(timeout)),
            };

            let error = match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        info!(
                            provider = provider_id,
                            capability = capability.as_str(),
                            attempt,
                            "Provider call succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if !error.is_retryable() {
                warn!(
                    provider = provider_id,
                    capability = capability.as_str(),
                    attempt,
                    kind = error.kind(),
                    "Provider call failed with non-retryable error: {}",
                    error
                );
                return Err(error);
            }

            if attempt >= max_attempts {
                warn!(
                    provider = provider_id,
                    capability = capability.as_str(),
                    attempt,
                    kind = error.kind(),
                    "Provider call exhausted {} attempts: {}",
                    max_attempts,
                    error
                );
                return Err(error);
            }

            let computed = delays.next().unwrap_or(self.policy.base_delay);
            let delay = error.suggested_delay().unwrap_or(computed);
            warn!(
                provider = provider_id,
                capability = capability.as_str(),
                attempt,
                kind = error.kind(),
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Retrying provider call (attempt {}/{})",
                attempt,
                max_attempts
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_from_base() {
        let policy = TransportPolicy::default();
        let delays: Vec<Duration> = policy.backoff().take(3).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = TransportPolicy {
            base_delay: Duration::from_secs(20),
            ..TransportPolicy::default()
        };
        let delays: Vec<Duration> = policy.backoff().take(3).collect();
        assert_eq!(delays[0], Duration::from_secs(20));
        assert_eq!(delays[1], MAX_BACKOFF);
        assert_eq!(delays[2], MAX_BACKOFF);
    }

    #[test]
    fn test_blog_gets_long_timeout() {
        let policy = TransportPolicy::default();
        assert_eq!(policy.timeout_for(Capability::BlogPost), DEFAULT_LONG_TIMEOUT);
        assert_eq!(policy.timeout_for(Capability::Summary), DEFAULT_STANDARD_TIMEOUT);
    }
}
