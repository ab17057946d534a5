//! Provider registry and per-request selection.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::provider::{Capability, Provider};
use crate::core::config::Settings;

#[derive(Debug, Clone, Copy)]
struct Probe {
    available: bool,
    at: Instant,
}

/// Holds configured providers in priority order and picks one per attempt.
///
/// Availability probes are cached for `ttl`. Concurrent requests may probe the
/// same provider at once; the last write wins.
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn Provider>>,
    force_real_generation: bool,
    preferred: Option<String>,
    ttl: Duration,
    cache: RwLock<HashMap<String, Probe>>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new(mut providers: Vec<Arc<dyn Provider>>, settings: &Settings) -> Self {
        // Stable sort keeps registration order among equal priorities.
        providers.sort_by_key(|p| p.priority());
        Self {
            providers,
            force_real_generation: settings.force_real_generation,
            preferred: settings.preferred_provider_override.clone(),
            ttl: settings.availability_ttl,
            cache: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn providers(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<dyn Provider>> {
        self.providers.iter().find(|p| p.id() == id).cloned()
    }

    /// Next provider to try for a request.
    ///
    /// `tried` holds ids already attempted for this request; `required` the
    /// capabilities the request needs. A configured override wins once,
    /// regardless of availability. With `force_real_generation` the next capable
    /// provider is returned without probing; otherwise providers are probed in
    /// priority order. `None` means no provider is left.
    pub async fn select(
        &self,
        tried: &[String],
        required: &[Capability],
    ) -> Option<Arc<dyn Provider>> {
        let untried = |p: &Arc<dyn Provider>| !tried.iter().any(|t| t == p.id());

        if let Some(preferred) = &self.preferred
            && !tried.iter().any(|t| t == preferred)
        {
            match self.get(preferred) {
                Some(provider) => {
                    info!(provider = preferred.as_str(), "Using pinned provider");
                    return Some(provider);
                }
                None => debug!(
                    provider = preferred.as_str(),
                    "Pinned provider is not configured; using priority order"
                ),
            }
        }

        let candidates = self
            .providers
            .iter()
            .filter(|p| untried(p))
            .filter(|p| required.iter().all(|c| p.supports(*c)));

        for provider in candidates {
            if self.force_real_generation || self.is_available(provider).await {
                return Some(Arc::clone(provider));
            }
            debug!(provider = provider.id(), "Provider reported unavailable");
        }
        None
    }

    /// Cached availability probe.
    pub async fn is_available(&self, provider: &Arc<dyn Provider>) -> bool {
        let id = provider.id();
        let cached = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .copied();
        if let Some(probe) = cached
            && probe.at.elapsed() < self.ttl
        {
            return probe.available;
        }

        let available = provider.is_available().await;
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                id.to_string(),
                Probe {
                    available,
                    at: Instant::now(),
                },
            );
        available
    }

    /// Forget a cached probe, e.g. after the provider failed a real call.
    pub fn invalidate(&self, id: &str) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }
}
