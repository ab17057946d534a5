#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use repurpose::ai::provider::{Capability, Provider};
use repurpose::core::models::{ContentMetadata, ContentType, KeyQuote, ProgressEvent};
use repurpose::errors::ProviderError;
use repurpose::pipeline::ProgressReporter;

/// In-memory provider with scripted failures and call counters.
pub struct StubProvider {
    id: String,
    priority: u32,
    available: AtomicBool,
    capabilities: Vec<Capability>,
    failures: HashMap<Capability, ProviderError>,
    empty_quotes: bool,
    calls: Mutex<Vec<Capability>>,
    probes: AtomicU32,
}

impl StubProvider {
    pub fn new(id: &str, priority: u32) -> Self {
        Self {
            id: id.to_string(),
            priority,
            available: AtomicBool::new(true),
            capabilities: Capability::ALL.to_vec(),
            failures: HashMap::new(),
            empty_quotes: false,
            calls: Mutex::new(Vec::new()),
            probes: AtomicU32::new(0),
        }
    }

    /// Every capability call fails with `error`.
    pub fn failing(mut self, error: ProviderError) -> Self {
        for capability in Capability::ALL {
            self.failures.insert(capability, error.clone());
        }
        self
    }

    pub fn failing_on(mut self, capability: Capability, error: ProviderError) -> Self {
        self.failures.insert(capability, error);
        self
    }

    pub fn unavailable(self) -> Self {
        self.available.store(false, Ordering::SeqCst);
        self
    }

    pub fn without(mut self, capability: Capability) -> Self {
        self.capabilities.retain(|c| *c != capability);
        self
    }

    pub fn with_empty_quotes(mut self) -> Self {
        self.empty_quotes = true;
        self
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Capability> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn probes(&self) -> u32 {
        self.probes.load(Ordering::SeqCst)
    }

    fn record(&self, capability: Capability) -> Result<(), ProviderError> {
        self.calls.lock().unwrap().push(capability);
        match self.failures.get(&capability) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Provider for StubProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    async fn generate_summary(&self, text: &str, max_length: usize) -> Result<String, ProviderError> {
        self.record(Capability::Summary)?;
        let summary: String = format!("{} summary of: {text}", self.id)
            .chars()
            .take(max_length)
            .collect();
        Ok(summary)
    }

    async fn extract_key_quotes(
        &self,
        text: &str,
        max_quotes: usize,
    ) -> Result<Vec<KeyQuote>, ProviderError> {
        self.record(Capability::KeyQuotes)?;
        if self.empty_quotes {
            return Ok(Vec::new());
        }
        // Deliberately return more than asked so callers have to truncate.
        Ok((0..=max_quotes)
            .map(|i| KeyQuote::new(format!("{} quote {i}: {text}", self.id)))
            .collect())
    }

    async fn generate_social_post(&self, _text: &str, tone: &str) -> Result<String, ProviderError> {
        self.record(Capability::SocialPost)?;
        Ok(format!("{} post in a {tone} tone", self.id))
    }

    async fn generate_blog_post(&self, _text: &str) -> Result<String, ProviderError> {
        self.record(Capability::BlogPost)?;
        Ok(format!("# Blog by {}\n\nBody", self.id))
    }

    async fn extract_metadata(
        &self,
        _source_reference: Option<&str>,
        content_type: ContentType,
        _text: &str,
    ) -> Result<ContentMetadata, ProviderError> {
        self.record(Capability::Metadata)?;
        Ok(ContentMetadata {
            title: format!("{} title", self.id),
            source_type: content_type,
            duration: None,
        })
    }

    async fn is_available(&self) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.available.load(Ordering::SeqCst)
    }
}

/// Progress sink that keeps every event.
#[derive(Default, Clone)]
pub struct Recorder {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl Recorder {
    /// Events recorded so far, once the terminal event has been delivered.
    /// Delivery is asynchronous, so this waits for it.
    pub async fn events(&self) -> Vec<ProgressEvent> {
        for _ in 0..1_000 {
            {
                let events = self.events.lock().unwrap();
                if events.last().is_some_and(|e| e.status.is_terminal()) {
                    return events.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("no terminal progress event was delivered");
    }

    /// Events recorded so far, without waiting.
    pub fn snapshot(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressReporter for Recorder {
    fn report(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}
