mod common;

use std::sync::Arc;
use std::time::Duration;

use common::StubProvider;
use repurpose::ai::provider::{Capability, Provider};
use repurpose::ai::registry::ProviderRegistry;
use repurpose::core::config::Settings;

const BASE: [Capability; 4] = [
    Capability::Summary,
    Capability::KeyQuotes,
    Capability::SocialPost,
    Capability::Metadata,
];

fn registry(providers: Vec<Arc<StubProvider>>, settings: &Settings) -> ProviderRegistry {
    let providers = providers
        .into_iter()
        .map(|p| p as Arc<dyn Provider>)
        .collect();
    ProviderRegistry::new(providers, settings)
}

fn ids(tried: &[&str]) -> Vec<String> {
    tried.iter().map(ToString::to_string).collect()
}

#[tokio::test]
async fn test_providers_are_ordered_by_priority() {
    let low = Arc::new(StubProvider::new("low", 30));
    let high = Arc::new(StubProvider::new("high", 10));
    let reg = registry(vec![low, high], &Settings::default());

    let order: Vec<&str> = reg.providers().iter().map(|p| p.id()).collect();
    assert_eq!(order, vec!["high", "low"]);

    let first = reg.select(&[], &BASE).await.unwrap();
    assert_eq!(first.id(), "high");
    let second = reg.select(&ids(&["high"]), &BASE).await.unwrap();
    assert_eq!(second.id(), "low");
    assert!(reg.select(&ids(&["high", "low"]), &BASE).await.is_none());
}

#[tokio::test]
async fn test_unavailable_providers_are_skipped() {
    let down = Arc::new(StubProvider::new("down", 1).unavailable());
    let up = Arc::new(StubProvider::new("up", 2));
    let reg = registry(vec![down, up], &Settings::default());

    assert_eq!(reg.select(&[], &BASE).await.unwrap().id(), "up");
}

#[tokio::test]
async fn test_no_provider_when_all_unavailable() {
    let a = Arc::new(StubProvider::new("a", 1).unavailable());
    let b = Arc::new(StubProvider::new("b", 2).unavailable());
    let reg = registry(vec![a, b], &Settings::default());

    assert!(reg.select(&[], &BASE).await.is_none());
}

#[tokio::test]
async fn test_override_wins_once_regardless_of_availability() {
    let first = Arc::new(StubProvider::new("first", 1));
    let pinned = Arc::new(StubProvider::new("pinned", 5).unavailable());
    let settings = Settings {
        preferred_provider_override: Some("pinned".to_string()),
        ..Settings::default()
    };
    let reg = registry(vec![first, Arc::clone(&pinned)], &settings);

    assert_eq!(reg.select(&[], &BASE).await.unwrap().id(), "pinned");
    assert_eq!(pinned.probes(), 0);
    // Once tried, selection continues in priority order.
    assert_eq!(reg.select(&ids(&["pinned"]), &BASE).await.unwrap().id(), "first");
}

#[tokio::test]
async fn test_unknown_override_falls_back_to_priority_order() {
    let only = Arc::new(StubProvider::new("only", 1));
    let settings = Settings {
        preferred_provider_override: Some("missing".to_string()),
        ..Settings::default()
    };
    let reg = registry(vec![only], &settings);

    assert_eq!(reg.select(&[], &BASE).await.unwrap().id(), "only");
}

#[tokio::test]
async fn test_force_real_generation_skips_probing() {
    let down = Arc::new(StubProvider::new("down", 1).unavailable());
    let settings = Settings {
        force_real_generation: true,
        ..Settings::default()
    };
    let reg = registry(vec![Arc::clone(&down)], &settings);

    assert_eq!(reg.select(&[], &BASE).await.unwrap().id(), "down");
    assert_eq!(down.probes(), 0);
}

#[tokio::test]
async fn test_capability_filter_skips_providers_without_blog() {
    let no_blog = Arc::new(StubProvider::new("no-blog", 1).without(Capability::BlogPost));
    let full = Arc::new(StubProvider::new("full", 2));
    let reg = registry(vec![no_blog, full], &Settings::default());

    let mut required = BASE.to_vec();
    assert_eq!(reg.select(&[], &required).await.unwrap().id(), "no-blog");
    required.push(Capability::BlogPost);
    assert_eq!(reg.select(&[], &required).await.unwrap().id(), "full");
}

#[tokio::test]
async fn test_availability_is_cached_within_ttl() {
    let flaky = Arc::new(StubProvider::new("flaky", 1));
    let settings = Settings {
        availability_ttl: Duration::from_secs(300),
        ..Settings::default()
    };
    let reg = registry(vec![Arc::clone(&flaky)], &settings);
    let as_dyn: Arc<dyn Provider> = Arc::clone(&flaky) as Arc<dyn Provider>;

    assert!(reg.is_available(&as_dyn).await);
    flaky.set_available(false);
    assert!(reg.is_available(&as_dyn).await, "cached result should be reused");
    assert_eq!(flaky.probes(), 1);

    reg.invalidate("flaky");
    assert!(!reg.is_available(&as_dyn).await);
    assert_eq!(flaky.probes(), 2);
}

#[tokio::test]
async fn test_expired_entries_are_reprobed() {
    let flaky = Arc::new(StubProvider::new("flaky", 1));
    let settings = Settings {
        availability_ttl: Duration::ZERO,
        ..Settings::default()
    };
    let reg = registry(vec![Arc::clone(&flaky)], &settings);

    assert!(reg.select(&[], &BASE).await.is_some());
    flaky.set_available(false);
    assert!(reg.select(&[], &BASE).await.is_none());
    assert_eq!(flaky.probes(), 2);
}

#[tokio::test]
async fn test_get_and_empty() {
    let reg = registry(vec![Arc::new(StubProvider::new("a", 1))], &Settings::default());
    assert!(!reg.is_empty());
    assert!(reg.get("a").is_some());
    assert!(reg.get("b").is_none());

    let empty = ProviderRegistry::new(Vec::new(), &Settings::default());
    assert!(empty.is_empty());
    assert!(empty.select(&[], &BASE).await.is_none());
}
