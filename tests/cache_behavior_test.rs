//! TTL and eviction behavior of the caches, driven through the resolver
//! with an injected [`ManualClock`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use rxresolve::{
    CompletionRequest, DrugDirectory, DrugResolver, EnrichedDrug, FallbackCacheConfig,
    ManualClock, ModelClient, Result, ValidationCacheConfig,
};

struct CountingModel {
    generation_calls: AtomicUsize,
    scoring_calls: AtomicUsize,
}

impl CountingModel {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            generation_calls: AtomicUsize::new(0),
            scoring_calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ModelClient for CountingModel {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        if request.user_prompt.contains("Score each drug") {
            self.scoring_calls.fetch_add(1, Ordering::SeqCst);
            Ok(r#"[{"drugName": "BrandX (drugexample)", "score": 8, "reasoning": "t"}]"#.into())
        } else {
            self.generation_calls.fetch_add(1, Ordering::SeqCst);
            Ok(r#"["drugexample"]"#.into())
        }
    }
}

struct SingleDrugDirectory;

#[async_trait]
impl DrugDirectory for SingleDrugDirectory {
    async fn resolve(&self, name: &str) -> Result<Option<EnrichedDrug>> {
        let mut drugs = HashMap::new();
        drugs.insert(
            "drugexample".to_string(),
            EnrichedDrug {
                brand_name: "BrandX".into(),
                generic_name: "drugexample".into(),
                dosage_form: None,
                strength: None,
                source_id: "ndc-x".into(),
            },
        );
        Ok(drugs.get(&name.to_lowercase()).cloned())
    }
}

fn resolver_with_clock(
    model: Arc<CountingModel>,
    clock: Arc<ManualClock>,
    fallback_ttl: Duration,
    validation_ttl: Duration,
) -> DrugResolver {
    DrugResolver::builder()
        .model_client(model)
        .directory(Arc::new(SingleDrugDirectory))
        .clock(clock)
        .fallback_cache(FallbackCacheConfig::new().ttl(fallback_ttl))
        .validation_cache(ValidationCacheConfig::new().ttl(validation_ttl))
        .build()
        .unwrap()
}

/// The fallback cache answers until its TTL lapses, then generation runs
/// again.
#[tokio::test]
async fn fallback_entry_expires_and_generation_retries() {
    let model = CountingModel::new();
    let clock = Arc::new(ManualClock::new());
    let resolver = resolver_with_clock(
        model.clone(),
        clock.clone(),
        Duration::from_secs(3600),
        Duration::from_secs(60), // expire validation entries quickly
    );

    let _ = resolver.resolve_drugs("uncommon condition", "Q10.1").await;
    assert_eq!(model.generation_calls.load(Ordering::SeqCst), 1);

    // Validation expired, fallback still live: Tier-2 answers.
    clock.advance(Duration::from_secs(120));
    let _ = resolver.resolve_drugs("uncommon condition", "Q10.1").await;
    assert_eq!(model.generation_calls.load(Ordering::SeqCst), 1);
    assert_eq!(resolver.telemetry_snapshot().fallback_hits, 1);

    // Both expired: generation runs again.
    clock.advance(Duration::from_secs(3600));
    let _ = resolver.resolve_drugs("uncommon condition", "Q10.1").await;
    assert_eq!(model.generation_calls.load(Ordering::SeqCst), 2);
}

/// A validation-cache hit answers without touching the model at all.
#[tokio::test]
async fn validation_hit_skips_all_model_calls() {
    let model = CountingModel::new();
    let clock = Arc::new(ManualClock::new());
    let resolver = resolver_with_clock(
        model.clone(),
        clock.clone(),
        Duration::from_secs(3600),
        Duration::from_secs(3600),
    );

    let first = resolver.resolve_drugs("uncommon condition", "Q10.1").await;
    let second = resolver.resolve_drugs("uncommon condition", "Q10.1").await;

    assert_eq!(first, second);
    assert_eq!(model.generation_calls.load(Ordering::SeqCst), 1);
    assert_eq!(model.scoring_calls.load(Ordering::SeqCst), 1);

    // Past the validation TTL the pipeline re-runs (Tier 2 expired too).
    clock.advance(Duration::from_secs(7200));
    let _ = resolver.resolve_drugs("uncommon condition", "Q10.1").await;
    assert_eq!(model.scoring_calls.load(Ordering::SeqCst), 2);
}

/// Distinct condition spellings that normalize identically share one
/// fallback entry.
#[tokio::test]
async fn normalization_shares_cache_entries() {
    let model = CountingModel::new();
    let clock = Arc::new(ManualClock::new());
    let resolver = resolver_with_clock(
        model.clone(),
        clock,
        Duration::from_secs(3600),
        Duration::from_secs(3600),
    );

    let _ = resolver.resolve_drugs("Uncommon   Condition", "Q10.1").await;
    let _ = resolver.resolve_drugs("  uncommon condition ", "Q10.2").await;

    assert_eq!(model.generation_calls.load(Ordering::SeqCst), 1);
    assert_eq!(resolver.fallback_cache_stats().total, 1);
}

/// `clear_*` drop entries so the next call recomputes.
#[tokio::test]
async fn clear_operations_reset_state() {
    let model = CountingModel::new();
    let clock = Arc::new(ManualClock::new());
    let resolver = resolver_with_clock(
        model.clone(),
        clock,
        Duration::from_secs(3600),
        Duration::from_secs(3600),
    );

    let _ = resolver.resolve_drugs("uncommon condition", "Q10.1").await;
    assert_eq!(resolver.fallback_cache_stats().total, 1);
    assert_eq!(resolver.validation_cache_stats().total, 1);

    resolver.clear_fallback_cache();
    resolver.clear_validation_cache();
    assert_eq!(resolver.fallback_cache_stats().total, 0);
    assert_eq!(resolver.validation_cache_stats().total, 0);

    let _ = resolver.resolve_drugs("uncommon condition", "Q10.1").await;
    assert_eq!(model.generation_calls.load(Ordering::SeqCst), 2);
}
