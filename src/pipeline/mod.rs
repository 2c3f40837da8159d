//! Pipeline orchestrator.
//!
//! [`DrugResolver`] composes the tiers into the single public operation
//! [`resolve_drugs`](DrugResolver::resolve_drugs):
//!
//! 1. Validation-cache short-circuit on the normalized diagnosis code.
//! 2. Normalize the condition; empty means no tier is engaged.
//! 3. Tier 1: curated table (substring keyword match).
//! 4. Tier 2: fallback cache of previously generated lists.
//! 5. Tier 3: AI generation behind the in-flight coordinator.
//! 6. Enrichment of candidate names (unresolved names dropped).
//! 7. Relevance scoring; an empty agent response means "scoring
//!    unavailable" and yields unscored results that are NOT cached.
//! 8. Score↔drug matching, threshold filter, sort, cap.
//! 9. Validation-cache write.
//!
//! Nothing in here ever surfaces an error to the caller: every external
//! failure degrades to an empty or partial list. An empty list for a
//! condition whose model calls all failed is indistinguishable from a
//! condition with no relevant drugs — a documented tradeoff.

mod builder;
mod matching;

pub use builder::DrugResolverBuilder;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::{CacheStats, FallbackCache, ValidationCache};
use crate::curated::CuratedTable;
use crate::enrich::DrugDirectory;
use crate::generate::{CandidateGenerator, GenerateFailure};
use crate::inflight::{InFlightCoordinator, Ticket};
use crate::normalize::normalize_key;
use crate::scoring::RelevanceScorer;
use crate::telemetry::{LookupCounters, TelemetrySnapshot, SNAPSHOT_LOG_INTERVAL};
use crate::types::ValidatedDrugResult;

/// Minimum relevance score a drug must reach to be returned.
pub const OFF_LABEL_THRESHOLD: i32 = 4;

/// Maximum number of results returned per lookup.
pub const MAX_RESULTS: usize = 8;

/// Maximum candidate names forwarded to enrichment and scoring.
pub const ENRICHMENT_LIMIT: usize = 10;

/// Source label recorded on fallback-cache entries.
const AI_SOURCE_LABEL: &str = "ai-generated";

/// Outcome of a Tier-3 generation, shared with in-flight joiners.
type GenerationOutcome = Result<Vec<String>, GenerateFailure>;

/// The condition-to-drug resolution pipeline.
///
/// Create via [`DrugResolver::builder()`]. Cheap to share behind an
/// `Arc`; all methods take `&self`.
pub struct DrugResolver {
    curated: CuratedTable,
    fallback: Arc<FallbackCache>,
    validation: ValidationCache,
    inflight: Arc<InFlightCoordinator<GenerationOutcome>>,
    generator: Arc<CandidateGenerator>,
    scorer: RelevanceScorer,
    directory: Arc<dyn DrugDirectory>,
    counters: LookupCounters,
}

impl DrugResolver {
    /// Start configuring a resolver.
    pub fn builder() -> DrugResolverBuilder {
        DrugResolverBuilder::new()
    }

    pub(crate) fn from_parts(
        curated: CuratedTable,
        fallback: FallbackCache,
        validation: ValidationCache,
        inflight: InFlightCoordinator<GenerationOutcome>,
        generator: CandidateGenerator,
        scorer: RelevanceScorer,
        directory: Arc<dyn DrugDirectory>,
    ) -> Self {
        Self {
            curated,
            fallback: Arc::new(fallback),
            validation,
            inflight: Arc::new(inflight),
            generator: Arc::new(generator),
            scorer,
            directory,
            counters: LookupCounters::default(),
        }
    }

    /// Resolve clinically relevant drugs for a condition.
    ///
    /// Always returns a (possibly empty) list; external failures degrade
    /// per tier instead of propagating. Results are sorted descending by
    /// relevance and capped to [`MAX_RESULTS`], except when scoring was
    /// unavailable — then every enriched drug comes back with
    /// [`UNSCORED`](crate::types::UNSCORED) and the caller must not
    /// filter on score.
    pub async fn resolve_drugs(
        &self,
        condition_name: &str,
        diagnosis_code: &str,
    ) -> Vec<ValidatedDrugResult> {
        let lookups = self.counters.record_lookup();
        if lookups % SNAPSHOT_LOG_INTERVAL == 0 {
            let snapshot = self.counters.snapshot();
            info!(?snapshot, "resolution pipeline counters");
        }

        let code_key = normalize_key(diagnosis_code);
        if !code_key.is_empty() {
            if let Some(results) = self.validation.get(&code_key) {
                debug!(code = %code_key, "validation cache hit");
                return results;
            }
        }

        let condition_key = normalize_key(condition_name);
        if condition_key.is_empty() {
            return self.finish(&code_key, Vec::new());
        }

        let candidates = match self.gather_candidates(condition_name, &condition_key).await {
            Some(candidates) => candidates,
            None => return self.finish(&code_key, Vec::new()),
        };

        let capped: Vec<String> = candidates.into_iter().take(ENRICHMENT_LIMIT).collect();
        let enriched = self.directory.resolve_many(&capped).await;
        if enriched.is_empty() {
            debug!(condition = %condition_key, "no candidate resolved in the directory");
            return self.finish(&code_key, Vec::new());
        }

        let pairs: Vec<(String, String)> = enriched
            .iter()
            .map(|d| (d.brand_name.clone(), d.generic_name.clone()))
            .collect();
        let scores = self.scorer.score(condition_name, &pairs).await;

        if scores.is_empty() {
            // Scoring unavailable: return everything unscored and skip the
            // cache write so the next call retries scoring.
            warn!(condition = %condition_key, "scoring unavailable, returning unscored results");
            return enriched
                .into_iter()
                .map(ValidatedDrugResult::unscored)
                .collect();
        }

        let mut results = matching::match_scores(enriched, &scores);
        results.retain(|r| r.relevance_score >= OFF_LABEL_THRESHOLD);
        results.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
        results.truncate(MAX_RESULTS);

        self.finish(&code_key, results)
    }

    /// Run the three-tier candidate lookup. `None` means every tier came
    /// up empty (a cacheable "no known drugs" outcome).
    async fn gather_candidates(
        &self,
        condition_name: &str,
        condition_key: &str,
    ) -> Option<Vec<String>> {
        if let Some(curated) = self.curated.find(condition_key) {
            debug!(condition = %condition_key, "curated table hit");
            self.counters.record_curated_hit();
            return Some(curated);
        }

        if let Some(cached) = self.fallback.get(condition_key) {
            debug!(condition = %condition_key, "fallback cache hit");
            self.counters.record_fallback_hit();
            return Some(cached);
        }

        match self.inflight.acquire(condition_key) {
            Ticket::Leader => {
                self.counters.record_generation();
                // The generation runs detached: the spawned task resolves
                // the ticket and fills the fallback cache even if this
                // caller's future is dropped mid-await, so an abandoned
                // leader can never strand its joiners.
                let generator = Arc::clone(&self.generator);
                let inflight = Arc::clone(&self.inflight);
                let fallback = Arc::clone(&self.fallback);
                let name = condition_name.to_string();
                let key = condition_key.to_string();
                let generation = tokio::spawn(async move {
                    let outcome = generator.generate(&name).await;
                    if let Ok(names) = &outcome {
                        // Generated lists are always non-empty here; empty
                        // outcomes arrive as failures and are never cached.
                        fallback.put(&key, names.clone(), AI_SOURCE_LABEL);
                    }
                    inflight.resolve(&key, outcome.clone());
                    outcome
                });
                match generation.await {
                    Ok(Ok(names)) => Some(names),
                    Ok(Err(failure)) => {
                        debug!(condition = %condition_key, ?failure, "generation yielded nothing");
                        None
                    }
                    Err(join_error) => {
                        warn!(condition = %condition_key, %join_error, "generation task failed");
                        None
                    }
                }
            }
            Ticket::Joiner(waiter) => {
                debug!(condition = %condition_key, "joining in-flight generation");
                match waiter.wait().await {
                    Some(Ok(names)) => Some(names),
                    Some(Err(_)) | None => None,
                }
            }
        }
    }

    /// Write the final results to the validation cache (when the code is
    /// usable) and hand them back.
    fn finish(
        &self,
        code_key: &str,
        results: Vec<ValidatedDrugResult>,
    ) -> Vec<ValidatedDrugResult> {
        if !code_key.is_empty() {
            self.validation.put(code_key, results.clone());
        }
        results
    }

    /// Occupancy stats for the fallback cache.
    pub fn fallback_cache_stats(&self) -> CacheStats {
        self.fallback.stats()
    }

    /// Occupancy stats for the validation cache.
    pub fn validation_cache_stats(&self) -> CacheStats {
        self.validation.stats()
    }

    /// In-process lookup counters for operational monitoring.
    pub fn telemetry_snapshot(&self) -> TelemetrySnapshot {
        self.counters.snapshot()
    }

    /// Drop all fallback-cache entries (test/ops use).
    pub fn clear_fallback_cache(&self) {
        self.fallback.clear();
    }

    /// Drop all validation-cache entries (test/ops use).
    pub fn clear_validation_cache(&self) {
        self.validation.clear();
    }
}
