//! Telemetry metric name constants and lookup counters.
//!
//! Centralised metric names for rxresolve operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! [`LookupCounters`] additionally keeps an in-process atomic tally so the
//! pipeline can expose a [`TelemetrySnapshot`] without requiring a metrics
//! recorder at all.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `rxresolve_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `tier` — resolution tier that produced the candidates
//!   ("curated" | "fallback" | "generated")
//! - `cache` — which cache was consulted ("fallback" | "validation")
//! - `status` — outcome: "ok" or "error"

use std::sync::atomic::{AtomicU64, Ordering};

/// Total `resolve_drugs` calls.
///
/// Labels: none.
pub const LOOKUPS_TOTAL: &str = "rxresolve_lookups_total";

/// Total candidate lists served by a tier.
///
/// Labels: `tier` ("curated" | "fallback" | "generated").
pub const TIER_HITS_TOTAL: &str = "rxresolve_tier_hits_total";

/// Total generative-model calls dispatched (generation + scoring).
///
/// Labels: `operation` ("generate" | "score"), `status` ("ok" | "error").
pub const MODEL_CALLS_TOTAL: &str = "rxresolve_model_calls_total";

/// Model call duration in seconds.
///
/// Labels: `operation`.
pub const MODEL_CALL_DURATION_SECONDS: &str = "rxresolve_model_call_duration_seconds";

/// Total cache hits.
///
/// Labels: `cache` ("fallback" | "validation").
pub const CACHE_HITS_TOTAL: &str = "rxresolve_cache_hits_total";

/// Total cache misses.
///
/// Labels: `cache` ("fallback" | "validation").
pub const CACHE_MISSES_TOTAL: &str = "rxresolve_cache_misses_total";

/// Total cache entries evicted by the size-ceiling cleanup pass.
///
/// Labels: `cache`.
pub const CACHE_EVICTIONS_TOTAL: &str = "rxresolve_cache_evictions_total";

/// How often the lookup counters are logged via `tracing::info!`.
pub(crate) const SNAPSHOT_LOG_INTERVAL: u64 = 50;

/// Point-in-time view of the pipeline's lookup counters.
///
/// Returned by [`DrugResolver::telemetry_snapshot()`](crate::DrugResolver::telemetry_snapshot)
/// for operational monitoring without a metrics recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    /// Total `resolve_drugs` invocations.
    pub total_lookups: u64,
    /// Lookups answered by the curated table (Tier 1).
    pub curated_hits: u64,
    /// Lookups answered by the fallback cache (Tier 2).
    pub fallback_hits: u64,
    /// Generative-model candidate generations executed (Tier 3 leaders only).
    pub ai_generations: u64,
}

/// Atomic counters backing [`TelemetrySnapshot`].
///
/// Relaxed ordering is sufficient — the counters are monotonic tallies,
/// not synchronization points.
#[derive(Debug, Default)]
pub(crate) struct LookupCounters {
    total_lookups: AtomicU64,
    curated_hits: AtomicU64,
    fallback_hits: AtomicU64,
    ai_generations: AtomicU64,
}

impl LookupCounters {
    /// Count a lookup and return the running total (used for log sampling).
    pub(crate) fn record_lookup(&self) -> u64 {
        metrics::counter!(LOOKUPS_TOTAL).increment(1);
        self.total_lookups.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn record_curated_hit(&self) {
        metrics::counter!(TIER_HITS_TOTAL, "tier" => "curated").increment(1);
        self.curated_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fallback_hit(&self) {
        metrics::counter!(TIER_HITS_TOTAL, "tier" => "fallback").increment(1);
        self.fallback_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_generation(&self) {
        metrics::counter!(TIER_HITS_TOTAL, "tier" => "generated").increment(1);
        self.ai_generations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            total_lookups: self.total_lookups.load(Ordering::Relaxed),
            curated_hits: self.curated_hits.load(Ordering::Relaxed),
            fallback_hits: self.fallback_hits.load(Ordering::Relaxed),
            ai_generations: self.ai_generations.load(Ordering::Relaxed),
        }
    }
}
