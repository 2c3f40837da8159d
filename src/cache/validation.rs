//! Validation cache for final scored results.
//!
//! Keyed on the normalized diagnosis code. Unlike the fallback cache,
//! empty result sets ARE stored here: a full pipeline run that produced
//! zero qualifying drugs is a legitimate, expensive-to-recompute answer,
//! and the next lookup for the same code should short-circuit instead of
//! re-running enrichment and scoring. What is never stored is a degraded
//! run (scoring unavailable) — the orchestrator skips the write so the
//! next call retries scoring.
//!
//! Mechanics (TTL, lazy expiry, oldest-first eviction at the ceiling)
//! mirror [`FallbackCache`](super::FallbackCache).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::cache::CacheStats;
use crate::clock::Clock;
use crate::telemetry;
use crate::types::ValidatedDrugResult;

/// Configuration for the validation cache.
#[derive(Debug, Clone)]
pub struct ValidationCacheConfig {
    /// Time-to-live for entries. Default: 24 hours.
    pub ttl: Duration,
    /// Hard ceiling on entry count. Default: 500.
    pub max_entries: usize,
}

impl Default for ValidationCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(24 * 3600),
            max_entries: 500,
        }
    }
}

impl ValidationCacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn max_entries(mut self, n: usize) -> Self {
        self.max_entries = n;
        self
    }

    fn cleanup_threshold(&self) -> usize {
        (self.max_entries * 9) / 10
    }
}

#[derive(Debug, Clone)]
struct ValidationEntry {
    results: Vec<ValidatedDrugResult>,
    created_at: Instant,
}

/// TTL + size-bounded store of final scored-and-filtered results.
pub struct ValidationCache {
    entries: Mutex<HashMap<String, ValidationEntry>>,
    clock: Arc<dyn Clock>,
    config: ValidationCacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl ValidationCache {
    pub fn new(config: ValidationCacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Look up cached results by normalized diagnosis code.
    ///
    /// A hit may legitimately be an empty vec. Expired entries are
    /// deleted on read and reported as misses.
    pub fn get(&self, code: &str) -> Option<Vec<ValidatedDrugResult>> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("validation cache lock poisoned");

        match entries.get(code) {
            Some(entry) if now.duration_since(entry.created_at) < self.config.ttl => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "cache" => "validation")
                    .increment(1);
                Some(entry.results.clone())
            }
            Some(_) => {
                entries.remove(code);
                self.record_miss();
                None
            }
            None => {
                self.record_miss();
                None
            }
        }
    }

    /// Insert or replace the results for `code`. Empty vecs are allowed.
    pub fn put(&self, code: &str, results: Vec<ValidatedDrugResult>) {
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("validation cache lock poisoned");

        if entries.len() >= self.config.cleanup_threshold() {
            self.cleanup(&mut entries, now);
        }

        entries.insert(
            code.to_string(),
            ValidationEntry {
                results,
                created_at: now,
            },
        );
    }

    fn cleanup(&self, entries: &mut HashMap<String, ValidationEntry>, now: Instant) {
        entries.retain(|_, e| now.duration_since(e.created_at) < self.config.ttl);

        while entries.len() >= self.config.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.created_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(key) => {
                    entries.remove(&key);
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                    metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL, "cache" => "validation")
                        .increment(1);
                }
                None => break,
            }
        }
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "cache" => "validation").increment(1);
    }

    /// Occupancy split by liveness, without purging.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let entries = self.entries.lock().expect("validation cache lock poisoned");
        let total = entries.len();
        let valid = entries
            .values()
            .filter(|e| now.duration_since(e.created_at) < self.config.ttl)
            .count();
        CacheStats {
            total,
            valid,
            expired: total - valid,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("validation cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hit_count(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn miss_count(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn eviction_count(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Drop all entries (test/ops use).
    pub fn clear(&self) {
        self.entries.lock().expect("validation cache lock poisoned").clear();
    }
}
