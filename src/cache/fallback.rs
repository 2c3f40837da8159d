//! Fallback cache for AI-generated candidate lists (Tier 2).
//!
//! Keyed on the normalized condition name. A hit saves a Tier-3
//! generative-model round trip; entries live for 24 hours by default so
//! the candidate set eventually refreshes. The pipeline never stores an
//! empty list here — see the module docs in [`crate::cache`].
//!
//! Eviction is LRU-by-creation, not by last access: when the ceiling is
//! reached, the cleanup pass first purges expired entries, then removes
//! the oldest-`created_at` entries until the new insert fits.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::cache::CacheStats;
use crate::clock::Clock;
use crate::telemetry;

/// Configuration for the fallback cache.
#[derive(Debug, Clone)]
pub struct FallbackCacheConfig {
    /// Time-to-live for entries. Default: 24 hours.
    pub ttl: Duration,
    /// Hard ceiling on entry count. Default: 200.
    pub max_entries: usize,
}

impl Default for FallbackCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(24 * 3600),
            max_entries: 200,
        }
    }
}

impl FallbackCacheConfig {
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

    /// Occupancy at which `put` runs a cleanup pass: 90% of the ceiling.
    fn cleanup_threshold(&self) -> usize {
        (self.max_entries * 9) / 10
    }
}

#[derive(Debug, Clone)]
struct FallbackEntry {
    drug_names: Vec<String>,
    created_at: Instant,
    source_label: String,
}

/// TTL + size-bounded store of generated candidate name lists.
///
/// Interior mutability behind a single `Mutex` — every operation is a
/// short in-memory critical section, so a std mutex is appropriate even
/// from async contexts.
pub struct FallbackCache {
    entries: Mutex<HashMap<String, FallbackEntry>>,
    clock: Arc<dyn Clock>,
    config: FallbackCacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl FallbackCache {
    pub fn new(config: FallbackCacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Look up a candidate list by normalized key.
    ///
    /// An entry past TTL is deleted as a side effect of the read and
    /// reported as a miss (lazy expiration).
    pub fn get(&self, key: &str) -> Option<Vec<String>> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("fallback cache lock poisoned");

        match entries.get(key) {
            Some(entry) if now.duration_since(entry.created_at) < self.config.ttl => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "cache" => "fallback").increment(1);
                Some(entry.drug_names.clone())
            }
            Some(_) => {
                entries.remove(key);
                self.record_miss();
                None
            }
            None => {
                self.record_miss();
                None
            }
        }
    }

    /// Insert or replace the entry for `key`.
    ///
    /// `drug_names` must be non-empty — empty Tier-3 results are not
    /// cached so the next lookup retries generation. Enforced by the
    /// caller; debug builds assert it.
    pub fn put(&self, key: &str, drug_names: Vec<String>, source_label: &str) {
        debug_assert!(!drug_names.is_empty(), "empty lists must not be cached");
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("fallback cache lock poisoned");

        if entries.len() >= self.config.cleanup_threshold() {
            self.cleanup(&mut entries, now);
        }

        entries.insert(
            key.to_string(),
            FallbackEntry {
                drug_names,
                created_at: now,
                source_label: source_label.to_string(),
            },
        );
    }

    /// Purge expired entries, then evict oldest-first until a new insert
    /// would fit under the ceiling.
    fn cleanup(&self, entries: &mut HashMap<String, FallbackEntry>, now: Instant) {
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
                    metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL, "cache" => "fallback")
                        .increment(1);
                }
                None => break,
            }
        }
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "cache" => "fallback").increment(1);
    }

    /// Source label recorded for a live entry (diagnostics; does not
    /// count as a hit or miss).
    pub fn source_label(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        let entries = self.entries.lock().expect("fallback cache lock poisoned");
        entries
            .get(key)
            .filter(|e| now.duration_since(e.created_at) < self.config.ttl)
            .map(|e| e.source_label.clone())
    }

    /// Occupancy split by liveness, without purging.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let entries = self.entries.lock().expect("fallback cache lock poisoned");
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
        self.entries.lock().expect("fallback cache lock poisoned").len()
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
        self.entries.lock().expect("fallback cache lock poisoned").clear();
    }
}
