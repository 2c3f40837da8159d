//! TTL + size-bounded in-memory caches for the resolution pipeline.
//!
//! Two caches with the same mechanical contract but different payloads
//! and caching rules:
//!
//! - [`FallbackCache`] (Tier 2) stores previously AI-generated candidate
//!   name lists. Empty lists are **never** stored, so a transient model
//!   hiccup is retried on the next lookup.
//! - [`ValidationCache`] stores final scored-and-filtered results keyed
//!   by diagnosis code. Empty result sets **are** stored, so a condition
//!   with no qualifying drugs doesn't re-run enrichment and scoring.
//!
//! Both compute entry age against an injected [`Clock`](crate::clock::Clock),
//! expire lazily on read, and evict oldest-`created_at` first when the
//! size ceiling is reached. Entries are replaced wholesale, never mutated
//! in place.

mod fallback;
mod validation;

pub use fallback::{FallbackCache, FallbackCacheConfig};
pub use validation::{ValidationCache, ValidationCacheConfig};

/// Point-in-time occupancy of a cache, split by liveness.
///
/// `total == valid + expired`; expired entries are those past TTL that
/// have not yet been lazily purged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub total: usize,
    pub valid: usize,
    pub expired: usize,
}
