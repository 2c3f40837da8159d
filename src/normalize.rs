//! Condition-name normalization.
//!
//! Every cache key in the pipeline goes through [`normalize_key`] so that
//! `"Type 2 Diabetes"` and `"  type 2  diabetes "` share entries. The
//! function is pure and idempotent; an empty result means the input was
//! not a usable condition name and the orchestrator short-circuits.

/// Canonicalize a free-text condition name into a lookup key.
///
/// Lowercases, trims, and collapses internal whitespace runs to single
/// spaces. `normalize_key(normalize_key(x)) == normalize_key(x)` for all x.
pub fn normalize_key(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
