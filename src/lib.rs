//! rxresolve - condition-to-drug relevance resolution pipeline
//!
//! Maps a free-text medical condition name to a list of clinically
//! relevant drugs through a three-tier lookup chain — a curated table, a
//! TTL-bounded cache of previously AI-generated lists, and a generative
//! model — followed by name enrichment and model-based relevance scoring.
//! The generative model is treated as an untrusted collaborator: its
//! output is parsed defensively and a failure anywhere in the chain
//! degrades to an empty or partial result, never an error to the caller.
//!
//! # Example
//!
//! ```rust,no_run
//! use rxresolve::DrugResolver;
//!
//! #[tokio::main]
//! async fn main() -> rxresolve::Result<()> {
//!     let resolver = DrugResolver::builder()
//!         .openai("sk-your-key", "gpt-4o-mini")
//!         .build()?;
//!
//!     let results = resolver
//!         .resolve_drugs("Type 2 diabetes mellitus without complications", "E11.9")
//!         .await;
//!
//!     for result in results {
//!         println!("{} — {}", result.drug.label(), result.relevance_score);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod clock;
pub mod curated;
pub mod enrich;
pub mod error;
pub mod generate;
pub mod inflight;
pub mod normalize;
pub mod pipeline;
pub mod scoring;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use error::{Result, RxError};
pub use pipeline::{
    DrugResolver, DrugResolverBuilder, ENRICHMENT_LIMIT, MAX_RESULTS, OFF_LABEL_THRESHOLD,
};

// Re-export the pipeline's data model and seams
pub use cache::{CacheStats, FallbackCacheConfig, ValidationCacheConfig};
pub use client::{CompletionRequest, ModelClient, OpenAiCompatClient};
pub use clock::{Clock, ManualClock, SystemClock};
pub use enrich::{DrugDirectory, OpenFdaDirectory};
pub use telemetry::TelemetrySnapshot;
pub use types::{DrugScore, EnrichedDrug, ValidatedDrugResult, UNSCORED};
