//! AI candidate generation (Tier 3).
//!
//! When both the curated table and the fallback cache miss, the
//! [`CandidateGenerator`] asks the model for up to 15 generic drug names
//! and runs the response through the tolerant parser in [`parse`]. The
//! generator never panics or propagates model trouble: every failure
//! mode maps to a [`GenerateFailure`] variant the orchestrator
//! pattern-matches to pick its degradation path.

mod parse;

pub use parse::{parse_drug_list, validate_drug_list};

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::client::{response_sample, CompletionRequest, ModelClient};
use crate::telemetry;
use crate::RxError;

/// Default hard timeout for one generation call.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum number of candidate names requested from the model.
pub const MAX_CANDIDATES: usize = 15;

/// Why a generation produced no candidates.
///
/// `Empty` and `ParseFailure` both mean "no usable candidates", but the
/// distinction matters for logging: `ParseFailure` carries evidence of a
/// misbehaving model, `Empty` may be a legitimately drug-less condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateFailure {
    /// The model call exceeded its hard timeout.
    Timeout,
    /// Transport or API failure (non-2xx, network, auth).
    Transport(String),
    /// The response text yielded nothing under any parsing strategy.
    ParseFailure,
    /// Parsing succeeded but validation left an empty list.
    Empty,
}

/// Tier-3 candidate generator.
pub struct CandidateGenerator {
    client: Arc<dyn ModelClient>,
    timeout: Duration,
}

impl CandidateGenerator {
    pub fn new(client: Arc<dyn ModelClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Ask the model for candidate generic names for `condition_name`.
    ///
    /// `Ok` is always non-empty — an empty outcome comes back as a
    /// [`GenerateFailure`] so the caller never caches it.
    pub async fn generate(&self, condition_name: &str) -> Result<Vec<String>, GenerateFailure> {
        let request = CompletionRequest {
            system_prompt: Some(SYSTEM_PROMPT.to_string()),
            user_prompt: build_prompt(condition_name),
            max_tokens: 500,
            temperature: 0.2,
            timeout: self.timeout,
        };

        let started = Instant::now();
        let response = self.client.complete(&request).await;
        metrics::histogram!(telemetry::MODEL_CALL_DURATION_SECONDS, "operation" => "generate")
            .record(started.elapsed().as_secs_f64());

        let text = match response {
            Ok(text) => text,
            Err(error) => {
                metrics::counter!(telemetry::MODEL_CALLS_TOTAL,
                    "operation" => "generate", "status" => "error")
                .increment(1);
                warn!(condition = condition_name, %error, "candidate generation failed");
                return Err(match error {
                    RxError::Timeout(_) => GenerateFailure::Timeout,
                    other => GenerateFailure::Transport(other.to_string()),
                });
            }
        };
        metrics::counter!(telemetry::MODEL_CALLS_TOTAL,
            "operation" => "generate", "status" => "ok")
        .increment(1);

        let parsed = parse_drug_list(&text);
        if parsed.is_empty() {
            warn!(
                condition = condition_name,
                sample = %response_sample(&text),
                "no drug list found in model response"
            );
            return Err(GenerateFailure::ParseFailure);
        }

        let mut validated = validate_drug_list(parsed);
        validated.truncate(MAX_CANDIDATES);
        if validated.is_empty() {
            debug!(condition = condition_name, "all parsed candidates failed validation");
            return Err(GenerateFailure::Empty);
        }

        debug!(
            condition = condition_name,
            count = validated.len(),
            "generated candidates"
        );
        Ok(validated)
    }
}

const SYSTEM_PROMPT: &str = "You are a clinical pharmacology reference. \
    You answer only with the exact format requested, with no commentary.";

fn build_prompt(condition_name: &str) -> String {
    format!(
        "List up to {MAX_CANDIDATES} generic drug names commonly used to treat \
         the following medical condition: \"{condition_name}\".\n\
         Order them from most to least commonly prescribed.\n\
         Respond with ONLY a JSON array of strings, e.g. [\"metformin\", \"glipizide\"]."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::Result;

    struct CannedClient {
        response: std::result::Result<String, ()>,
    }

    #[async_trait]
    impl ModelClient for CannedClient {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(RxError::Timeout(Duration::from_secs(10))),
            }
        }
    }

    fn generator(response: std::result::Result<&str, ()>) -> CandidateGenerator {
        CandidateGenerator::new(
            Arc::new(CannedClient {
                response: response.map(str::to_string),
            }),
            DEFAULT_GENERATION_TIMEOUT,
        )
    }

    #[tokio::test]
    async fn successful_generation_is_validated() {
        let names = generator(Ok(r#"["Metformin", "Glipizide", "metformin"]"#))
            .generate("type 2 diabetes")
            .await
            .unwrap();
        assert_eq!(names, vec!["metformin", "glipizide"]);
    }

    #[tokio::test]
    async fn timeout_maps_to_failure() {
        let outcome = generator(Err(())).generate("type 2 diabetes").await;
        assert_eq!(outcome, Err(GenerateFailure::Timeout));
    }

    #[tokio::test]
    async fn unparseable_response_is_a_parse_failure() {
        let outcome = generator(Ok("I'm sorry, I can't provide medical advice."))
            .generate("type 2 diabetes")
            .await;
        assert_eq!(outcome, Err(GenerateFailure::ParseFailure));
    }

    #[tokio::test]
    async fn all_invalid_candidates_is_empty() {
        let outcome = generator(Ok(r#"["ab", "x{y"]"#)).generate("gout").await;
        assert_eq!(outcome, Err(GenerateFailure::Empty));
    }

    #[tokio::test]
    async fn output_capped_to_max_candidates() {
        let many: Vec<String> = (0..30).map(|i| format!("drug-number-{i}")).collect();
        let json = serde_json::to_string(&many).unwrap();
        let names = generator(Ok(&json)).generate("hypertension").await.unwrap();
        assert_eq!(names.len(), MAX_CANDIDATES);
    }

    #[test]
    fn prompt_names_the_condition_and_format() {
        let prompt = build_prompt("chronic migraine");
        assert!(prompt.contains("chronic migraine"));
        assert!(prompt.contains("JSON array"));
    }
}
