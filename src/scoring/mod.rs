//! Relevance scoring agent.
//!
//! Scores each enriched candidate 0–10 against the condition using a
//! rubric-driven prompt with a strict JSON contract. The contract is
//! enforced leniently per element: a malformed element is dropped with a
//! warning rather than aborting the batch, scores are clamped into
//! [0, 10], and reasoning text is truncated to 150 characters.
//!
//! A failed model call (auth, timeout, network) returns an **empty**
//! list. The orchestrator must treat that as "scoring unavailable", not
//! "no drugs are relevant" — see
//! [`DrugResolver::resolve_drugs`](crate::DrugResolver::resolve_drugs).

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::client::{response_sample, CompletionRequest, ModelClient};
use crate::telemetry;
use crate::types::DrugScore;

/// Default hard timeout for one scoring call.
pub const DEFAULT_SCORING_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum characters kept from a model-provided reasoning string.
pub const MAX_REASONING_CHARS: usize = 150;

/// Scores candidate drugs against a condition via the model.
pub struct RelevanceScorer {
    client: Arc<dyn ModelClient>,
    timeout: Duration,
}

impl RelevanceScorer {
    pub fn new(client: Arc<dyn ModelClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Score `(brand, generic)` candidates against `condition_name`.
    ///
    /// Returns an empty vec when the model call fails or nothing in the
    /// response satisfies the contract.
    pub async fn score(
        &self,
        condition_name: &str,
        candidates: &[(String, String)],
    ) -> Vec<DrugScore> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let request = CompletionRequest {
            system_prompt: Some(SYSTEM_PROMPT.to_string()),
            user_prompt: build_prompt(condition_name, candidates),
            max_tokens: 1000,
            temperature: 0.0,
            timeout: self.timeout,
        };

        let started = Instant::now();
        let response = self.client.complete(&request).await;
        metrics::histogram!(telemetry::MODEL_CALL_DURATION_SECONDS, "operation" => "score")
            .record(started.elapsed().as_secs_f64());

        let text = match response {
            Ok(text) => {
                metrics::counter!(telemetry::MODEL_CALLS_TOTAL,
                    "operation" => "score", "status" => "ok")
                .increment(1);
                text
            }
            Err(error) => {
                metrics::counter!(telemetry::MODEL_CALLS_TOTAL,
                    "operation" => "score", "status" => "error")
                .increment(1);
                warn!(condition = condition_name, %error, "relevance scoring failed");
                return Vec::new();
            }
        };

        let scores = parse_score_response(&text);
        if scores.is_empty() {
            warn!(
                condition = condition_name,
                sample = %response_sample(&text),
                "no usable scores in model response"
            );
        }
        scores
    }
}

/// Parse the scoring response: strip optional markdown fences, find the
/// JSON array, and keep the elements that satisfy the contract.
pub fn parse_score_response(text: &str) -> Vec<DrugScore> {
    let text = strip_code_fences(text);
    let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) else {
        return Vec::new();
    };
    if end <= start {
        return Vec::new();
    }

    let elements: Vec<serde_json::Value> = match serde_json::from_str(&text[start..=end]) {
        Ok(elements) => elements,
        Err(_) => return Vec::new(),
    };

    elements
        .into_iter()
        .filter_map(|element| match parse_score_element(&element) {
            Some(score) => Some(score),
            None => {
                warn!(element = %element, "dropping malformed score element");
                None
            }
        })
        .collect()
}

/// One element must carry `drugName: string`, `score: number`,
/// `reasoning: string`. The score is rounded and clamped to [0, 10];
/// the reasoning is truncated to [`MAX_REASONING_CHARS`].
fn parse_score_element(element: &serde_json::Value) -> Option<DrugScore> {
    let drug_identifier = element.get("drugName")?.as_str()?.to_string();
    let raw_score = element.get("score")?.as_f64()?;
    let reasoning = element.get("reasoning")?.as_str()?;

    Some(DrugScore {
        drug_identifier,
        score: clamp_score(raw_score),
        reasoning: reasoning.chars().take(MAX_REASONING_CHARS).collect(),
    })
}

/// Round and clamp a raw model score into [0, 10].
pub fn clamp_score(raw: f64) -> i32 {
    (raw.round() as i64).clamp(0, 10) as i32
}

/// Remove a leading/trailing markdown code fence, if present.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the info string ("json") on the fence line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

const SYSTEM_PROMPT: &str = "You are a clinical pharmacology reviewer. \
    You respond with strictly valid JSON and nothing else.";

fn build_prompt(condition_name: &str, candidates: &[(String, String)]) -> String {
    let mut listing = String::new();
    for (brand, generic) in candidates {
        listing.push_str(&format!("- {brand} ({generic})\n"));
    }
    format!(
        "Score each drug below for clinical relevance to the condition \
         \"{condition_name}\" on a 0-10 scale:\n\
         - 10: FDA-approved primary indication for this condition\n\
         - 7-9: FDA-approved indication or strongly guideline-supported use\n\
         - 4-6: recognized off-label use with clinical evidence\n\
         - 2-3: weak or anecdotal relevance\n\
         - 0-1: the condition appears only as a contraindication or warning, \
         not as a treated indication\n\n\
         Drugs:\n{listing}\n\
         Respond with STRICTLY a JSON array, one element per drug, in the form \
         [{{\"drugName\": \"Brand (generic)\", \"score\": 0, \"reasoning\": \"...\"}}]. \
         Keep each reasoning under 150 characters."
    )
}
