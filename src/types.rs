//! Core data types flowing through the resolution pipeline.

use serde::{Deserialize, Serialize};

/// Relevance score marking a result as unscored.
///
/// Used when the scoring agent was unavailable for the whole batch —
/// callers must not filter on it, and the pipeline does not cache
/// results carrying it.
pub const UNSCORED: i32 = -1;

/// A drug name resolved to structured data by the enrichment service.
///
/// Owned by the [`DrugDirectory`](crate::enrich::DrugDirectory); the
/// pipeline treats it as read-only input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedDrug {
    /// Marketed brand name (e.g. "Glucophage").
    pub brand_name: String,
    /// Generic (non-proprietary) name (e.g. "metformin").
    pub generic_name: String,
    /// Dosage form, when known (e.g. "TABLET").
    pub dosage_form: Option<String>,
    /// Strength, when known (e.g. "500 mg").
    pub strength: Option<String>,
    /// Identifier in the enrichment source (e.g. an NDC product code).
    pub source_id: String,
}

impl EnrichedDrug {
    /// Display label used when matching scores back to drugs:
    /// `"Brand (generic)"`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.brand_name, self.generic_name)
    }
}

/// One scored candidate as produced by the relevance scoring agent.
///
/// `score` is already clamped to `[0, 10]` and `reasoning` truncated to
/// 150 characters by the agent's parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrugScore {
    /// The drug name as the model echoed it back — matched against
    /// [`EnrichedDrug`] labels, not trusted as an identifier.
    pub drug_identifier: String,
    /// Clinical relevance, 0–10.
    pub score: i32,
    /// Short model-provided justification.
    pub reasoning: String,
}

/// Final pipeline output: an enriched drug plus its relevance verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedDrugResult {
    /// The enriched drug record.
    #[serde(flatten)]
    pub drug: EnrichedDrug,
    /// Relevance score in `[0, 10]`, or [`UNSCORED`] when scoring was
    /// unavailable.
    pub relevance_score: i32,
    /// Model reasoning for the score, when scored.
    pub relevance_reasoning: Option<String>,
}

impl ValidatedDrugResult {
    /// Build a scored result from an enriched drug and its score.
    pub fn scored(drug: EnrichedDrug, score: DrugScore) -> Self {
        Self {
            drug,
            relevance_score: score.score,
            relevance_reasoning: Some(score.reasoning),
        }
    }

    /// Build an unscored result (scoring unavailable; do not filter).
    pub fn unscored(drug: EnrichedDrug) -> Self {
        Self {
            drug,
            relevance_score: UNSCORED,
            relevance_reasoning: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metformin() -> EnrichedDrug {
        EnrichedDrug {
            brand_name: "Glucophage".into(),
            generic_name: "metformin".into(),
            dosage_form: Some("TABLET".into()),
            strength: Some("500 mg".into()),
            source_id: "0093-1048".into(),
        }
    }

    #[test]
    fn label_combines_brand_and_generic() {
        assert_eq!(metformin().label(), "Glucophage (metformin)");
    }

    #[test]
    fn unscored_uses_sentinel() {
        let result = ValidatedDrugResult::unscored(metformin());
        assert_eq!(result.relevance_score, UNSCORED);
        assert!(result.relevance_reasoning.is_none());
    }

    #[test]
    fn scored_carries_reasoning() {
        let result = ValidatedDrugResult::scored(
            metformin(),
            DrugScore {
                drug_identifier: "Glucophage (metformin)".into(),
                score: 10,
                reasoning: "first-line therapy".into(),
            },
        );
        assert_eq!(result.relevance_score, 10);
        assert_eq!(result.relevance_reasoning.as_deref(), Some("first-line therapy"));
    }
}
