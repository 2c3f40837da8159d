//! Matching model scores back to enriched drugs.
//!
//! The scoring agent echoes drug names back as free text, so the join
//! back to [`EnrichedDrug`] records cannot assume exact identifiers.
//! For each enriched drug the matcher tries, in order: the exact
//! `"Brand (generic)"` label, brand only, generic only,
//! whitespace-stripped variants of all three, then a substring fuzzy
//! fallback. All comparisons are case-insensitive. A drug with no
//! matching score is dropped with a logged warning.

use tracing::warn;

use crate::types::{DrugScore, EnrichedDrug, ValidatedDrugResult};

/// Join scores to drugs, dropping unmatched drugs.
pub(crate) fn match_scores(
    enriched: Vec<EnrichedDrug>,
    scores: &[DrugScore],
) -> Vec<ValidatedDrugResult> {
    enriched
        .into_iter()
        .filter_map(|drug| match find_score(&drug, scores) {
            Some(score) => Some(ValidatedDrugResult::scored(drug, score.clone())),
            None => {
                warn!(
                    drug = %drug.label(),
                    "no score matched this drug, dropping from results"
                );
                None
            }
        })
        .collect()
}

fn find_score<'a>(drug: &EnrichedDrug, scores: &'a [DrugScore]) -> Option<&'a DrugScore> {
    let label = drug.label().to_lowercase();
    let brand = drug.brand_name.to_lowercase();
    let generic = drug.generic_name.to_lowercase();

    fn exact<'s>(scores: &'s [DrugScore], target: &str) -> Option<&'s DrugScore> {
        scores
            .iter()
            .find(|s| s.drug_identifier.to_lowercase() == target)
    }

    if let Some(score) = exact(scores, &label)
        .or_else(|| exact(scores, &brand))
        .or_else(|| exact(scores, &generic))
    {
        return Some(score);
    }

    // Whitespace-stripped variants catch "Brand(generic)" style echoes.
    let stripped = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
    let targets = [stripped(&label), stripped(&brand), stripped(&generic)];
    if let Some(score) = scores.iter().find(|s| {
        let id = stripped(&s.drug_identifier.to_lowercase());
        targets.contains(&id)
    }) {
        return Some(score);
    }

    // Substring fuzzy fallback, either direction.
    scores.iter().find(|s| {
        let id = s.drug_identifier.to_lowercase();
        id.contains(&generic) || id.contains(&brand) || generic.contains(&id) || brand.contains(&id)
    })
}
