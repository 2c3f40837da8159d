//! Curated condition → drug mapping table (Tier 1).
//!
//! A hand-maintained, read-only map from condition keywords to drug-name
//! lists ordered by clinical preference. Lookup is substring containment:
//! the keyword `"diabetes"` hits for `"type 2 diabetes mellitus without
//! complications"`. Keywords are held in a `BTreeMap` so iteration order
//! is stable and the first-match-wins rule is deterministic.
//!
//! This tier performs no I/O and never fails; it exists so the most common
//! conditions never pay for a generative-model round trip.

use std::collections::BTreeMap;

/// Keyword → preference-ordered generic drug names.
///
/// Lists are capped informally at ~8 entries; the orchestrator caps
/// whatever it takes from here to the enrichment fetch limit anyway.
const CURATED_MAPPINGS: &[(&str, &[&str])] = &[
    (
        "allergic rhinitis",
        &["loratadine", "cetirizine", "fluticasone", "fexofenadine", "montelukast"],
    ),
    (
        "anemia",
        &["ferrous sulfate", "folic acid", "cyanocobalamin", "epoetin alfa"],
    ),
    (
        "anxiety",
        &["sertraline", "escitalopram", "buspirone", "venlafaxine", "hydroxyzine", "lorazepam"],
    ),
    (
        "asthma",
        &["albuterol", "fluticasone", "budesonide", "montelukast", "salmeterol", "ipratropium"],
    ),
    (
        "atrial fibrillation",
        &["apixaban", "metoprolol", "diltiazem", "warfarin", "amiodarone", "digoxin"],
    ),
    (
        "copd",
        &["tiotropium", "albuterol", "budesonide", "ipratropium", "roflumilast"],
    ),
    (
        "depress",
        &["sertraline", "escitalopram", "fluoxetine", "bupropion", "venlafaxine", "mirtazapine"],
    ),
    (
        "diabetes",
        &[
            "metformin",
            "glipizide",
            "semaglutide",
            "empagliflozin",
            "sitagliptin",
            "insulin glargine",
            "liraglutide",
            "pioglitazone",
        ],
    ),
    (
        "epilepsy",
        &["levetiracetam", "lamotrigine", "valproate", "carbamazepine", "phenytoin"],
    ),
    (
        "gerd",
        &["omeprazole", "pantoprazole", "famotidine", "esomeprazole"],
    ),
    (
        "gout",
        &["allopurinol", "colchicine", "febuxostat", "indomethacin"],
    ),
    (
        "heart failure",
        &[
            "lisinopril",
            "carvedilol",
            "furosemide",
            "sacubitril/valsartan",
            "spironolactone",
            "dapagliflozin",
        ],
    ),
    (
        "hyperlipidemia",
        &["atorvastatin", "rosuvastatin", "simvastatin", "ezetimibe", "fenofibrate"],
    ),
    (
        "hypertension",
        &[
            "lisinopril",
            "amlodipine",
            "losartan",
            "hydrochlorothiazide",
            "metoprolol",
            "valsartan",
            "chlorthalidone",
        ],
    ),
    (
        "hypothyroid",
        &["levothyroxine", "liothyronine"],
    ),
    (
        "insomnia",
        &["melatonin", "zolpidem", "trazodone", "eszopiclone", "ramelteon"],
    ),
    (
        "migraine",
        &["sumatriptan", "rizatriptan", "topiramate", "propranolol", "erenumab"],
    ),
    (
        "osteoporosis",
        &["alendronate", "risedronate", "denosumab", "zoledronic acid", "teriparatide"],
    ),
    (
        "pneumonia",
        &["amoxicillin", "azithromycin", "doxycycline", "levofloxacin", "ceftriaxone"],
    ),
    (
        "reflux",
        &["omeprazole", "pantoprazole", "famotidine", "esomeprazole"],
    ),
    (
        "rheumatoid arthritis",
        &["methotrexate", "hydroxychloroquine", "sulfasalazine", "adalimumab", "etanercept"],
    ),
    (
        "seizure",
        &["levetiracetam", "lamotrigine", "valproate", "carbamazepine", "phenytoin"],
    ),
    (
        "urinary tract infection",
        &["nitrofurantoin", "trimethoprim/sulfamethoxazole", "cephalexin", "fosfomycin"],
    ),
];

/// Read-only keyword table for Tier-1 lookups.
pub struct CuratedTable {
    mappings: BTreeMap<&'static str, &'static [&'static str]>,
}

impl CuratedTable {
    /// Build the table from the built-in mappings.
    pub fn new() -> Self {
        Self {
            mappings: CURATED_MAPPINGS.iter().copied().collect(),
        }
    }

    /// Look up a normalized condition by substring containment.
    ///
    /// Returns the preference-ordered list for the first keyword (in
    /// sorted keyword order) that appears anywhere in `normalized_condition`,
    /// or `None` when no keyword matches.
    pub fn find(&self, normalized_condition: &str) -> Option<Vec<String>> {
        self.mappings
            .iter()
            .find(|(keyword, _)| normalized_condition.contains(*keyword))
            .map(|(_, drugs)| drugs.iter().map(|d| d.to_string()).collect())
    }

    /// Number of curated keywords.
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl Default for CuratedTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_containment_matches() {
        let table = CuratedTable::new();
        let drugs = table
            .find("type 2 diabetes mellitus without complications")
            .expect("diabetes keyword should match");
        assert_eq!(drugs[0], "metformin");
    }

    #[test]
    fn no_match_returns_none() {
        let table = CuratedTable::new();
        assert!(table.find("fibrodysplasia ossificans progressiva").is_none());
    }

    #[test]
    fn exact_keyword_matches() {
        let table = CuratedTable::new();
        assert!(table.find("asthma").is_some());
    }

    #[test]
    fn first_match_in_sorted_order_wins() {
        let table = CuratedTable::new();
        // Contains both "anxiety" and "depress"; "anxiety" sorts first.
        let drugs = table
            .find("mixed anxiety and depressive disorder")
            .expect("should match");
        assert_eq!(drugs[0], "sertraline");
        assert!(drugs.contains(&"buspirone".to_string()));
    }

    #[test]
    fn lists_preserve_clinical_ordering() {
        let table = CuratedTable::new();
        let drugs = table.find("essential hypertension").unwrap();
        assert_eq!(drugs[0], "lisinopril");
        assert_eq!(drugs[1], "amlodipine");
    }

    #[test]
    fn table_is_nonempty_and_keywords_are_normalized() {
        let table = CuratedTable::new();
        assert!(!table.is_empty());
        for (keyword, drugs) in CURATED_MAPPINGS {
            assert_eq!(*keyword, keyword.to_lowercase(), "keyword not lowercase");
            assert!(!drugs.is_empty(), "empty list for {keyword}");
        }
    }
}
