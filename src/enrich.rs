//! Drug name enrichment seam.
//!
//! Turns a bare candidate name ("metformin") into a structured
//! [`EnrichedDrug`]. The pipeline only sees the [`DrugDirectory`] trait;
//! [`OpenFdaDirectory`] implements it against the openFDA drug NDC
//! endpoint. Enrichment is idempotent and side-effect-free from the
//! pipeline's perspective; names that fail to resolve are silently
//! dropped from batch results.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::types::EnrichedDrug;
use crate::{Result, RxError};

/// Default base URL for the openFDA API.
const DEFAULT_BASE_URL: &str = "https://api.fda.gov";

/// Default hard timeout for one enrichment request.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Resolves bare drug names into structured brand/generic/dosage data.
#[async_trait]
pub trait DrugDirectory: Send + Sync {
    /// Resolve one name. `Ok(None)` means the directory has no match;
    /// `Err` means the lookup itself failed.
    async fn resolve(&self, name: &str) -> Result<Option<EnrichedDrug>>;

    /// Resolve a batch, silently dropping names that fail to resolve
    /// (no match or transport error). Order follows the input.
    async fn resolve_many(&self, names: &[String]) -> Vec<EnrichedDrug> {
        let mut out = Vec::with_capacity(names.len());
        for name in names {
            match self.resolve(name).await {
                Ok(Some(drug)) => out.push(drug),
                Ok(None) => debug!(name = %name, "no directory match, dropping"),
                Err(error) => debug!(name = %name, %error, "enrichment failed, dropping"),
            }
        }
        out
    }
}

/// openFDA-backed directory.
#[derive(Clone)]
pub struct OpenFdaDirectory {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl OpenFdaDirectory {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a directory with a custom base URL (for testing with wiremock).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for OpenFdaDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DrugDirectory for OpenFdaDirectory {
    async fn resolve(&self, name: &str) -> Result<Option<EnrichedDrug>> {
        let url = format!("{}/drug/ndc.json", self.base_url);
        let search = format!("generic_name:\"{name}\" brand_name:\"{name}\"");

        let response = self
            .http
            .get(&url)
            .timeout(self.timeout)
            .query(&[("search", search.as_str()), ("limit", "1")])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RxError::Timeout(self.timeout)
                } else {
                    RxError::Http(e.to_string())
                }
            })?;

        // openFDA answers 404 for zero matches.
        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            return Err(RxError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body: NdcResponse = response
            .json()
            .await
            .map_err(|e| RxError::Http(e.to_string()))?;

        Ok(body.results.into_iter().next().map(|product| {
            let strength = product
                .active_ingredients
                .first()
                .and_then(|i| i.strength.clone());
            EnrichedDrug {
                brand_name: product.brand_name.unwrap_or_else(|| name.to_string()),
                generic_name: product.generic_name.unwrap_or_else(|| name.to_string()),
                dosage_form: product.dosage_form,
                strength,
                source_id: product.product_ndc,
            }
        }))
    }

    /// Concurrent batch resolution — one request per name, joined.
    async fn resolve_many(&self, names: &[String]) -> Vec<EnrichedDrug> {
        let lookups = names.iter().map(|name| async move {
            match self.resolve(name).await {
                Ok(Some(drug)) => Some(drug),
                Ok(None) => {
                    debug!(name = %name, "no directory match, dropping");
                    None
                }
                Err(error) => {
                    debug!(name = %name, %error, "enrichment failed, dropping");
                    None
                }
            }
        });
        join_all(lookups).await.into_iter().flatten().collect()
    }
}

#[derive(Deserialize)]
struct NdcResponse {
    #[serde(default)]
    results: Vec<NdcProduct>,
}

#[derive(Deserialize)]
struct NdcProduct {
    product_ndc: String,
    brand_name: Option<String>,
    generic_name: Option<String>,
    dosage_form: Option<String>,
    #[serde(default)]
    active_ingredients: Vec<ActiveIngredient>,
}

#[derive(Deserialize)]
struct ActiveIngredient {
    #[allow(dead_code)]
    name: Option<String>,
    strength: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ndc_response() {
        let json = r#"{
            "results": [{
                "product_ndc": "0093-1048",
                "brand_name": "Glucophage",
                "generic_name": "metformin hydrochloride",
                "dosage_form": "TABLET",
                "active_ingredients": [{"name": "METFORMIN HYDROCHLORIDE", "strength": "500 mg/1"}]
            }]
        }"#;
        let parsed: NdcResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.results[0].brand_name.as_deref(), Some("Glucophage"));
        assert_eq!(
            parsed.results[0].active_ingredients[0].strength.as_deref(),
            Some("500 mg/1")
        );
    }

    #[test]
    fn parse_ndc_response_with_missing_fields() {
        let json = r#"{"results": [{"product_ndc": "1234-5678"}]}"#;
        let parsed: NdcResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.results[0].brand_name.is_none());
        assert!(parsed.results[0].active_ingredients.is_empty());
    }
}
