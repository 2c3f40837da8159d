//! Builder for configuring [`DrugResolver`] instances.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{
    FallbackCache, FallbackCacheConfig, ValidationCache, ValidationCacheConfig,
};
use crate::client::{ModelClient, OpenAiCompatClient};
use crate::clock::{Clock, SystemClock};
use crate::curated::CuratedTable;
use crate::enrich::{DrugDirectory, OpenFdaDirectory};
use crate::generate::{CandidateGenerator, DEFAULT_GENERATION_TIMEOUT};
use crate::inflight::InFlightCoordinator;
use crate::scoring::{RelevanceScorer, DEFAULT_SCORING_TIMEOUT};
use crate::{DrugResolver, Result, RxError};

/// Extra slack joiners wait beyond the generation timeout before giving
/// up on an unresolved leader.
const JOINER_WAIT_MARGIN: Duration = Duration::from_secs(5);

/// Builder for [`DrugResolver`].
///
/// A model client is required; everything else has defaults (openFDA
/// enrichment, system clock, 24h cache TTLs, 10s model timeouts).
///
/// ```rust,no_run
/// use rxresolve::DrugResolver;
///
/// # fn main() -> rxresolve::Result<()> {
/// let resolver = DrugResolver::builder()
///     .openai("sk-your-key", "gpt-4o-mini")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct DrugResolverBuilder {
    model_client: Option<Arc<dyn ModelClient>>,
    directory: Option<Arc<dyn DrugDirectory>>,
    clock: Arc<dyn Clock>,
    fallback_config: FallbackCacheConfig,
    validation_config: ValidationCacheConfig,
    generation_timeout: Duration,
    scoring_timeout: Duration,
}

impl DrugResolverBuilder {
    pub fn new() -> Self {
        Self {
            model_client: None,
            directory: None,
            clock: Arc::new(SystemClock),
            fallback_config: FallbackCacheConfig::default(),
            validation_config: ValidationCacheConfig::default(),
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
            scoring_timeout: DEFAULT_SCORING_TIMEOUT,
        }
    }

    /// Use a custom model client (mocks, alternative providers).
    pub fn model_client(mut self, client: Arc<dyn ModelClient>) -> Self {
        self.model_client = Some(client);
        self
    }

    /// Use the OpenAI-compatible client against the default endpoint.
    pub fn openai(self, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        self.model_client(Arc::new(OpenAiCompatClient::new(api_key, model)))
    }

    /// Use a custom enrichment directory (mocks, alternative sources).
    pub fn directory(mut self, directory: Arc<dyn DrugDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Use the openFDA directory with a custom base URL.
    pub fn openfda_base_url(self, base_url: impl Into<String>) -> Self {
        self.directory(Arc::new(OpenFdaDirectory::with_base_url(base_url)))
    }

    /// Inject a clock (tests use `ManualClock` to drive TTL expiry).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Configure the fallback cache (TTL, ceiling).
    pub fn fallback_cache(mut self, config: FallbackCacheConfig) -> Self {
        self.fallback_config = config;
        self
    }

    /// Configure the validation cache (TTL, ceiling).
    pub fn validation_cache(mut self, config: ValidationCacheConfig) -> Self {
        self.validation_config = config;
        self
    }

    /// Hard timeout for Tier-3 generation calls. Default: 10s.
    pub fn generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    /// Hard timeout for relevance scoring calls. Default: 10s.
    pub fn scoring_timeout(mut self, timeout: Duration) -> Self {
        self.scoring_timeout = timeout;
        self
    }

    /// Build the resolver.
    ///
    /// Fails fast with [`RxError::Configuration`] when no model client
    /// is configured — a missing credential must not surface per-request.
    pub fn build(self) -> Result<DrugResolver> {
        let client = self.model_client.ok_or_else(|| {
            RxError::Configuration("a model client is required (openai() or model_client())".into())
        })?;
        let directory = self
            .directory
            .unwrap_or_else(|| Arc::new(OpenFdaDirectory::new()));

        let joiner_wait = self.generation_timeout + JOINER_WAIT_MARGIN;

        Ok(DrugResolver::from_parts(
            CuratedTable::new(),
            FallbackCache::new(self.fallback_config, self.clock.clone()),
            ValidationCache::new(self.validation_config, self.clock),
            InFlightCoordinator::new(joiner_wait),
            CandidateGenerator::new(client.clone(), self.generation_timeout),
            RelevanceScorer::new(client, self.scoring_timeout),
            directory,
        ))
    }
}

impl Default for DrugResolverBuilder {
    fn default() -> Self {
        Self::new()
    }
}
