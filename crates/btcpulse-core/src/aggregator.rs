use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::adapters::{adapter_for, ProviderTransport};
use crate::cache::CacheStore;
use crate::config::{AggregatorConfig, MetricPolicy};
use crate::data_source::{CapabilitySet, HistoryRequest, MetricProvider, SourceError, SourceFuture};
use crate::fixtures::canned_http_client;
use crate::health::{HealthReporter, HealthSnapshot};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::rate_limiter::RateLimiter;
use crate::snapshot::MarketSnapshot;
use crate::synthetic::{synthetic_history, synthetic_value};
use crate::validation::{validate, validate_history};
use crate::{CoreError, MetricKind, MetricValue, PricePoint, ProviderId, UtcDateTime};

/// Which tier produced a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingOrigin {
    Cache,
    Live,
    Synthetic,
}

impl ReadingOrigin {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Live => "live",
            Self::Synthetic => "synthetic",
        }
    }
}

/// A skipped or failed source attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptError {
    pub source: ProviderId,
    pub code: String,
    pub message: String,
}

impl AttemptError {
    fn new(source: ProviderId, error: &SourceError) -> Self {
        Self {
            source,
            code: error.code().to_owned(),
            message: error.message().to_owned(),
        }
    }
}

/// Outcome of an aggregated read.
///
/// Reads never fail: when every source is exhausted `data` is a synthetic
/// placeholder and `origin` says so.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading<T> {
    pub data: T,
    pub origin: ReadingOrigin,
    pub selected_source: Option<ProviderId>,
    pub source_chain: Vec<ProviderId>,
    pub errors: Vec<AttemptError>,
    pub latency_ms: u64,
}

impl<T> Reading<T> {
    pub fn is_degraded(&self) -> bool {
        self.origin == ReadingOrigin::Synthetic
    }

    pub fn is_cache_hit(&self) -> bool {
        self.origin == ReadingOrigin::Cache
    }
}

pub type MetricReading = Reading<MetricValue>;
pub type HistoryReading = Reading<Vec<PricePoint>>;

#[derive(Debug, Clone)]
struct Cached<T> {
    value: T,
    source: ProviderId,
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Metric(MetricKind),
    History(HistoryRequest),
}

impl Operation {
    fn name(self) -> &'static str {
        match self {
            Self::Metric(kind) => kind.as_str(),
            Self::History(_) => "history",
        }
    }

    fn cache_key(self) -> String {
        match self {
            Self::Metric(kind) => kind.as_str().to_owned(),
            Self::History(req) => req.cache_key(),
        }
    }

    fn supported_by(self, capabilities: CapabilitySet) -> bool {
        match self {
            Self::Metric(kind) => capabilities.supports(kind),
            Self::History(_) => capabilities.history,
        }
    }

    fn unsupported(self) -> SourceError {
        match self {
            Self::Metric(kind) => SourceError::unsupported_metric(kind),
            Self::History(_) => SourceError::unsupported_history(),
        }
    }
}

/// Cache-then-fetch-then-fallback orchestration over the registered providers.
///
/// Owns the cache and cool-down maps for the process; share one instance
/// (behind an `Arc` if needed) across all callers.
pub struct MetricsAggregator {
    providers: HashMap<ProviderId, Arc<dyn MetricProvider>>,
    config: AggregatorConfig,
    metric_cache: CacheStore<Cached<MetricValue>>,
    history_cache: CacheStore<Cached<Vec<PricePoint>>>,
    rate_limiter: RateLimiter,
    health: HealthReporter,
}

impl MetricsAggregator {
    pub fn new(providers: Vec<Arc<dyn MetricProvider>>, config: AggregatorConfig) -> Self {
        let health = HealthReporter::new(providers.clone(), config.probe_timeout);
        let providers = providers
            .into_iter()
            .map(|provider| (provider.id(), provider))
            .collect();

        Self {
            providers,
            config,
            metric_cache: CacheStore::new(),
            history_cache: CacheStore::new(),
            rate_limiter: RateLimiter::new(),
            health,
        }
    }

    pub fn builder() -> MetricsAggregatorBuilder {
        MetricsAggregatorBuilder::new()
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Registered providers, sorted by id.
    pub fn provider_ids(&self) -> Vec<ProviderId> {
        let mut ids = self.providers.keys().copied().collect::<Vec<_>>();
        ids.sort();
        ids
    }

    pub fn provider(&self, id: ProviderId) -> Option<&Arc<dyn MetricProvider>> {
        self.providers.get(&id)
    }

    /// Reads `kind`, trying `sources` strictly in the given order.
    ///
    /// 1. An unexpired cache entry is returned immediately.
    /// 2. Each source is skipped while in cool-down, otherwise fetched under
    ///    the fetch timeout and validated. The first plausible value is cached
    ///    and returned.
    /// 3. On exhaustion a synthetic value is returned and not cached.
    pub async fn fetch_metric(&self, kind: MetricKind, sources: &[ProviderId]) -> MetricReading {
        let policy = self.config.policy(kind);
        self.resolve(
            Operation::Metric(kind),
            sources,
            &policy,
            &self.metric_cache,
            move |provider| provider.fetch(kind),
            |value| check_metric(kind, value),
            || synthetic_value(kind, UtcDateTime::now()),
        )
        .await
    }

    /// Reads `kind` through its configured default chain.
    pub async fn fetch_default(&self, kind: MetricKind) -> MetricReading {
        let policy = self.config.policy(kind);
        self.fetch_metric(kind, &policy.sources).await
    }

    /// Parses metric and provider names, then reads the metric. An empty
    /// `sources` slice selects the default chain.
    ///
    /// # Errors
    ///
    /// Unknown metric or provider names are contract errors and fail the call.
    pub async fn fetch_metric_named(
        &self,
        metric: &str,
        sources: &[&str],
    ) -> Result<MetricReading, CoreError> {
        let kind = MetricKind::from_str(metric)?;
        let sources = sources
            .iter()
            .map(|name| ProviderId::from_str(name))
            .collect::<Result<Vec<_>, _>>()?;

        if sources.is_empty() {
            Ok(self.fetch_default(kind).await)
        } else {
            Ok(self.fetch_metric(kind, &sources).await)
        }
    }

    /// Daily BTC/USD series for `req.days()` days through the history chain.
    pub async fn price_history(&self, req: HistoryRequest) -> HistoryReading {
        let policy = self.config.history_policy().clone();
        self.resolve(
            Operation::History(req),
            &policy.sources,
            &policy,
            &self.history_cache,
            move |provider| provider.history(req),
            |points: &Vec<PricePoint>| check_history(points),
            || synthetic_history(req, UtcDateTime::now()),
        )
        .await
    }

    /// Probes every registered provider in parallel.
    pub async fn check_health(&self) -> HealthSnapshot {
        self.health.check().await
    }

    /// Reads every dashboard metric concurrently alongside a health check.
    pub async fn snapshot(&self) -> MarketSnapshot {
        let (price, dominance, fear_greed, nupl, sopr, mvrv, health) = tokio::join!(
            self.fetch_default(MetricKind::Price),
            self.fetch_default(MetricKind::Dominance),
            self.fetch_default(MetricKind::FearGreed),
            self.fetch_default(MetricKind::Nupl),
            self.fetch_default(MetricKind::Sopr),
            self.fetch_default(MetricKind::Mvrv),
            self.check_health(),
        );

        MarketSnapshot {
            price,
            dominance,
            fear_greed,
            nupl,
            sopr,
            mvrv,
            health,
            generated_at: UtcDateTime::now(),
        }
    }

    /// Drops every cached reading. Cool-down records are kept.
    pub async fn clear_cache(&self) {
        self.metric_cache.clear().await;
        self.history_cache.clear().await;
    }

    #[allow(clippy::too_many_arguments)]
    async fn resolve<T, F, C, S>(
        &self,
        operation: Operation,
        sources: &[ProviderId],
        policy: &MetricPolicy,
        cache: &CacheStore<Cached<T>>,
        invoke: F,
        check: C,
        synthesize: S,
    ) -> Reading<T>
    where
        T: Clone,
        F: for<'a> Fn(&'a dyn MetricProvider) -> SourceFuture<'a, T>,
        C: Fn(&T) -> Result<(), SourceError>,
        S: FnOnce() -> T,
    {
        let started = Instant::now();
        let key = operation.cache_key();

        if let Some(hit) = cache.get(&key).await {
            debug!(operation = operation.name(), provider = %hit.source, "cache hit");
            return Reading {
                data: hit.value,
                origin: ReadingOrigin::Cache,
                selected_source: Some(hit.source),
                source_chain: Vec::new(),
                errors: Vec::new(),
                latency_ms: elapsed_ms(started),
            };
        }

        let chain = dedupe_chain(sources);
        let mut source_chain = Vec::with_capacity(chain.len());
        let mut errors = Vec::new();

        for provider in chain {
            source_chain.push(provider);

            let Some(adapter) = self.providers.get(&provider) else {
                errors.push(AttemptError::new(provider, &SourceError::not_registered(provider)));
                continue;
            };

            if !operation.supported_by(adapter.capabilities()) {
                errors.push(AttemptError::new(provider, &operation.unsupported()));
                continue;
            }

            let limit_key = RateLimiter::source_key(provider, operation.name());
            if self.rate_limiter.is_limited(&limit_key, policy.rate_window) {
                debug!(
                    operation = operation.name(),
                    provider = %provider,
                    window_secs = policy.rate_window.as_secs(),
                    "source in cool-down, skipping"
                );
                errors.push(AttemptError::new(
                    provider,
                    &SourceError::rate_limited(format!(
                        "attempted less than {}s ago",
                        policy.rate_window.as_secs()
                    )),
                ));
                continue;
            }
            self.rate_limiter.mark_attempted(&limit_key);

            let outcome =
                match tokio::time::timeout(self.config.fetch_timeout, invoke(adapter.as_ref())).await
                {
                    Ok(result) => result,
                    Err(_) => Err(SourceError::timeout(self.config.fetch_timeout)),
                };

            match outcome.and_then(|value| check(&value).map(|()| value)) {
                Ok(value) => {
                    let entry = Cached {
                        value: value.clone(),
                        source: provider,
                    };
                    cache.set(key, entry, policy.ttl).await;

                    if !errors.is_empty() {
                        debug!(
                            operation = operation.name(),
                            provider = %provider,
                            failed = errors.len(),
                            "fallback source succeeded"
                        );
                    }

                    return Reading {
                        data: value,
                        origin: ReadingOrigin::Live,
                        selected_source: Some(provider),
                        source_chain,
                        errors,
                        latency_ms: elapsed_ms(started),
                    };
                }
                Err(error) => {
                    warn!(
                        operation = operation.name(),
                        provider = %provider,
                        code = error.code(),
                        error = %error.message(),
                        "source attempt failed"
                    );
                    errors.push(AttemptError::new(provider, &error));
                }
            }
        }

        warn!(
            operation = operation.name(),
            attempted = source_chain.len(),
            "all sources exhausted, serving synthetic value"
        );

        Reading {
            data: synthesize(),
            origin: ReadingOrigin::Synthetic,
            selected_source: None,
            source_chain,
            errors,
            latency_ms: elapsed_ms(started),
        }
    }
}

/// Assembles a [`MetricsAggregator`] with real or injected transport.
///
/// ```rust,ignore
/// use btcpulse_core::MetricsAggregatorBuilder;
///
/// // Live providers over HTTPS, settings from BTCPULSE_* variables
/// let aggregator = MetricsAggregatorBuilder::new()
///     .with_real_clients()
///     .with_config(AggregatorConfig::from_env()?)
///     .build();
///
/// // Offline, canned provider responses
/// let offline = MetricsAggregatorBuilder::new().with_mock_mode().build();
/// ```
#[derive(Default)]
pub struct MetricsAggregatorBuilder {
    use_mock: bool,
    http_client: Option<Arc<dyn HttpClient>>,
    config: AggregatorConfig,
    disabled: HashSet<ProviderId>,
    base_urls: HashMap<ProviderId, String>,
}

impl MetricsAggregatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve every provider from canned offline payloads.
    pub fn with_mock_mode(mut self) -> Self {
        self.use_mock = true;
        self
    }

    /// Use the reqwest transport against the public provider APIs.
    pub fn with_real_clients(mut self) -> Self {
        self.use_mock = false;
        self.http_client = None;
        self
    }

    /// Route every adapter through `http_client`. Takes precedence over mock mode.
    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn with_config(mut self, config: AggregatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_provider_enabled(mut self, provider: ProviderId, enabled: bool) -> Self {
        if enabled {
            self.disabled.remove(&provider);
        } else {
            self.disabled.insert(provider);
        }
        self
    }

    /// Point one provider at a different API root.
    pub fn with_base_url(mut self, provider: ProviderId, base_url: impl Into<String>) -> Self {
        self.base_urls.insert(provider, base_url.into());
        self
    }

    pub fn build(self) -> MetricsAggregator {
        for (provider, demand, quota) in self.config.over_quota() {
            if self.disabled.contains(&provider) {
                continue;
            }
            warn!(
                provider = %provider,
                demand_per_hour = ?demand,
                quota_per_hour = quota,
                "refresh cadence exceeds provider quota, excess reads will be synthetic"
            );
        }

        let http_client: Arc<dyn HttpClient> = match (self.http_client, self.use_mock) {
            (Some(http_client), _) => http_client,
            (None, true) => Arc::new(canned_http_client()),
            (None, false) => Arc::new(ReqwestHttpClient::new()),
        };

        let providers = ProviderId::ALL
            .into_iter()
            .filter(|provider| !self.disabled.contains(provider))
            .map(|provider| {
                let mut transport = ProviderTransport::for_provider(provider)
                    .with_http_client(Arc::clone(&http_client))
                    .with_timeout(self.config.fetch_timeout);
                if let Some(base_url) = self.base_urls.get(&provider) {
                    transport = transport.with_base_url(base_url.clone());
                }
                adapter_for(transport)
            })
            .collect();

        MetricsAggregator::new(providers, self.config)
    }
}

fn check_metric(kind: MetricKind, value: &MetricValue) -> Result<(), SourceError> {
    if value.kind() != kind {
        return Err(SourceError::malformed(format!(
            "expected {kind} but source returned {}",
            value.kind()
        )));
    }
    validate(value).map_err(|e| SourceError::implausible(&e))
}

fn check_history(points: &[PricePoint]) -> Result<(), SourceError> {
    if points.is_empty() {
        return Err(SourceError::malformed("price history is empty"));
    }
    validate_history(points).map_err(|e| SourceError::implausible(&e))
}

fn dedupe_chain(chain: &[ProviderId]) -> Vec<ProviderId> {
    let mut seen = HashSet::new();
    chain
        .iter()
        .copied()
        .filter(|provider| seen.insert(*provider))
        .collect()
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}
