//! Aggregator configuration.
//!
//! Defaults match the public free tiers of the configured providers and can
//! be overridden from the environment:
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `BTCPULSE_FETCH_TIMEOUT_MS` | Per-adapter data request timeout (default 5000) |
//! | `BTCPULSE_PROBE_TIMEOUT_MS` | Health probe timeout (default 3000) |
//! | `BTCPULSE_<METRIC>_TTL_SECS` | Cache TTL for a metric |
//! | `BTCPULSE_<METRIC>_RATE_WINDOW_SECS` | Per-source cool-down window |
//! | `BTCPULSE_<METRIC>_SOURCES` | Comma-separated priority-ordered provider list |
//!
//! `<METRIC>` is one of `PRICE`, `DOMINANCE`, `FEAR_GREED`, `NUPL`, `SOPR`,
//! `MVRV` or `HISTORY`.
//!
//! A metric re-fetches a source at most once per `max(ttl, rate_window)`.
//! History caches per `days`, so only its `rate_window` bounds it.
//! [`AggregatorConfig::hourly_demand`] sums this per provider.
//!
//! | Provider | Default demand/hour | Quota/hour |
//! |----------|---------------------|------------|
//! | `coingecko` | 132 (price 60, dominance 12, history 60) | 1800 |
//! | `coincap` | 120 (price 60, history 60) | 12000 |
//! | `coinpaprika` | 72 (price 60, dominance 12) | 3600 |
//! | `alternative_me` | 12 | 3600 |
//! | `bitcoin_data` | 36 (NUPL, SOPR, MVRV at 12 each) | 10 |
//!
//! With the five-minute on-chain defaults, `bitcoin_data` runs out of quota
//! after its first ten requests in an hour. Later on-chain reads that hour
//! fail with `source.rate_limited` and are served synthetic values. Raising
//! `BTCPULSE_{NUPL,SOPR,MVRV}_TTL_SECS` to 1200 keeps all three live. The
//! builder logs a warning whenever a provider's demand exceeds its quota.

use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

use crate::provider_policy::ProviderPolicy;
use crate::{MetricKind, ProviderId, ValidationError};

const ENV_PREFIX: &str = "BTCPULSE";

/// Cache, cool-down and fallback order for one metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricPolicy {
    pub ttl: Duration,
    pub rate_window: Duration,
    pub sources: Vec<ProviderId>,
}

impl MetricPolicy {
    pub fn new(ttl: Duration, rate_window: Duration, sources: Vec<ProviderId>) -> Self {
        Self {
            ttl,
            rate_window,
            sources,
        }
    }

    fn default_for(kind: MetricKind) -> Self {
        let five_minutes = Duration::from_secs(300);
        match kind {
            MetricKind::Price => Self::new(
                Duration::from_secs(30),
                Duration::from_secs(60),
                vec![
                    ProviderId::Coingecko,
                    ProviderId::Coincap,
                    ProviderId::Coinpaprika,
                ],
            ),
            MetricKind::Dominance => Self::new(
                five_minutes,
                five_minutes,
                vec![ProviderId::Coingecko, ProviderId::Coinpaprika],
            ),
            MetricKind::FearGreed => {
                Self::new(five_minutes, five_minutes, vec![ProviderId::AlternativeMe])
            }
            MetricKind::Nupl | MetricKind::Sopr | MetricKind::Mvrv => {
                Self::new(five_minutes, five_minutes, vec![ProviderId::BitcoinData])
            }
        }
    }

    fn default_history() -> Self {
        Self::new(
            Duration::from_secs(300),
            Duration::from_secs(60),
            vec![ProviderId::Coingecko, ProviderId::Coincap],
        )
    }
}

/// Runtime settings for a [`crate::MetricsAggregator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorConfig {
    pub fetch_timeout: Duration,
    pub probe_timeout: Duration,
    metrics: BTreeMap<MetricKind, MetricPolicy>,
    history: MetricPolicy,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(5),
            probe_timeout: Duration::from_secs(3),
            metrics: MetricKind::ALL
                .into_iter()
                .map(|kind| (kind, MetricPolicy::default_for(kind)))
                .collect(),
            history: MetricPolicy::default_history(),
        }
    }
}

impl AggregatorConfig {
    /// Defaults overlaid with `BTCPULSE_*` environment variables.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`, keyed like the environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ms) = read_u64(&lookup, &format!("{ENV_PREFIX}_FETCH_TIMEOUT_MS"))? {
            config.fetch_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = read_u64(&lookup, &format!("{ENV_PREFIX}_PROBE_TIMEOUT_MS"))? {
            config.probe_timeout = Duration::from_millis(ms);
        }

        for kind in MetricKind::ALL {
            let name = kind.as_str().to_ascii_uppercase();
            if let Some(policy) = config.metrics.get_mut(&kind) {
                overlay_policy(&lookup, &name, policy)?;
            }
        }
        overlay_policy(&lookup, "HISTORY", &mut config.history)?;

        Ok(config)
    }

    pub fn policy(&self, kind: MetricKind) -> MetricPolicy {
        self.metrics
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| MetricPolicy::default_for(kind))
    }

    pub fn history_policy(&self) -> &MetricPolicy {
        &self.history
    }

    pub fn with_policy(mut self, kind: MetricKind, policy: MetricPolicy) -> Self {
        self.metrics.insert(kind, policy);
        self
    }

    pub fn with_history_policy(mut self, policy: MetricPolicy) -> Self {
        self.history = policy;
        self
    }

    pub fn with_sources(self, kind: MetricKind, sources: Vec<ProviderId>) -> Self {
        let policy = MetricPolicy {
            sources,
            ..self.policy(kind)
        };
        self.with_policy(kind, policy)
    }

    pub fn with_ttl(self, kind: MetricKind, ttl: Duration) -> Self {
        let policy = MetricPolicy {
            ttl,
            ..self.policy(kind)
        };
        self.with_policy(kind, policy)
    }

    pub fn with_rate_window(self, kind: MetricKind, rate_window: Duration) -> Self {
        let policy = MetricPolicy {
            rate_window,
            ..self.policy(kind)
        };
        self.with_policy(kind, policy)
    }

    /// Worst-case live requests per hour the configured chains send to `provider`.
    ///
    /// `None` when a chain naming `provider` has neither a TTL nor a cool-down.
    pub fn hourly_demand(&self, provider: ProviderId) -> Option<u64> {
        let metrics = self
            .metrics
            .values()
            .map(|policy| (policy, policy.ttl.max(policy.rate_window)));
        let history = std::iter::once((&self.history, self.history.rate_window));

        metrics
            .chain(history)
            .filter(|(policy, _)| policy.sources.contains(&provider))
            .try_fold(0_u64, |total, (_, interval)| {
                let millis = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
                (millis > 0).then(|| total.saturating_add(3_600_000_u64.div_ceil(millis)))
            })
    }

    /// Providers whose [`Self::hourly_demand`] exceeds their published quota.
    pub fn over_quota(&self) -> Vec<(ProviderId, Option<u64>, u64)> {
        ProviderId::ALL
            .into_iter()
            .filter_map(|provider| {
                let demand = self.hourly_demand(provider);
                let quota = ProviderPolicy::default_for(provider).hourly_quota();
                match demand {
                    Some(requests) if requests <= quota => None,
                    _ => Some((provider, demand, quota)),
                }
            })
            .collect()
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }
}

fn overlay_policy<F>(lookup: &F, name: &str, policy: &mut MetricPolicy) -> Result<(), ValidationError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(secs) = read_u64(lookup, &format!("{ENV_PREFIX}_{name}_TTL_SECS"))? {
        policy.ttl = Duration::from_secs(secs);
    }
    if let Some(secs) = read_u64(lookup, &format!("{ENV_PREFIX}_{name}_RATE_WINDOW_SECS"))? {
        policy.rate_window = Duration::from_secs(secs);
    }

    let key = format!("{ENV_PREFIX}_{name}_SOURCES");
    if let Some(raw) = lookup(&key) {
        let sources = ProviderId::parse_list(&raw).map_err(|e| ValidationError::InvalidConfig {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        if sources.is_empty() {
            return Err(ValidationError::InvalidConfig {
                key,
                reason: String::from("source list must not be empty"),
            });
        }
        policy.sources = sources;
    }

    Ok(())
}

fn read_u64<F>(lookup: &F, key: &str) -> Result<Option<u64>, ValidationError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map_err(|e| ValidationError::InvalidConfig {
                    key: key.to_owned(),
                    reason: format!("'{raw}' is not a non-negative integer: {e}"),
                })
        })
        .transpose()
}
