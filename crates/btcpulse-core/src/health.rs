//! Provider reachability probes.
//!
//! Health is independent of the data path: a provider can be reachable while
//! its last data fetch failed validation, and the other way round.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::data_source::MetricProvider;
use crate::ProviderId;

/// Point-in-time reachability per provider. Produced fresh on every check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HealthSnapshot {
    providers: BTreeMap<ProviderId, bool>,
}

impl HealthSnapshot {
    pub fn new(providers: BTreeMap<ProviderId, bool>) -> Self {
        Self { providers }
    }

    /// `None` when the provider was not part of the check.
    pub fn is_reachable(&self, provider: ProviderId) -> Option<bool> {
        self.providers.get(&provider).copied()
    }

    pub fn all_reachable(&self) -> bool {
        self.providers.values().all(|reachable| *reachable)
    }

    pub fn unreachable(&self) -> Vec<ProviderId> {
        self.providers
            .iter()
            .filter(|(_, reachable)| !**reachable)
            .map(|(provider, _)| *provider)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProviderId, bool)> + '_ {
        self.providers
            .iter()
            .map(|(provider, reachable)| (*provider, *reachable))
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Runs one probe per provider in parallel.
#[derive(Clone)]
pub struct HealthReporter {
    providers: Vec<Arc<dyn MetricProvider>>,
    probe_timeout: Duration,
}

impl HealthReporter {
    pub fn new(providers: Vec<Arc<dyn MetricProvider>>, probe_timeout: Duration) -> Self {
        Self {
            providers,
            probe_timeout,
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Probes every provider. A probe that errors, times out or panics
    /// reports `false`.
    pub async fn check(&self) -> HealthSnapshot {
        let mut providers = self
            .providers
            .iter()
            .map(|provider| (provider.id(), false))
            .collect::<BTreeMap<_, _>>();

        let mut probes = JoinSet::new();
        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let timeout = self.probe_timeout;
            probes.spawn(async move {
                let id = provider.id();
                let reachable = match tokio::time::timeout(timeout, provider.probe(timeout)).await {
                    Ok(Ok(())) => true,
                    Ok(Err(error)) => {
                        debug!(provider = %id, code = error.code(), error = %error.message(), "probe failed");
                        false
                    }
                    Err(_) => {
                        debug!(provider = %id, timeout_ms = timeout.as_millis() as u64, "probe timed out");
                        false
                    }
                };
                (id, reachable)
            });
        }

        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok((id, reachable)) => {
                    providers.insert(id, reachable);
                }
                Err(error) => warn!(error = %error, "health probe task aborted"),
            }
        }

        HealthSnapshot::new(providers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{AlternativeMeAdapter, CoinGeckoAdapter, ProviderTransport};
    use crate::http_client::{HttpResponse, MockBehavior, MockHttpClient};

    fn reporter(client: Arc<MockHttpClient>, timeout: Duration) -> HealthReporter {
        let coingecko = CoinGeckoAdapter::new(
            ProviderTransport::new(ProviderId::Coingecko, "https://cg.test")
                .with_http_client(client.clone()),
        );
        let alternative = AlternativeMeAdapter::new(
            ProviderTransport::new(ProviderId::AlternativeMe, "https://fng.test")
                .with_http_client(client),
        );
        HealthReporter::new(vec![Arc::new(coingecko), Arc::new(alternative)], timeout)
    }

    #[tokio::test]
    async fn reports_each_provider_independently() {
        let client = Arc::new(
            MockHttpClient::new()
                .respond_json("/api/v3/ping", r#"{"gecko_says":"(V3) To the Moon!"}"#)
                .route(
                    "/fng/",
                    MockBehavior::Respond(HttpResponse::with_status(500, "oops")),
                ),
        );

        let health = reporter(client, Duration::from_secs(3)).check().await;

        assert_eq!(health.is_reachable(ProviderId::Coingecko), Some(true));
        assert_eq!(health.is_reachable(ProviderId::AlternativeMe), Some(false));
        assert_eq!(health.is_reachable(ProviderId::BitcoinData), None);
        assert_eq!(health.unreachable(), vec![ProviderId::AlternativeMe]);
        assert!(!health.all_reachable());
    }

    #[tokio::test]
    async fn hanging_probe_is_unreachable_after_timeout() {
        let client = Arc::new(
            MockHttpClient::new()
                .route("/api/v3/ping", MockBehavior::Hang)
                .respond_json("/fng/", r#"{"data":[]}"#),
        );

        let health = reporter(client, Duration::from_millis(50)).check().await;

        assert_eq!(health.is_reachable(ProviderId::Coingecko), Some(false));
        assert_eq!(health.is_reachable(ProviderId::AlternativeMe), Some(true));
    }

    #[test]
    fn serializes_as_flat_map() {
        let snapshot = HealthSnapshot::new(BTreeMap::from([
            (ProviderId::Coingecko, true),
            (ProviderId::BitcoinData, false),
        ]));
        let json = serde_json::to_string(&snapshot).expect("serializes");
        assert_eq!(json, r#"{"coingecko":true,"bitcoin_data":false}"#);
    }
}
