//! Provider adapters.
//!
//! | Adapter | Metrics |
//! |---------|---------|
//! | [`CoinGeckoAdapter`] | price, dominance, price history |
//! | [`CoinCapAdapter`] | price, price history |
//! | [`CoinPaprikaAdapter`] | price, dominance |
//! | [`AlternativeMeAdapter`] | fear & greed |
//! | [`BitcoinDataAdapter`] | NUPL, SOPR, MVRV |

mod alternative_me;
mod bitcoin_data;
mod coincap;
mod coingecko;
mod coinpaprika;

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::data_source::{expect_success, MetricProvider, SourceError};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::provider_policy::ProviderPolicy;
use crate::throttling::QuotaGuard;
use crate::ProviderId;

pub use alternative_me::AlternativeMeAdapter;
pub use bitcoin_data::BitcoinDataAdapter;
pub use coincap::CoinCapAdapter;
pub use coingecko::CoinGeckoAdapter;
pub use coinpaprika::CoinPaprikaAdapter;

/// Outbound request plumbing shared by every adapter: transport, base URL,
/// per-call timeout and upstream quota.
#[derive(Clone)]
pub struct ProviderTransport {
    provider: ProviderId,
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout: Duration,
    quota: QuotaGuard,
}

impl ProviderTransport {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(provider: ProviderId, base_url: impl Into<String>) -> Self {
        Self {
            provider,
            http_client: Arc::new(ReqwestHttpClient::new()),
            base_url: base_url.into(),
            timeout: Self::DEFAULT_TIMEOUT,
            quota: QuotaGuard::from_policy(&ProviderPolicy::default_for(provider)),
        }
    }

    /// Transport pointed at the provider's public API.
    pub fn for_provider(provider: ProviderId) -> Self {
        Self::new(provider, default_base_url(provider))
    }

    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = http_client;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_policy(mut self, policy: &ProviderPolicy) -> Self {
        self.quota = QuotaGuard::from_policy(policy);
        self
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Issues one quota-guarded GET and decodes the JSON body into `T`.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, SourceError> {
        if let Err(retry_in) = self.quota.acquire() {
            return Err(SourceError::rate_limited(format!(
                "{} request budget exhausted; retry in {:.2}s",
                self.provider,
                retry_in.as_secs_f64()
            )));
        }

        let request = HttpRequest::get(self.url(path)).with_timeout(self.timeout);
        let response = expect_success(self.http_client.execute(request).await)?;

        serde_json::from_str(&response.body).map_err(|e| {
            SourceError::malformed(format!("failed to parse {} response: {e}", self.provider))
        })
    }

    /// Reachability check: any 2xx answer within `timeout` counts as reachable.
    pub(crate) async fn probe(&self, path: &str, timeout: Duration) -> Result<(), SourceError> {
        let request = HttpRequest::get(self.url(path)).with_timeout(timeout);
        expect_success(self.http_client.execute(request).await).map(|_| ())
    }
}

/// Public API root for each provider.
pub fn default_base_url(provider: ProviderId) -> &'static str {
    match provider {
        ProviderId::Coingecko => "https://api.coingecko.com",
        ProviderId::Coincap => "https://api.coincap.io",
        ProviderId::Coinpaprika => "https://api.coinpaprika.com",
        ProviderId::AlternativeMe => "https://api.alternative.me",
        ProviderId::BitcoinData => "https://bitcoin-data.com",
    }
}

/// Builds the adapter matching the transport's provider.
pub fn adapter_for(transport: ProviderTransport) -> Arc<dyn MetricProvider> {
    match transport.provider() {
        ProviderId::Coingecko => Arc::new(CoinGeckoAdapter::new(transport)),
        ProviderId::Coincap => Arc::new(CoinCapAdapter::new(transport)),
        ProviderId::Coinpaprika => Arc::new(CoinPaprikaAdapter::new(transport)),
        ProviderId::AlternativeMe => Arc::new(AlternativeMeAdapter::new(transport)),
        ProviderId::BitcoinData => Arc::new(BitcoinDataAdapter::new(transport)),
    }
}

/// JSON number that some providers encode as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    pub(crate) fn to_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => text.trim().parse::<f64>().ok(),
        };
        value.filter(|value| value.is_finite())
    }
}

/// Reads a required numeric field, failing as malformed when absent or unparsable.
pub(crate) fn required(
    provider: ProviderId,
    field: &'static str,
    value: Option<&Numeric>,
) -> Result<f64, SourceError> {
    value
        .and_then(Numeric::to_f64)
        .ok_or_else(|| SourceError::malformed(format!("{provider} response missing '{field}'")))
}

/// Dominance is canonical as a percentage; providers reporting a 0..1 ratio are scaled.
pub(crate) fn dominance_percent(raw: f64) -> f64 {
    if raw > 0.0 && raw <= 1.0 {
        raw * 100.0
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_accepts_numbers_and_numeric_strings() {
        let parsed: Vec<Numeric> =
            serde_json::from_str(r#"[1.5, "2.25", " 3 ", "abc", "NaN"]"#).expect("valid json");
        let values = parsed.iter().map(Numeric::to_f64).collect::<Vec<_>>();
        assert_eq!(values, vec![Some(1.5), Some(2.25), Some(3.0), None, None]);
    }

    #[test]
    fn missing_required_field_is_malformed() {
        let err = required(ProviderId::Coincap, "priceUsd", None).expect_err("missing");
        assert_eq!(err.code(), "source.malformed");
        assert!(err.message().contains("priceUsd"));
    }

    #[test]
    fn dominance_ratio_is_scaled_to_percent() {
        assert!((dominance_percent(0.573) - 57.3).abs() < 1e-9);
        assert_eq!(dominance_percent(57.3), 57.3);
        assert_eq!(dominance_percent(150.0), 150.0);
    }

    #[test]
    fn adapter_for_keeps_transport_provider() {
        for provider in ProviderId::ALL {
            let adapter = adapter_for(ProviderTransport::for_provider(provider));
            assert_eq!(adapter.id(), provider);
        }
    }

    #[test]
    fn url_joins_without_double_slash() {
        let transport = ProviderTransport::new(ProviderId::Coingecko, "https://api.test/");
        assert_eq!(transport.url("/api/v3/ping"), "https://api.test/api/v3/ping");
    }
}
