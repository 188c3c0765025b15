use std::time::Duration;

use serde::Deserialize;

use super::{dominance_percent, required, Numeric, ProviderTransport};
use crate::data_source::{CapabilitySet, MetricProvider, SourceError, SourceFuture};
use crate::{MetricKind, MetricValue, PriceQuote, ProviderId, UtcDateTime};

const TICKER_PATH: &str = "/v1/tickers/btc-bitcoin";
const GLOBAL_PATH: &str = "/v1/global";

/// CoinPaprika adapter: price ticker and global dominance.
#[derive(Clone)]
pub struct CoinPaprikaAdapter {
    transport: ProviderTransport,
}

impl Default for CoinPaprikaAdapter {
    fn default() -> Self {
        Self::new(ProviderTransport::for_provider(ProviderId::Coinpaprika))
    }
}

impl CoinPaprikaAdapter {
    pub fn new(transport: ProviderTransport) -> Self {
        Self { transport }
    }

    async fn fetch_price(&self) -> Result<MetricValue, SourceError> {
        let response: TickerResponse = self.transport.get_json(TICKER_PATH).await?;
        let usd = response
            .quotes
            .and_then(|quotes| quotes.usd)
            .ok_or_else(|| SourceError::malformed("coinpaprika response missing 'quotes.USD'"))?;

        let observed_at = response
            .last_updated
            .as_deref()
            .and_then(|raw| UtcDateTime::parse(raw).ok())
            .unwrap_or_else(UtcDateTime::now);

        PriceQuote::new(
            required(ProviderId::Coinpaprika, "price", usd.price.as_ref())?,
            usd.percent_change_24h.as_ref().and_then(Numeric::to_f64).unwrap_or(0.0),
            usd.market_cap.as_ref().and_then(Numeric::to_f64).unwrap_or(0.0),
            usd.volume_24h.as_ref().and_then(Numeric::to_f64).unwrap_or(0.0),
            observed_at,
        )
        .map(MetricValue::Price)
        .map_err(|e| SourceError::malformed(format!("coinpaprika price: {e}")))
    }

    async fn fetch_dominance(&self) -> Result<MetricValue, SourceError> {
        let response: GlobalResponse = self.transport.get_json(GLOBAL_PATH).await?;
        let raw = required(
            ProviderId::Coinpaprika,
            "bitcoin_dominance_percentage",
            response.bitcoin_dominance_percentage.as_ref(),
        )?;
        Ok(MetricValue::Dominance(dominance_percent(raw)))
    }
}

impl MetricProvider for CoinPaprikaAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Coinpaprika
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::none().with_price().with_dominance()
    }

    fn fetch<'a>(&'a self, metric: MetricKind) -> SourceFuture<'a, MetricValue> {
        Box::pin(async move {
            match metric {
                MetricKind::Price => self.fetch_price().await,
                MetricKind::Dominance => self.fetch_dominance().await,
                other => Err(SourceError::unsupported_metric(other)),
            }
        })
    }

    fn probe<'a>(&'a self, timeout: Duration) -> SourceFuture<'a, ()> {
        Box::pin(self.transport.probe(GLOBAL_PATH, timeout))
    }
}

#[derive(Debug, Deserialize)]
struct TickerResponse {
    quotes: Option<TickerQuotes>,
    last_updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TickerQuotes {
    #[serde(rename = "USD")]
    usd: Option<UsdQuote>,
}

#[derive(Debug, Deserialize)]
struct UsdQuote {
    price: Option<Numeric>,
    volume_24h: Option<Numeric>,
    market_cap: Option<Numeric>,
    percent_change_24h: Option<Numeric>,
}

#[derive(Debug, Deserialize)]
struct GlobalResponse {
    bitcoin_dominance_percentage: Option<Numeric>,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::http_client::MockHttpClient;

    fn adapter(client: MockHttpClient) -> CoinPaprikaAdapter {
        CoinPaprikaAdapter::new(
            ProviderTransport::new(ProviderId::Coinpaprika, "https://cp.test")
                .with_http_client(Arc::new(client)),
        )
    }

    #[tokio::test]
    async fn parses_ticker_quote() {
        let adapter = adapter(MockHttpClient::new().respond_json(
            "/v1/tickers/btc-bitcoin",
            r#"{"id":"btc-bitcoin","last_updated":"2025-06-01T00:00:00Z",
                "quotes":{"USD":{"price":108650.2,"volume_24h":2.9e10,"market_cap":2.15e12,
                "percent_change_24h":0.8}}}"#,
        ));

        let value = adapter.fetch(MetricKind::Price).await.expect("price");
        let quote = value.as_price().expect("price variant");
        assert_eq!(quote.price, 108_650.2);
        assert_eq!(quote.observed_at.format_rfc3339(), "2025-06-01T00:00:00Z");
    }

    #[tokio::test]
    async fn parses_global_dominance() {
        let adapter = adapter(
            MockHttpClient::new().respond_json("/v1/global", r#"{"bitcoin_dominance_percentage":61.4}"#),
        );
        let value = adapter.fetch(MetricKind::Dominance).await.expect("dominance");
        assert_eq!(value, MetricValue::Dominance(61.4));
    }
}
