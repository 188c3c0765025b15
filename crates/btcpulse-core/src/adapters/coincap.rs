use std::time::Duration;

use serde::Deserialize;

use super::{required, Numeric, ProviderTransport};
use crate::data_source::{
    CapabilitySet, HistoryRequest, MetricProvider, SourceError, SourceFuture,
};
use crate::{MetricKind, MetricValue, PricePoint, PriceQuote, ProviderId, UtcDateTime};

const ASSET_PATH: &str = "/v2/assets/bitcoin";
const PING_PATH: &str = "/v2/assets?limit=1";

/// CoinCap v2 adapter. Every numeric field arrives as a JSON string.
#[derive(Clone)]
pub struct CoinCapAdapter {
    transport: ProviderTransport,
}

impl Default for CoinCapAdapter {
    fn default() -> Self {
        Self::new(ProviderTransport::for_provider(ProviderId::Coincap))
    }
}

impl CoinCapAdapter {
    pub fn new(transport: ProviderTransport) -> Self {
        Self { transport }
    }

    async fn fetch_price(&self) -> Result<MetricValue, SourceError> {
        let response: AssetResponse = self.transport.get_json(ASSET_PATH).await?;
        let asset = response
            .data
            .ok_or_else(|| SourceError::malformed("coincap response missing 'data'"))?;

        let provider = ProviderId::Coincap;
        let observed_at = response
            .timestamp
            .and_then(|millis| UtcDateTime::from_unix_millis(millis).ok())
            .unwrap_or_else(UtcDateTime::now);

        PriceQuote::new(
            required(provider, "priceUsd", asset.price_usd.as_ref())?,
            asset.change_percent_24_hr.as_ref().and_then(Numeric::to_f64).unwrap_or(0.0),
            asset.market_cap_usd.as_ref().and_then(Numeric::to_f64).unwrap_or(0.0),
            asset.volume_usd_24_hr.as_ref().and_then(Numeric::to_f64).unwrap_or(0.0),
            observed_at,
        )
        .map(MetricValue::Price)
        .map_err(|e| SourceError::malformed(format!("coincap price: {e}")))
    }

    async fn fetch_history(&self, req: HistoryRequest) -> Result<Vec<PricePoint>, SourceError> {
        let end = UtcDateTime::now();
        let start = end.saturating_sub_days(req.days());
        let path = format!(
            "{ASSET_PATH}/history?interval=d1&start={}&end={}",
            start.unix_seconds() * 1_000,
            end.unix_seconds() * 1_000
        );

        let response: HistoryResponse = self.transport.get_json(&path).await?;
        let rows = response
            .data
            .ok_or_else(|| SourceError::malformed("coincap response missing 'data'"))?;

        rows.into_iter()
            .map(|row| {
                let price = required(ProviderId::Coincap, "priceUsd", row.price_usd.as_ref())?;
                let timestamp = row
                    .time
                    .ok_or_else(|| SourceError::malformed("coincap history row missing 'time'"))
                    .and_then(|millis| {
                        UtcDateTime::from_unix_millis(millis)
                            .map_err(|e| SourceError::malformed(e.to_string()))
                    })?;
                Ok(PricePoint { timestamp, price })
            })
            .collect()
    }
}

impl MetricProvider for CoinCapAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Coincap
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::none().with_price().with_history()
    }

    fn fetch<'a>(&'a self, metric: MetricKind) -> SourceFuture<'a, MetricValue> {
        Box::pin(async move {
            match metric {
                MetricKind::Price => self.fetch_price().await,
                other => Err(SourceError::unsupported_metric(other)),
            }
        })
    }

    fn history<'a>(&'a self, req: HistoryRequest) -> SourceFuture<'a, Vec<PricePoint>> {
        Box::pin(self.fetch_history(req))
    }

    fn probe<'a>(&'a self, timeout: Duration) -> SourceFuture<'a, ()> {
        Box::pin(self.transport.probe(PING_PATH, timeout))
    }
}

#[derive(Debug, Deserialize)]
struct AssetResponse {
    data: Option<Asset>,
    timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Asset {
    price_usd: Option<Numeric>,
    change_percent_24_hr: Option<Numeric>,
    market_cap_usd: Option<Numeric>,
    volume_usd_24_hr: Option<Numeric>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    data: Option<Vec<HistoryRow>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryRow {
    price_usd: Option<Numeric>,
    time: Option<i64>,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::data_source::SourceErrorKind;
    use crate::http_client::{HttpResponse, MockBehavior, MockHttpClient};

    fn adapter(client: MockHttpClient) -> CoinCapAdapter {
        CoinCapAdapter::new(
            ProviderTransport::new(ProviderId::Coincap, "https://cc.test")
                .with_http_client(Arc::new(client)),
        )
    }

    #[tokio::test]
    async fn parses_string_encoded_asset() {
        let adapter = adapter(MockHttpClient::new().respond_json(
            "/v2/assets/bitcoin",
            r#"{"data":{"id":"bitcoin","priceUsd":"108700.1234","changePercent24Hr":"-1.5",
                "marketCapUsd":"2160000000000","volumeUsd24Hr":"31000000000"},
                "timestamp":1748736000000}"#,
        ));

        let value = adapter.fetch(MetricKind::Price).await.expect("price");
        let quote = value.as_price().expect("price variant");
        assert!((quote.price - 108_700.1234).abs() < 1e-9);
        assert_eq!(quote.change_24h_percent, -1.5);
        assert!(quote.change_24h_absolute < 0.0);
        assert_eq!(quote.observed_at.unix_seconds(), 1_748_736_000);
    }

    #[tokio::test]
    async fn server_error_is_http_status() {
        let adapter = adapter(MockHttpClient::new().route(
            "/v2/assets/bitcoin",
            MockBehavior::Respond(HttpResponse::with_status(502, "bad gateway")),
        ));
        let err = adapter.fetch(MetricKind::Price).await.expect_err("502");
        assert_eq!(err.kind(), SourceErrorKind::HttpStatus);
        assert_eq!(err.status(), Some(502));
    }

    #[tokio::test]
    async fn parses_history_rows() {
        let adapter = adapter(MockHttpClient::new().respond_json(
            "/history",
            r#"{"data":[{"priceUsd":"104000.5","time":1748649600000},
                        {"priceUsd":"105200","time":1748736000000}]}"#,
        ));
        let points = adapter
            .history(HistoryRequest::new(2).expect("valid days"))
            .await
            .expect("history");
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].price, 104_000.5);
    }
}
