use std::time::Duration;

use serde::Deserialize;

use super::{dominance_percent, required, Numeric, ProviderTransport};
use crate::data_source::{
    CapabilitySet, HistoryRequest, MetricProvider, SourceError, SourceFuture,
};
use crate::{MetricKind, MetricValue, PricePoint, PriceQuote, ProviderId, UtcDateTime};

const PRICE_PATH: &str = "/api/v3/simple/price?ids=bitcoin&vs_currencies=usd\
&include_market_cap=true&include_24hr_vol=true&include_24hr_change=true&include_last_updated_at=true";
const GLOBAL_PATH: &str = "/api/v3/global";
const PING_PATH: &str = "/api/v3/ping";

/// CoinGecko public API adapter: price, dominance and daily price history.
#[derive(Clone)]
pub struct CoinGeckoAdapter {
    transport: ProviderTransport,
}

impl Default for CoinGeckoAdapter {
    fn default() -> Self {
        Self::new(ProviderTransport::for_provider(ProviderId::Coingecko))
    }
}

impl CoinGeckoAdapter {
    pub fn new(transport: ProviderTransport) -> Self {
        Self { transport }
    }

    async fn fetch_price(&self) -> Result<MetricValue, SourceError> {
        let response: SimplePriceResponse = self.transport.get_json(PRICE_PATH).await?;
        let ticker = response
            .bitcoin
            .ok_or_else(|| SourceError::malformed("coingecko response missing 'bitcoin'"))?;

        let provider = ProviderId::Coingecko;
        let price = required(provider, "usd", ticker.usd.as_ref())?;
        let observed_at = ticker
            .last_updated_at
            .and_then(|seconds| UtcDateTime::from_unix_seconds(seconds).ok())
            .unwrap_or_else(UtcDateTime::now);

        PriceQuote::new(
            price,
            ticker.usd_24h_change.as_ref().and_then(Numeric::to_f64).unwrap_or(0.0),
            ticker.usd_market_cap.as_ref().and_then(Numeric::to_f64).unwrap_or(0.0),
            ticker.usd_24h_vol.as_ref().and_then(Numeric::to_f64).unwrap_or(0.0),
            observed_at,
        )
        .map(MetricValue::Price)
        .map_err(|e| SourceError::malformed(format!("coingecko price: {e}")))
    }

    async fn fetch_dominance(&self) -> Result<MetricValue, SourceError> {
        let response: GlobalResponse = self.transport.get_json(GLOBAL_PATH).await?;
        let btc = response
            .data
            .and_then(|data| data.market_cap_percentage)
            .and_then(|shares| shares.btc);
        let raw = required(ProviderId::Coingecko, "market_cap_percentage.btc", btc.as_ref())?;
        Ok(MetricValue::Dominance(dominance_percent(raw)))
    }

    async fn fetch_history(&self, req: HistoryRequest) -> Result<Vec<PricePoint>, SourceError> {
        let path = format!(
            "/api/v3/coins/bitcoin/market_chart?vs_currency=usd&days={}&interval=daily",
            req.days()
        );
        let response: MarketChartResponse = self.transport.get_json(&path).await?;
        let prices = response
            .prices
            .ok_or_else(|| SourceError::malformed("coingecko response missing 'prices'"))?;

        prices
            .into_iter()
            .map(|(millis, price)| {
                let timestamp = UtcDateTime::from_unix_millis(millis as i64)
                    .map_err(|e| SourceError::malformed(e.to_string()))?;
                Ok(PricePoint { timestamp, price })
            })
            .collect()
    }
}

impl MetricProvider for CoinGeckoAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Coingecko
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::none()
            .with_price()
            .with_dominance()
            .with_history()
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

    fn history<'a>(&'a self, req: HistoryRequest) -> SourceFuture<'a, Vec<PricePoint>> {
        Box::pin(self.fetch_history(req))
    }

    fn probe<'a>(&'a self, timeout: Duration) -> SourceFuture<'a, ()> {
        Box::pin(self.transport.probe(PING_PATH, timeout))
    }
}

#[derive(Debug, Deserialize)]
struct SimplePriceResponse {
    bitcoin: Option<SimplePriceTicker>,
}

#[derive(Debug, Deserialize)]
struct SimplePriceTicker {
    usd: Option<Numeric>,
    usd_market_cap: Option<Numeric>,
    usd_24h_vol: Option<Numeric>,
    usd_24h_change: Option<Numeric>,
    last_updated_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct GlobalResponse {
    data: Option<GlobalData>,
}

#[derive(Debug, Deserialize)]
struct GlobalData {
    market_cap_percentage: Option<MarketCapShares>,
}

#[derive(Debug, Deserialize)]
struct MarketCapShares {
    btc: Option<Numeric>,
}

#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    prices: Option<Vec<(f64, f64)>>,
}
