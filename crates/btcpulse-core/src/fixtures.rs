//! Canned upstream payloads for offline runs.
//!
//! Backs [`crate::MetricsAggregatorBuilder::with_mock_mode`]: every provider
//! endpoint answers with a realistic, plausible body so the full adapter and
//! validation path runs without network access.

use crate::http_client::MockHttpClient;

const COINGECKO_PRICE: &str = r#"{"bitcoin":{"usd":108712.0,"usd_market_cap":2157000000000.0,
"usd_24h_vol":31250000000.0,"usd_24h_change":1.84,"last_updated_at":1748736000}}"#;

const COINGECKO_GLOBAL: &str =
    r#"{"data":{"market_cap_percentage":{"btc":57.62,"eth":9.14,"usdt":4.41}}}"#;

const COINGECKO_MARKET_CHART: &str = r#"{"prices":[
[1748217600000,106120.4],[1748304000000,107455.9],[1748390400000,107801.2],
[1748476800000,105630.7],[1748563200000,105980.3],[1748649600000,104003.5],
[1748736000000,108712.0]]}"#;

const COINGECKO_PING: &str = r#"{"gecko_says":"(V3) To the Moon!"}"#;

const COINCAP_HISTORY: &str = r#"{"data":[
{"priceUsd":"106118.93","time":1748217600000},{"priceUsd":"107460.11","time":1748304000000},
{"priceUsd":"107795.48","time":1748390400000},{"priceUsd":"105627.02","time":1748476800000},
{"priceUsd":"105984.66","time":1748563200000},{"priceUsd":"104010.27","time":1748649600000},
{"priceUsd":"108698.40","time":1748736000000}]}"#;

const COINCAP_ASSET: &str = r#"{"data":{"id":"bitcoin","symbol":"BTC","priceUsd":"108698.4012",
"changePercent24Hr":"1.79","marketCapUsd":"2156700000000","volumeUsd24Hr":"30980000000"},
"timestamp":1748736000000}"#;

const COINCAP_ASSETS: &str = r#"{"data":[{"id":"bitcoin","rank":"1"}],"timestamp":1748736000000}"#;

const COINPAPRIKA_TICKER: &str = r#"{"id":"btc-bitcoin","symbol":"BTC","last_updated":"2025-06-01T00:00:00Z",
"quotes":{"USD":{"price":108655.3,"volume_24h":29800000000.0,"market_cap":2155900000000.0,
"percent_change_24h":1.77}}}"#;

const COINPAPRIKA_GLOBAL: &str =
    r#"{"market_cap_usd":3741000000000,"bitcoin_dominance_percentage":57.58}"#;

const ALTERNATIVE_FNG: &str = r#"{"name":"Fear and Greed Index","data":[{"value":"71",
"value_classification":"Greed","timestamp":"1748736000"}]}"#;

const BITCOIN_DATA_NUPL: &str = r#"{"d":"2025-06-01","unixTs":"1748736000","nupl":"0.5471"}"#;
const BITCOIN_DATA_SOPR: &str = r#"{"d":"2025-06-01","unixTs":"1748736000","sopr":"1.0128"}"#;
const BITCOIN_DATA_MVRV: &str = r#"{"d":"2025-06-01","unixTs":"1748736000","mvrv":"2.3314"}"#;

/// Mock transport answering every provider endpoint with a canned body.
///
/// More specific paths are registered first since routes match by substring
/// in registration order.
pub fn canned_http_client() -> MockHttpClient {
    MockHttpClient::new()
        .respond_json("/api/v3/simple/price", COINGECKO_PRICE)
        .respond_json("/api/v3/global", COINGECKO_GLOBAL)
        .respond_json("/api/v3/coins/bitcoin/market_chart", COINGECKO_MARKET_CHART)
        .respond_json("/api/v3/ping", COINGECKO_PING)
        .respond_json("/v2/assets/bitcoin/history", COINCAP_HISTORY)
        .respond_json("/v2/assets/bitcoin", COINCAP_ASSET)
        .respond_json("/v2/assets?limit=1", COINCAP_ASSETS)
        .respond_json("/v1/tickers/btc-bitcoin", COINPAPRIKA_TICKER)
        .respond_json("/v1/global", COINPAPRIKA_GLOBAL)
        .respond_json("/fng/", ALTERNATIVE_FNG)
        .respond_json("/v1/nupl/last", BITCOIN_DATA_NUPL)
        .respond_json("/v1/sopr/last", BITCOIN_DATA_SOPR)
        .respond_json("/v1/mvrv/last", BITCOIN_DATA_MVRV)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{HttpClient, HttpRequest};

    #[tokio::test]
    async fn history_route_wins_over_asset_route() {
        let client = canned_http_client();
        let response = client
            .execute(HttpRequest::get(
                "https://api.coincap.io/v2/assets/bitcoin/history?interval=d1&start=0&end=1",
            ))
            .await
            .expect("canned");

        assert!(response.body.contains("\"time\""));
        assert_eq!(client.calls("/v2/assets/bitcoin/history"), 1);
        assert_eq!(client.calls("/v2/assets/bitcoin"), 0);
    }

    #[test]
    fn every_body_is_valid_json() {
        for body in [
            COINGECKO_PRICE,
            COINGECKO_GLOBAL,
            COINGECKO_MARKET_CHART,
            COINGECKO_PING,
            COINCAP_HISTORY,
            COINCAP_ASSET,
            COINCAP_ASSETS,
            COINPAPRIKA_TICKER,
            COINPAPRIKA_GLOBAL,
            ALTERNATIVE_FNG,
            BITCOIN_DATA_NUPL,
            BITCOIN_DATA_SOPR,
            BITCOIN_DATA_MVRV,
        ] {
            serde_json::from_str::<serde_json::Value>(body).expect("fixture parses");
        }
    }
}
