//! JSON response envelope consumed by the presentation layer.
//!
//! Success:
//!
//! ```text
//! { "success": true, "data": { "price": {..}, "dominance": n, "metrics": {..} },
//!   "meta": { "apiHealth": {..}, "sources": {..}, "degraded": b }, "timestamp": ".." }
//! ```
//!
//! Failure: `{ "success": false, "error": "..", "timestamp": ".." }`.

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::aggregator::{AttemptError, Reading, ReadingOrigin};
use crate::health::HealthSnapshot;
use crate::snapshot::MarketSnapshot;
use crate::{CoreError, ProviderId, UtcDateTime};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricsResponse {
    Success(MetricsSuccess),
    Failure(MetricsFailure),
}

impl MetricsResponse {
    pub fn from_snapshot(snapshot: &MarketSnapshot) -> Self {
        let quote = snapshot.quote();
        let sources = snapshot
            .readings()
            .iter()
            .map(|(kind, reading)| (kind.as_str().to_owned(), SourceMeta::from_reading(reading)))
            .collect();

        Self::Success(MetricsSuccess {
            success: true,
            data: BitcoinMetrics {
                price: PriceSummary {
                    price: quote.price,
                    price_change_percentage_24h: quote.change_24h_percent,
                    market_cap: quote.market_cap,
                    volume_24h: quote.volume_24h,
                    last_updated: quote.observed_at,
                },
                dominance: snapshot.dominance(),
                metrics: CycleMetrics {
                    nupl: snapshot.nupl(),
                    sopr: snapshot.sopr(),
                    mvrv: snapshot.mvrv(),
                    rainbow_band: snapshot.rainbow_band().label().to_owned(),
                    fear_greed_index: snapshot.fear_greed().value,
                },
            },
            meta: ResponseMeta {
                api_health: snapshot.health.clone(),
                sources,
                degraded: snapshot.is_degraded(),
            },
            timestamp: snapshot.generated_at,
        })
    }

    pub fn failure(error: impl Display) -> Self {
        Self::Failure(MetricsFailure {
            success: false,
            error: error.to_string(),
            timestamp: UtcDateTime::now(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, CoreError> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSuccess {
    pub success: bool,
    pub data: BitcoinMetrics,
    pub meta: ResponseMeta,
    pub timestamp: UtcDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsFailure {
    pub success: bool,
    pub error: String,
    pub timestamp: UtcDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitcoinMetrics {
    pub price: PriceSummary,
    pub dominance: f64,
    pub metrics: CycleMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSummary {
    pub price: f64,
    pub price_change_percentage_24h: f64,
    pub market_cap: f64,
    pub volume_24h: f64,
    pub last_updated: UtcDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleMetrics {
    pub nupl: f64,
    pub sopr: f64,
    pub mvrv: f64,
    pub rainbow_band: String,
    pub fear_greed_index: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    pub api_health: HealthSnapshot,
    pub sources: BTreeMap<String, SourceMeta>,
    pub degraded: bool,
}

/// Provenance of one metric in a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMeta {
    pub origin: ReadingOrigin,
    pub provider: Option<ProviderId>,
    pub degraded: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_chain: Vec<ProviderId>,
    pub latency_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<AttemptError>,
}

impl SourceMeta {
    pub fn from_reading<T>(reading: &Reading<T>) -> Self {
        Self {
            origin: reading.origin,
            provider: reading.selected_source,
            degraded: reading.is_degraded(),
            source_chain: reading.source_chain.clone(),
            latency_ms: reading.latency_ms,
            errors: reading.errors.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::synthetic_value;
    use crate::{MetricKind, MetricValue, PriceQuote, SentimentIndex};

    fn reading(data: MetricValue, origin: ReadingOrigin, source: Option<ProviderId>) -> Reading<MetricValue> {
        Reading {
            data,
            origin,
            selected_source: source,
            source_chain: source.into_iter().collect(),
            errors: Vec::new(),
            latency_ms: 12,
        }
    }

    fn snapshot() -> MarketSnapshot {
        let at = UtcDateTime::parse("2025-06-01T00:00:00Z").expect("valid timestamp");
        let quote = PriceQuote::new(108_700.0, 2.5, 2.16e12, 3.1e10, at).expect("valid quote");
        let live = Some(ProviderId::Coingecko);

        MarketSnapshot {
            price: reading(MetricValue::Price(quote), ReadingOrigin::Live, live),
            dominance: reading(MetricValue::Dominance(57.3), ReadingOrigin::Cache, live),
            fear_greed: reading(
                MetricValue::FearGreed(SentimentIndex::new(71)),
                ReadingOrigin::Live,
                Some(ProviderId::AlternativeMe),
            ),
            nupl: reading(MetricValue::Nupl(0.55), ReadingOrigin::Live, Some(ProviderId::BitcoinData)),
            sopr: reading(MetricValue::Sopr(1.01), ReadingOrigin::Live, Some(ProviderId::BitcoinData)),
            mvrv: reading(
                synthetic_value(MetricKind::Mvrv, at),
                ReadingOrigin::Synthetic,
                None,
            ),
            health: HealthSnapshot::new(BTreeMap::from([
                (ProviderId::Coingecko, true),
                (ProviderId::BitcoinData, false),
            ])),
            generated_at: at,
        }
    }

    #[test]
    fn success_uses_dashboard_field_names() {
        let response = MetricsResponse::from_snapshot(&snapshot());
        let json: serde_json::Value =
            serde_json::from_str(&response.to_json(false).expect("serializes")).expect("json");

        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["price"]["price"], 108_700.0);
        assert_eq!(json["data"]["price"]["priceChangePercentage24h"], 2.5);
        assert_eq!(json["data"]["price"]["marketCap"], 2.16e12);
        assert_eq!(json["data"]["price"]["volume24h"], 3.1e10);
        assert_eq!(json["data"]["price"]["lastUpdated"], "2025-06-01T00:00:00Z");
        assert_eq!(json["data"]["dominance"], 57.3);
        assert_eq!(json["data"]["metrics"]["fearGreedIndex"], 71);
        assert!(json["data"]["metrics"]["rainbowBand"].is_string());
        assert_eq!(json["meta"]["apiHealth"]["bitcoin_data"], false);
        assert_eq!(json["meta"]["sources"]["price"]["origin"], "live");
        assert_eq!(json["meta"]["sources"]["dominance"]["origin"], "cache");
        assert_eq!(json["meta"]["sources"]["mvrv"]["degraded"], true);
        assert_eq!(json["meta"]["sources"]["mvrv"]["provider"], serde_json::Value::Null);
        assert_eq!(json["meta"]["degraded"], true);
        assert_eq!(json["timestamp"], "2025-06-01T00:00:00Z");
    }

    #[test]
    fn failure_carries_message_only() {
        let response = MetricsResponse::failure("invalid metric 'hashrate'");
        assert!(!response.is_success());

        let json: serde_json::Value =
            serde_json::from_str(&response.to_json(false).expect("serializes")).expect("json");
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "invalid metric 'hashrate'");
        assert!(json["timestamp"].is_string());
        assert!(json.get("data").is_none());
    }

    #[test]
    fn responses_parse_back_into_the_right_variant() {
        let success = MetricsResponse::from_snapshot(&snapshot());
        let parsed: MetricsResponse =
            serde_json::from_str(&success.to_json(true).expect("serializes")).expect("parses");
        assert!(parsed.is_success());

        let failure = MetricsResponse::failure("boom");
        let parsed: MetricsResponse =
            serde_json::from_str(&failure.to_json(false).expect("serializes")).expect("parses");
        assert!(!parsed.is_success());
    }
}
