use crate::aggregator::MetricReading;
use crate::health::HealthSnapshot;
use crate::synthetic::synthetic_price;
use crate::{MetricKind, PriceQuote, RainbowBand, SentimentIndex, UtcDateTime};

/// Every dashboard metric read in one pass, plus provider reachability.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSnapshot {
    pub price: MetricReading,
    pub dominance: MetricReading,
    pub fear_greed: MetricReading,
    pub nupl: MetricReading,
    pub sopr: MetricReading,
    pub mvrv: MetricReading,
    pub health: HealthSnapshot,
    pub generated_at: UtcDateTime,
}

impl MarketSnapshot {
    pub fn quote(&self) -> PriceQuote {
        self.price
            .data
            .as_price()
            .cloned()
            .unwrap_or_else(|| synthetic_price(self.generated_at))
    }

    pub fn dominance(&self) -> f64 {
        self.dominance.data.primary()
    }

    pub fn fear_greed(&self) -> SentimentIndex {
        self.fear_greed.data.as_sentiment().unwrap_or_else(|| {
            SentimentIndex::new(self.fear_greed.data.primary().round().clamp(0.0, 100.0) as u8)
        })
    }

    pub fn nupl(&self) -> f64 {
        self.nupl.data.primary()
    }

    pub fn sopr(&self) -> f64 {
        self.sopr.data.primary()
    }

    pub fn mvrv(&self) -> f64 {
        self.mvrv.data.primary()
    }

    pub fn rainbow_band(&self) -> RainbowBand {
        RainbowBand::classify(self.quote().price, self.generated_at)
    }

    /// Readings in dashboard order.
    pub fn readings(&self) -> [(MetricKind, &MetricReading); 6] {
        [
            (MetricKind::Price, &self.price),
            (MetricKind::Dominance, &self.dominance),
            (MetricKind::FearGreed, &self.fear_greed),
            (MetricKind::Nupl, &self.nupl),
            (MetricKind::Sopr, &self.sopr),
            (MetricKind::Mvrv, &self.mvrv),
        ]
    }

    /// `true` when any metric fell back to synthetic data.
    pub fn is_degraded(&self) -> bool {
        self.readings()
            .iter()
            .any(|(_, reading)| reading.is_degraded())
    }
}
