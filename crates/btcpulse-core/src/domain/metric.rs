use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{UtcDateTime, ValidationError};

/// Named market or on-chain quantity served by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Price,
    Dominance,
    FearGreed,
    Nupl,
    Sopr,
    Mvrv,
}

impl MetricKind {
    pub const ALL: [Self; 6] = [
        Self::Price,
        Self::Dominance,
        Self::FearGreed,
        Self::Nupl,
        Self::Sopr,
        Self::Mvrv,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Dominance => "dominance",
            Self::FearGreed => "fear_greed",
            Self::Nupl => "nupl",
            Self::Sopr => "sopr",
            Self::Mvrv => "mvrv",
        }
    }

    pub const fn is_on_chain(self) -> bool {
        matches!(self, Self::Nupl | Self::Sopr | Self::Mvrv)
    }
}

impl Display for MetricKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "price" => Ok(Self::Price),
            "dominance" => Ok(Self::Dominance),
            "fear_greed" | "feargreed" | "sentiment" => Ok(Self::FearGreed),
            "nupl" => Ok(Self::Nupl),
            "sopr" => Ok(Self::Sopr),
            "mvrv" => Ok(Self::Mvrv),
            other => Err(ValidationError::UnknownMetric {
                value: other.to_owned(),
            }),
        }
    }
}

/// Normalized Bitcoin spot quote in USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub price: f64,
    pub change_24h_absolute: f64,
    pub change_24h_percent: f64,
    pub market_cap: f64,
    pub volume_24h: f64,
    pub observed_at: UtcDateTime,
}

impl PriceQuote {
    /// Builds a quote from a price and a 24h percent change, deriving the absolute change.
    pub fn new(
        price: f64,
        change_24h_percent: f64,
        market_cap: f64,
        volume_24h: f64,
        observed_at: UtcDateTime,
    ) -> Result<Self, ValidationError> {
        validate_positive("price", price)?;
        validate_finite("change_24h_percent", change_24h_percent)?;
        validate_non_negative("market_cap", market_cap)?;
        validate_non_negative("volume_24h", volume_24h)?;

        let previous = price / (1.0 + change_24h_percent / 100.0);
        let change_24h_absolute = if previous.is_finite() {
            price - previous
        } else {
            0.0
        };

        Ok(Self {
            price,
            change_24h_absolute,
            change_24h_percent,
            market_cap,
            volume_24h,
            observed_at,
        })
    }
}

/// Fear & Greed classification bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentClass {
    #[serde(rename = "Extreme Fear")]
    ExtremeFear,
    Fear,
    Neutral,
    Greed,
    #[serde(rename = "Extreme Greed")]
    ExtremeGreed,
}

impl SentimentClass {
    pub const fn from_value(value: u8) -> Self {
        match value {
            0..=24 => Self::ExtremeFear,
            25..=44 => Self::Fear,
            45..=55 => Self::Neutral,
            56..=75 => Self::Greed,
            _ => Self::ExtremeGreed,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExtremeFear => "Extreme Fear",
            Self::Fear => "Fear",
            Self::Neutral => "Neutral",
            Self::Greed => "Greed",
            Self::ExtremeGreed => "Extreme Greed",
        }
    }

    /// Maps a provider label onto a bucket; unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "extreme fear" => Some(Self::ExtremeFear),
            "fear" => Some(Self::Fear),
            "neutral" => Some(Self::Neutral),
            "greed" => Some(Self::Greed),
            "extreme greed" => Some(Self::ExtremeGreed),
            _ => None,
        }
    }
}

/// Fear & Greed index reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentIndex {
    pub value: u8,
    pub classification: SentimentClass,
}

impl SentimentIndex {
    pub const fn new(value: u8) -> Self {
        Self {
            value,
            classification: SentimentClass::from_value(value),
        }
    }

    pub fn with_label(value: u8, label: Option<&str>) -> Self {
        let classification = label
            .and_then(SentimentClass::from_label)
            .unwrap_or_else(|| SentimentClass::from_value(value));
        Self {
            value,
            classification,
        }
    }
}

/// Value produced by a provider adapter, tagged with the metric it answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "metric", content = "value", rename_all = "snake_case")]
pub enum MetricValue {
    Price(PriceQuote),
    Dominance(f64),
    FearGreed(SentimentIndex),
    Nupl(f64),
    Sopr(f64),
    Mvrv(f64),
}

impl MetricValue {
    pub const fn kind(&self) -> MetricKind {
        match self {
            Self::Price(_) => MetricKind::Price,
            Self::Dominance(_) => MetricKind::Dominance,
            Self::FearGreed(_) => MetricKind::FearGreed,
            Self::Nupl(_) => MetricKind::Nupl,
            Self::Sopr(_) => MetricKind::Sopr,
            Self::Mvrv(_) => MetricKind::Mvrv,
        }
    }

    /// The scalar checked against plausibility bounds.
    pub fn primary(&self) -> f64 {
        match self {
            Self::Price(quote) => quote.price,
            Self::FearGreed(index) => f64::from(index.value),
            Self::Dominance(value) | Self::Nupl(value) | Self::Sopr(value) | Self::Mvrv(value) => {
                *value
            }
        }
    }

    pub fn as_price(&self) -> Option<&PriceQuote> {
        match self {
            Self::Price(quote) => Some(quote),
            _ => None,
        }
    }

    pub fn as_sentiment(&self) -> Option<SentimentIndex> {
        match self {
            Self::FearGreed(index) => Some(*index),
            _ => None,
        }
    }
}

/// Single daily close in a price history series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: UtcDateTime,
    pub price: f64,
}

fn validate_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    Ok(())
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    validate_finite(field, value)?;
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

fn validate_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    validate_finite(field, value)?;
    if value <= 0.0 {
        return Err(ValidationError::NonPositiveValue { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_metric_aliases() {
        assert_eq!("fear-greed".parse::<MetricKind>(), Ok(MetricKind::FearGreed));
        assert_eq!(" MVRV ".parse::<MetricKind>(), Ok(MetricKind::Mvrv));
        assert!(matches!(
            "hashrate".parse::<MetricKind>(),
            Err(ValidationError::UnknownMetric { .. })
        ));
    }

    #[test]
    fn quote_derives_absolute_change() {
        let quote = PriceQuote::new(110_000.0, 10.0, 2.0e12, 3.0e10, UtcDateTime::now())
            .expect("valid quote");
        assert!((quote.change_24h_absolute - 10_000.0).abs() < 1e-6);
    }

    #[test]
    fn quote_rejects_negative_volume() {
        let err = PriceQuote::new(110_000.0, 0.0, 2.0e12, -1.0, UtcDateTime::now())
            .expect_err("negative volume");
        assert_eq!(err, ValidationError::NegativeValue { field: "volume_24h" });
    }

    #[test]
    fn quote_rejects_zero_and_negative_price() {
        for price in [0.0, -108_700.0] {
            let err = PriceQuote::new(price, 1.0, 2.0e12, 3.0e10, UtcDateTime::now())
                .expect_err("non-positive price");
            assert_eq!(err, ValidationError::NonPositiveValue { field: "price" });
        }
    }

    #[test]
    fn sentiment_buckets_follow_index_ranges() {
        assert_eq!(SentimentIndex::new(10).classification, SentimentClass::ExtremeFear);
        assert_eq!(SentimentIndex::new(44).classification, SentimentClass::Fear);
        assert_eq!(SentimentIndex::new(50).classification, SentimentClass::Neutral);
        assert_eq!(SentimentIndex::new(70).classification, SentimentClass::Greed);
        assert_eq!(SentimentIndex::new(90).classification, SentimentClass::ExtremeGreed);
    }

    #[test]
    fn provider_label_wins_over_derived_bucket() {
        let index = SentimentIndex::with_label(55, Some("Greed"));
        assert_eq!(index.classification, SentimentClass::Greed);

        let fallback = SentimentIndex::with_label(55, Some("???"));
        assert_eq!(fallback.classification, SentimentClass::Neutral);
    }
}
