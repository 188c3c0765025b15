//! Plausibility bounds, defined once per metric.
//!
//! Every value that reaches the cache passes through [`validate`], whichever
//! provider produced it.

use crate::{MetricKind, MetricValue, PricePoint, ValidationError};

/// Closed or open numeric range a metric must fall in to be accepted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlausibilityBounds {
    pub min: f64,
    pub max: f64,
    pub inclusive: bool,
}

impl PlausibilityBounds {
    const fn open(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            inclusive: false,
        }
    }

    const fn closed(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            inclusive: true,
        }
    }

    pub const fn for_metric(kind: MetricKind) -> Self {
        match kind {
            MetricKind::Price => Self::closed(30_000.0, 300_000.0),
            MetricKind::Dominance => Self::open(20.0, 90.0),
            MetricKind::FearGreed => Self::closed(0.0, 100.0),
            MetricKind::Nupl => Self::closed(-1.0, 1.0),
            MetricKind::Sopr => Self::open(0.0, 10.0),
            MetricKind::Mvrv => Self::open(0.0, 20.0),
        }
    }

    pub fn contains(self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        if self.inclusive {
            value >= self.min && value <= self.max
        } else {
            value > self.min && value < self.max
        }
    }

    pub const fn midpoint(self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// Rejects values outside the metric's plausibility bounds.
pub fn validate(value: &MetricValue) -> Result<(), ValidationError> {
    let kind = value.kind();
    check(kind, value.primary())
}

/// Rejects a history series if any point is implausible.
pub fn validate_history(points: &[PricePoint]) -> Result<(), ValidationError> {
    points
        .iter()
        .try_for_each(|point| check(MetricKind::Price, point.price))
}

fn check(kind: MetricKind, value: f64) -> Result<(), ValidationError> {
    let bounds = PlausibilityBounds::for_metric(kind);
    if bounds.contains(value) {
        return Ok(());
    }

    Err(ValidationError::Implausible {
        metric: kind.as_str(),
        value,
        min: bounds.min,
        max: bounds.max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PriceQuote, SentimentIndex, UtcDateTime};

    fn quote(price: f64) -> MetricValue {
        MetricValue::Price(
            PriceQuote::new(price, 1.5, 2.1e12, 4.0e10, UtcDateTime::now()).expect("valid quote"),
        )
    }

    #[test]
    fn accepts_plausible_price() {
        assert!(validate(&quote(108_700.0)).is_ok());
    }

    #[test]
    fn rejects_price_off_by_unit_confusion() {
        let err = validate(&quote(50_000_000.0)).expect_err("implausible");
        assert!(matches!(err, ValidationError::Implausible { metric: "price", .. }));
    }

    #[test]
    fn dominance_band_is_exclusive() {
        assert!(validate(&MetricValue::Dominance(150.0)).is_err());
        assert!(validate(&MetricValue::Dominance(90.0)).is_err());
        assert!(validate(&MetricValue::Dominance(20.0)).is_err());
        assert!(validate(&MetricValue::Dominance(58.3)).is_ok());
    }

    #[test]
    fn on_chain_ranges() {
        assert!(validate(&MetricValue::Nupl(-1.0)).is_ok());
        assert!(validate(&MetricValue::Nupl(1.2)).is_err());
        assert!(validate(&MetricValue::Sopr(0.0)).is_err());
        assert!(validate(&MetricValue::Sopr(1.02)).is_ok());
        assert!(validate(&MetricValue::Mvrv(25.0)).is_err());
        assert!(validate(&MetricValue::Mvrv(f64::NAN)).is_err());
    }

    #[test]
    fn sentiment_edges_are_inclusive() {
        assert!(validate(&MetricValue::FearGreed(SentimentIndex::new(0))).is_ok());
        assert!(validate(&MetricValue::FearGreed(SentimentIndex::new(100))).is_ok());
        assert!(validate(&MetricValue::FearGreed(SentimentIndex::new(101))).is_err());
    }

    #[test]
    fn history_rejects_single_bad_point() {
        let ts = UtcDateTime::now();
        let points = vec![
            PricePoint { timestamp: ts, price: 100_000.0 },
            PricePoint { timestamp: ts, price: 1.0 },
        ];
        assert!(validate_history(&points).is_err());
    }
}
