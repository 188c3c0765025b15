//! Degraded-mode placeholder values.
//!
//! Used only when every live source for a metric is exhausted. Values are a
//! pure function of metric and time: a slow sinusoid plus a faster harmonic,
//! so repeated reads during an outage drift instead of flat-lining. The
//! result always sits inside the metric's plausibility bounds.

use std::f64::consts::TAU;

use crate::data_source::HistoryRequest;
use crate::validation::PlausibilityBounds;
use crate::{MetricKind, MetricValue, PricePoint, PriceQuote, SentimentIndex, UtcDateTime};

const CIRCULATING_SUPPLY: f64 = 19_850_000.0;
const DAY_SECS: f64 = 86_400.0;

#[derive(Debug, Clone, Copy)]
struct Wave {
    center: f64,
    amplitude: f64,
    period_secs: f64,
}

impl Wave {
    const fn for_metric(kind: MetricKind) -> Self {
        match kind {
            MetricKind::Price => Self::new(108_000.0, 3_500.0, 6.0 * 3_600.0),
            MetricKind::Dominance => Self::new(57.5, 1.5, 12.0 * 3_600.0),
            MetricKind::FearGreed => Self::new(52.0, 18.0, DAY_SECS),
            MetricKind::Nupl => Self::new(0.52, 0.06, DAY_SECS),
            MetricKind::Sopr => Self::new(1.01, 0.03, 8.0 * 3_600.0),
            MetricKind::Mvrv => Self::new(2.2, 0.25, DAY_SECS),
        }
    }

    const fn new(center: f64, amplitude: f64, period_secs: f64) -> Self {
        Self {
            center,
            amplitude,
            period_secs,
        }
    }

    fn at(self, seconds: f64) -> f64 {
        let slow = (TAU * seconds / self.period_secs).sin();
        let fast = (TAU * seconds / (self.period_secs / 3.7)).sin();
        self.center + self.amplitude * (slow + 0.3 * fast)
    }
}

/// Bounded, time-varying placeholder for `kind` at `now`.
pub fn synthetic_value(kind: MetricKind, now: UtcDateTime) -> MetricValue {
    let seconds = now.unix_seconds_f64();
    let raw = sample(kind, seconds);

    match kind {
        MetricKind::Price => MetricValue::Price(quote_from(raw, seconds, now)),
        MetricKind::Dominance => MetricValue::Dominance(raw),
        MetricKind::FearGreed => MetricValue::FearGreed(SentimentIndex::new(raw.round() as u8)),
        MetricKind::Nupl => MetricValue::Nupl(raw),
        MetricKind::Sopr => MetricValue::Sopr(raw),
        MetricKind::Mvrv => MetricValue::Mvrv(raw),
    }
}

/// Placeholder spot quote at `now`.
pub fn synthetic_price(now: UtcDateTime) -> PriceQuote {
    let seconds = now.unix_seconds_f64();
    quote_from(sample(MetricKind::Price, seconds), seconds, now)
}

/// Daily placeholder series of `req.days()` points ending at `now`, oldest first.
pub fn synthetic_history(req: HistoryRequest, now: UtcDateTime) -> Vec<PricePoint> {
    (0..req.days())
        .rev()
        .map(|days_back| {
            let timestamp = now.saturating_sub_days(days_back);
            PricePoint {
                timestamp,
                price: sample(MetricKind::Price, timestamp.unix_seconds_f64()),
            }
        })
        .collect()
}

fn sample(kind: MetricKind, seconds: f64) -> f64 {
    let bounds = PlausibilityBounds::for_metric(kind);
    let value = Wave::for_metric(kind).at(seconds);
    if bounds.contains(value) {
        value
    } else {
        bounds.midpoint()
    }
}

fn quote_from(price: f64, seconds: f64, observed_at: UtcDateTime) -> PriceQuote {
    let previous = sample(MetricKind::Price, seconds - DAY_SECS);
    let change_24h_absolute = price - previous;
    let volume = 28.0e9 + 4.0e9 * (TAU * seconds / DAY_SECS).cos();

    PriceQuote {
        price,
        change_24h_absolute,
        change_24h_percent: change_24h_absolute / previous * 100.0,
        market_cap: price * CIRCULATING_SUPPLY,
        volume_24h: volume,
        observed_at,
    }
}
