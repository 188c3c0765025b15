//! Logarithmic regression "rainbow" band classification for BTC/USD.

use serde::{Deserialize, Serialize};
use time::macros::datetime;
use time::OffsetDateTime;

use crate::UtcDateTime;

const GENESIS: OffsetDateTime = datetime!(2009-01-09 0:00 UTC);
const SLOPE: f64 = 2.661_671_550_059_61;
const INTERCEPT: f64 = -17.918_376_188_986_4;

/// Upper edges of each band, in log10 offset from the regression line.
const BAND_EDGES: [f64; 8] = [-0.45, -0.30, -0.15, 0.0, 0.15, 0.30, 0.45, 0.60];

/// Rainbow chart band, ordered from cheapest to most overheated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RainbowBand {
    FireSale,
    Buy,
    Accumulate,
    StillCheap,
    Hodl,
    IsThisABubble,
    FomoIntensifies,
    SellSeriously,
    MaximumBubble,
}

impl RainbowBand {
    const ORDERED: [Self; 9] = [
        Self::FireSale,
        Self::Buy,
        Self::Accumulate,
        Self::StillCheap,
        Self::Hodl,
        Self::IsThisABubble,
        Self::FomoIntensifies,
        Self::SellSeriously,
        Self::MaximumBubble,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::FireSale => "Basically a Fire Sale",
            Self::Buy => "BUY!",
            Self::Accumulate => "Accumulate",
            Self::StillCheap => "Still cheap",
            Self::Hodl => "HODL!",
            Self::IsThisABubble => "Is this a bubble?",
            Self::FomoIntensifies => "FOMO intensifies",
            Self::SellSeriously => "Sell. Seriously, SELL!",
            Self::MaximumBubble => "Maximum Bubble Territory",
        }
    }

    /// Classifies `price` observed at `at` against the regression fair value.
    pub fn classify(price: f64, at: UtcDateTime) -> Self {
        if !price.is_finite() || price <= 0.0 {
            return Self::FireSale;
        }

        let offset = price.log10() - regression_log10(at);
        let index = BAND_EDGES
            .iter()
            .position(|edge| offset < *edge)
            .unwrap_or(BAND_EDGES.len());
        Self::ORDERED[index]
    }
}

/// Regression fair value in USD at `at`.
pub fn fair_value(at: UtcDateTime) -> f64 {
    10_f64.powf(regression_log10(at))
}

fn regression_log10(at: UtcDateTime) -> f64 {
    let days = (at.into_inner() - GENESIS).whole_seconds() as f64 / 86_400.0;
    SLOPE * days.max(1.0).ln() + INTERCEPT
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mid_2025() -> UtcDateTime {
        UtcDateTime::parse("2025-06-01T00:00:00Z").expect("valid timestamp")
    }

    #[test]
    fn fair_value_price_lands_in_hodl_band() {
        let at = mid_2025();
        assert_eq!(RainbowBand::classify(fair_value(at) * 1.01, at), RainbowBand::Hodl);
    }

    #[test]
    fn bands_are_monotonic_in_price() {
        let at = mid_2025();
        let mut previous = RainbowBand::FireSale;
        for price in [5_000.0, 40_000.0, 80_000.0, 150_000.0, 400_000.0, 2_000_000.0] {
            let band = RainbowBand::classify(price, at);
            assert!(band >= previous, "{price} produced {band:?} below {previous:?}");
            previous = band;
        }
        assert_eq!(RainbowBand::classify(10_000_000.0, at), RainbowBand::MaximumBubble);
    }

    #[test]
    fn non_positive_price_is_cheapest_band() {
        assert_eq!(RainbowBand::classify(0.0, mid_2025()), RainbowBand::FireSale);
    }
}
