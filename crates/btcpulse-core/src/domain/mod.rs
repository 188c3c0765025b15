//! # Domain Models
//!
//! Canonical value types for Bitcoin market metrics.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`MetricKind`] | Metric identifier (price, dominance, fear & greed, NUPL, SOPR, MVRV) |
//! | [`MetricValue`] | Normalized provider value tagged by metric |
//! | [`PriceQuote`] | BTC/USD spot quote with 24h change, market cap and volume |
//! | [`SentimentIndex`] | Fear & Greed reading with classification |
//! | [`PricePoint`] | One entry of a price history series |
//! | [`RainbowBand`] | Logarithmic regression band for a price |
//! | [`UtcDateTime`] | UTC timestamp |

mod metric;
mod rainbow;
mod timestamp;

pub use metric::{
    MetricKind, MetricValue, PricePoint, PriceQuote, SentimentClass, SentimentIndex,
};
pub use rainbow::{fair_value, RainbowBand};
pub use timestamp::UtcDateTime;
