//! # btcpulse Core
//!
//! Resilient multi-source Bitcoin market metrics.
//!
//! ## Overview
//!
//! This crate reads Bitcoin price, market dominance, the Fear & Greed index
//! and the NUPL, SOPR and MVRV on-chain indicators from several free public
//! providers, and always hands back a validated, freshness-bounded value:
//!
//! - **TTL cache** per metric
//! - **Per-source cool-down** so one upstream is not hammered
//! - **Ordered fallback** across providers, strictly sequential per metric
//! - **Centralized plausibility bounds** applied to every provider
//! - **Synthetic fallback** when every provider is exhausted, flagged in metadata
//! - **Health probes** reporting reachability per provider
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters (CoinGecko, CoinCap, CoinPaprika, alternative.me, bitcoin-data) |
//! | [`aggregator`] | Cache-then-fetch-then-fallback orchestration |
//! | [`cache`] | In-memory TTL cache |
//! | [`config`] | Timeouts, TTLs, cool-down windows and provider chains |
//! | [`data_source`] | Provider trait and request/error types |
//! | [`domain`] | Domain models (price quote, sentiment, rainbow band) |
//! | [`envelope`] | Dashboard JSON response |
//! | [`error`] | Core error types |
//! | [`fixtures`] | Canned provider payloads for offline runs |
//! | [`health`] | Reachability probes |
//! | [`http_client`] | HTTP client abstraction |
//! | [`provider_policy`] | Upstream request quotas |
//! | [`rate_limiter`] | Per-source cool-down tracker |
//! | [`snapshot`] | All dashboard metrics read in one pass |
//! | [`source`] | Provider identifiers |
//! | [`synthetic`] | Degraded-mode placeholder values |
//! | [`throttling`] | Quota guard |
//! | [`validation`] | Plausibility bounds |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use btcpulse_core::{MetricKind, MetricsAggregatorBuilder};
//!
//! #[tokio::main]
//! async fn main() {
//!     let aggregator = MetricsAggregatorBuilder::new().with_real_clients().build();
//!
//!     let reading = aggregator.fetch_default(MetricKind::Price).await;
//!     println!("{:?} via {:?}", reading.data, reading.origin);
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / Handler  │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │   Aggregator    │────▶│ Cache / Cool-down│
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Metric Provider │────▶│ HTTP Client      │
//! │ (Adapter Trait) │     │ (reqwest/mock)   │
//! └────────┬────────┘     └──────────────────┘
//!          │ exhausted
//!          ▼
//! ┌─────────────────┐
//! │ Synthetic value │
//! └─────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Metric reads never fail. Upstream problems are recorded per attempt as
//! [`SourceError`] codes in the returned [`Reading`]:
//!
//! ```rust
//! use btcpulse_core::{SourceError, SourceErrorKind};
//!
//! fn describe(error: &SourceError) -> &'static str {
//!     match error.kind() {
//!         SourceErrorKind::Timeout => "upstream too slow",
//!         SourceErrorKind::Implausible => "value outside plausibility bounds",
//!         _ => "upstream failure",
//!     }
//! }
//! ```
//!
//! Contract errors, such as an unknown metric name, are returned as
//! [`CoreError`].

pub mod adapters;
pub mod aggregator;
pub mod cache;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod fixtures;
pub mod health;
pub mod http_client;
pub mod provider_policy;
pub mod rate_limiter;
pub mod snapshot;
pub mod source;
pub mod synthetic;
pub mod throttling;
pub mod validation;

// Adapter implementations
pub use adapters::{
    AlternativeMeAdapter, BitcoinDataAdapter, CoinCapAdapter, CoinGeckoAdapter,
    CoinPaprikaAdapter, ProviderTransport,
};

// Orchestration
pub use aggregator::{
    AttemptError, HistoryReading, MetricReading, MetricsAggregator, MetricsAggregatorBuilder,
    Reading, ReadingOrigin,
};

// Caching
pub use cache::CacheStore;

// Configuration
pub use config::{AggregatorConfig, MetricPolicy};

// Provider trait and types
pub use data_source::{
    CapabilitySet, HistoryRequest, MetricProvider, SourceError, SourceErrorKind,
};

// Domain models
pub use domain::{
    fair_value, MetricKind, MetricValue, PricePoint, PriceQuote, RainbowBand, SentimentClass,
    SentimentIndex, UtcDateTime,
};

// Response envelope
pub use envelope::{
    BitcoinMetrics, CycleMetrics, MetricsFailure, MetricsResponse, MetricsSuccess, PriceSummary,
    ResponseMeta, SourceMeta,
};

// Error types
pub use error::{CoreError, ValidationError};

// Health
pub use health::{HealthReporter, HealthSnapshot};

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, MockBehavior, MockHttpClient,
    ReqwestHttpClient,
};

// Provider quotas
pub use provider_policy::ProviderPolicy;

// Cool-down
pub use rate_limiter::RateLimiter;

// Snapshot
pub use snapshot::MarketSnapshot;

// Source identifiers
pub use source::ProviderId;

// Synthetic fallback
pub use synthetic::{synthetic_history, synthetic_price, synthetic_value};

// Quota guard
pub use throttling::QuotaGuard;

// Plausibility
pub use validation::PlausibilityBounds;
