//! Provider adapter contract and request/error types.
//!
//! Every upstream service implements [`MetricProvider`]. An adapter performs
//! one outbound request per call, normalizes the provider's wire format into
//! [`MetricValue`]s and reports failures as a typed [`SourceError`].
//! Plausibility checks live in [`crate::validation`], not here.
//!
//! | Operation | Request | Response |
//! |-----------|---------|----------|
//! | [`fetch`](MetricProvider::fetch) | [`MetricKind`] | [`MetricValue`] |
//! | [`history`](MetricProvider::history) | [`HistoryRequest`] | `Vec<PricePoint>` |
//! | [`probe`](MetricProvider::probe) | timeout | `()` |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::http_client::{HttpError, HttpResponse};
use crate::{MetricKind, MetricValue, PricePoint, ProviderId, ValidationError};

/// Metrics a provider is able to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CapabilitySet {
    pub price: bool,
    pub dominance: bool,
    pub fear_greed: bool,
    pub on_chain: bool,
    pub history: bool,
}

impl CapabilitySet {
    pub const fn none() -> Self {
        Self {
            price: false,
            dominance: false,
            fear_greed: false,
            on_chain: false,
            history: false,
        }
    }

    pub const fn with_price(mut self) -> Self {
        self.price = true;
        self
    }

    pub const fn with_dominance(mut self) -> Self {
        self.dominance = true;
        self
    }

    pub const fn with_fear_greed(mut self) -> Self {
        self.fear_greed = true;
        self
    }

    pub const fn with_on_chain(mut self) -> Self {
        self.on_chain = true;
        self
    }

    pub const fn with_history(mut self) -> Self {
        self.history = true;
        self
    }

    pub const fn supports(self, metric: MetricKind) -> bool {
        match metric {
            MetricKind::Price => self.price,
            MetricKind::Dominance => self.dominance,
            MetricKind::FearGreed => self.fear_greed,
            MetricKind::Nupl | MetricKind::Sopr | MetricKind::Mvrv => self.on_chain,
        }
    }

    pub fn supported_metrics(self) -> Vec<&'static str> {
        let mut values = MetricKind::ALL
            .into_iter()
            .filter(|metric| self.supports(*metric))
            .map(MetricKind::as_str)
            .collect::<Vec<_>>();
        if self.history {
            values.push("history");
        }
        values
    }
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Timeout,
    HttpStatus,
    Malformed,
    Transport,
    RateLimited,
    Implausible,
    UnsupportedMetric,
    NotRegistered,
}

/// Structured source error recorded by the aggregator for each failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    status: Option<u16>,
}

impl SourceError {
    fn new(kind: SourceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            SourceErrorKind::Timeout,
            format!("no response within {}ms", after.as_millis()),
        )
    }

    pub fn http_status(status: u16) -> Self {
        Self {
            kind: SourceErrorKind::HttpStatus,
            message: format!("upstream returned status {status}"),
            status: Some(status),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Malformed, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Transport, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::RateLimited, message)
    }

    pub fn implausible(error: &ValidationError) -> Self {
        Self::new(SourceErrorKind::Implausible, error.to_string())
    }

    pub fn unsupported_metric(metric: MetricKind) -> Self {
        Self::new(
            SourceErrorKind::UnsupportedMetric,
            format!("metric '{metric}' is not supported by this source"),
        )
    }

    pub fn unsupported_history() -> Self {
        Self::new(
            SourceErrorKind::UnsupportedMetric,
            "price history is not supported by this source",
        )
    }

    pub fn not_registered(provider: ProviderId) -> Self {
        Self::new(
            SourceErrorKind::NotRegistered,
            format!("provider '{provider}' is not registered"),
        )
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Timeout => "source.timeout",
            SourceErrorKind::HttpStatus => "source.http_status",
            SourceErrorKind::Malformed => "source.malformed",
            SourceErrorKind::Transport => "source.transport",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::Implausible => "source.implausible",
            SourceErrorKind::UnsupportedMetric => "source.unsupported_metric",
            SourceErrorKind::NotRegistered => "source.not_registered",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

impl From<HttpError> for SourceError {
    fn from(error: HttpError) -> Self {
        if error.is_timeout() {
            Self::new(SourceErrorKind::Timeout, error.message())
        } else {
            Self::transport(error.message())
        }
    }
}

/// Maps a transport result onto the adapter error taxonomy.
pub fn expect_success(
    response: Result<HttpResponse, HttpError>,
) -> Result<HttpResponse, SourceError> {
    let response = response?;
    if !response.is_success() {
        return Err(SourceError::http_status(response.status));
    }
    Ok(response)
}

/// Request payload for price history series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HistoryRequest {
    days: u32,
}

impl HistoryRequest {
    pub const MIN_DAYS: u32 = 1;
    pub const MAX_DAYS: u32 = 2_000;

    pub fn new(days: i64) -> Result<Self, ValidationError> {
        if days < i64::from(Self::MIN_DAYS) || days > i64::from(Self::MAX_DAYS) {
            return Err(ValidationError::InvalidDays {
                value: days,
                min: Self::MIN_DAYS,
                max: Self::MAX_DAYS,
            });
        }
        Ok(Self { days: days as u32 })
    }

    pub const fn days(self) -> u32 {
        self.days
    }

    pub fn cache_key(self) -> String {
        format!("history:{}", self.days)
    }
}

pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Upstream provider adapter.
///
/// Adapters are stateless across calls apart from their quota guard, and
/// must be `Send + Sync` since one instance serves all concurrent requests.
pub trait MetricProvider: Send + Sync {
    /// Returns the unique provider identifier.
    fn id(&self) -> ProviderId;

    /// Returns the set of supported metrics.
    fn capabilities(&self) -> CapabilitySet;

    /// Fetches and normalizes a single metric.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the metric is unsupported, the request times
    /// out, the upstream answers non-2xx, or the payload lacks required fields.
    fn fetch<'a>(&'a self, metric: MetricKind) -> SourceFuture<'a, MetricValue>;

    /// Fetches a daily price series. Unsupported unless overridden.
    fn history<'a>(&'a self, req: HistoryRequest) -> SourceFuture<'a, Vec<PricePoint>> {
        let _ = req;
        Box::pin(async move { Err(SourceError::unsupported_history()) })
    }

    /// Issues a lightweight reachability request against the provider.
    fn probe<'a>(&'a self, timeout: Duration) -> SourceFuture<'a, ()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_set_maps_on_chain_metrics() {
        let caps = CapabilitySet::none().with_on_chain();
        assert!(caps.supports(MetricKind::Nupl));
        assert!(caps.supports(MetricKind::Sopr));
        assert!(caps.supports(MetricKind::Mvrv));
        assert!(!caps.supports(MetricKind::Price));
        assert_eq!(caps.supported_metrics(), vec!["nupl", "sopr", "mvrv"]);
    }

    #[test]
    fn history_days_are_bounded() {
        assert!(HistoryRequest::new(1).is_ok());
        assert_eq!(HistoryRequest::new(2_000).map(HistoryRequest::days), Ok(2_000));
        assert!(matches!(
            HistoryRequest::new(0),
            Err(ValidationError::InvalidDays { value: 0, .. })
        ));
        assert!(HistoryRequest::new(2_001).is_err());
    }

    #[test]
    fn non_success_status_maps_to_http_status_error() {
        let err = expect_success(Ok(HttpResponse::with_status(503, ""))).expect_err("503");
        assert_eq!(err.kind(), SourceErrorKind::HttpStatus);
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.code(), "source.http_status");
    }

    #[test]
    fn transport_timeout_maps_to_timeout_kind() {
        let err = expect_success(Err(HttpError::timeout("deadline"))).expect_err("timeout");
        assert_eq!(err.kind(), SourceErrorKind::Timeout);
    }
}
