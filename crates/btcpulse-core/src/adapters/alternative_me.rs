use std::time::Duration;

use serde::Deserialize;

use super::{required, Numeric, ProviderTransport};
use crate::data_source::{CapabilitySet, MetricProvider, SourceError, SourceFuture};
use crate::{MetricKind, MetricValue, ProviderId, SentimentIndex};

const FNG_PATH: &str = "/fng/?limit=1";

/// alternative.me Fear & Greed index adapter.
#[derive(Clone)]
pub struct AlternativeMeAdapter {
    transport: ProviderTransport,
}

impl Default for AlternativeMeAdapter {
    fn default() -> Self {
        Self::new(ProviderTransport::for_provider(ProviderId::AlternativeMe))
    }
}

impl AlternativeMeAdapter {
    pub fn new(transport: ProviderTransport) -> Self {
        Self { transport }
    }

    async fn fetch_index(&self) -> Result<MetricValue, SourceError> {
        let response: FngResponse = self.transport.get_json(FNG_PATH).await?;
        let latest = response
            .data
            .and_then(|rows| rows.into_iter().next())
            .ok_or_else(|| SourceError::malformed("alternative_me response has no data rows"))?;

        let raw = required(ProviderId::AlternativeMe, "value", latest.value.as_ref())?;
        if raw.fract() != 0.0 || !(0.0..=f64::from(u8::MAX)).contains(&raw) {
            return Err(SourceError::malformed(format!(
                "alternative_me index '{raw}' is not a small integer"
            )));
        }

        Ok(MetricValue::FearGreed(SentimentIndex::with_label(
            raw as u8,
            latest.value_classification.as_deref(),
        )))
    }
}

impl MetricProvider for AlternativeMeAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::AlternativeMe
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::none().with_fear_greed()
    }

    fn fetch<'a>(&'a self, metric: MetricKind) -> SourceFuture<'a, MetricValue> {
        Box::pin(async move {
            match metric {
                MetricKind::FearGreed => self.fetch_index().await,
                other => Err(SourceError::unsupported_metric(other)),
            }
        })
    }

    fn probe<'a>(&'a self, timeout: Duration) -> SourceFuture<'a, ()> {
        Box::pin(self.transport.probe(FNG_PATH, timeout))
    }
}

#[derive(Debug, Deserialize)]
struct FngResponse {
    data: Option<Vec<FngRow>>,
}

#[derive(Debug, Deserialize)]
struct FngRow {
    value: Option<Numeric>,
    value_classification: Option<String>,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::data_source::SourceErrorKind;
    use crate::http_client::MockHttpClient;
    use crate::SentimentClass;

    fn adapter(body: &str) -> AlternativeMeAdapter {
        AlternativeMeAdapter::new(
            ProviderTransport::new(ProviderId::AlternativeMe, "https://fng.test")
                .with_http_client(Arc::new(MockHttpClient::new().respond_json("/fng/", body))),
        )
    }

    #[tokio::test]
    async fn parses_latest_row() {
        let adapter = adapter(
            r#"{"name":"Fear and Greed Index","data":[{"value":"72",
                "value_classification":"Greed","timestamp":"1748736000"}]}"#,
        );
        let value = adapter.fetch(MetricKind::FearGreed).await.expect("index");
        let index = value.as_sentiment().expect("sentiment variant");
        assert_eq!(index.value, 72);
        assert_eq!(index.classification, SentimentClass::Greed);
    }

    #[tokio::test]
    async fn empty_data_is_malformed() {
        let adapter = adapter(r#"{"data":[]}"#);
        let err = adapter.fetch(MetricKind::FearGreed).await.expect_err("no rows");
        assert_eq!(err.kind(), SourceErrorKind::Malformed);
    }

    #[tokio::test]
    async fn fractional_value_is_malformed() {
        let adapter = adapter(r#"{"data":[{"value":"42.5"}]}"#);
        let err = adapter.fetch(MetricKind::FearGreed).await.expect_err("fraction");
        assert_eq!(err.kind(), SourceErrorKind::Malformed);
    }
}
