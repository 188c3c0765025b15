use std::collections::HashMap;
use std::time::Duration;

use super::{required, Numeric, ProviderTransport};
use crate::data_source::{CapabilitySet, MetricProvider, SourceError, SourceFuture};
use crate::{MetricKind, MetricValue, ProviderId};

const PROBE_PATH: &str = "/v1/sopr/last";

/// bitcoin-data.com adapter for on-chain cycle metrics.
///
/// Each metric lives at `/v1/{metric}/last` and answers a flat object whose
/// value sits under a key named after the metric.
#[derive(Clone)]
pub struct BitcoinDataAdapter {
    transport: ProviderTransport,
}

impl Default for BitcoinDataAdapter {
    fn default() -> Self {
        Self::new(ProviderTransport::for_provider(ProviderId::BitcoinData))
    }
}

impl BitcoinDataAdapter {
    pub fn new(transport: ProviderTransport) -> Self {
        Self { transport }
    }

    async fn fetch_on_chain(&self, metric: MetricKind) -> Result<MetricValue, SourceError> {
        let (field, wrap): (&'static str, fn(f64) -> MetricValue) = match metric {
            MetricKind::Nupl => ("nupl", MetricValue::Nupl),
            MetricKind::Sopr => ("sopr", MetricValue::Sopr),
            MetricKind::Mvrv => ("mvrv", MetricValue::Mvrv),
            other => return Err(SourceError::unsupported_metric(other)),
        };

        let path = format!("/v1/{field}/last");
        let body: HashMap<String, Numeric> = self
            .transport
            .get_json::<HashMap<String, serde_json::Value>>(&path)
            .await?
            .into_iter()
            .filter_map(|(key, value)| {
                serde_json::from_value::<Numeric>(value)
                    .ok()
                    .map(|number| (key.to_ascii_lowercase(), number))
            })
            .collect();

        let value = required(ProviderId::BitcoinData, field, body.get(field))?;
        Ok(wrap(value))
    }
}

impl MetricProvider for BitcoinDataAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::BitcoinData
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::none().with_on_chain()
    }

    fn fetch<'a>(&'a self, metric: MetricKind) -> SourceFuture<'a, MetricValue> {
        Box::pin(self.fetch_on_chain(metric))
    }

    fn probe<'a>(&'a self, timeout: Duration) -> SourceFuture<'a, ()> {
        Box::pin(self.transport.probe(PROBE_PATH, timeout))
    }
}
