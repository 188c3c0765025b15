use std::collections::BTreeMap;

use btcpulse_core::{MetricKind, MetricsAggregator, ProviderId};
use serde::Serialize;
use serde_json::Value;

use crate::error::CliError;

use super::CommandResponse;

#[derive(Debug, Serialize)]
struct SourceEntry {
    id: ProviderId,
    registered: bool,
    metrics: Vec<&'static str>,
    history: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChainEntry {
    sources: Vec<ProviderId>,
    ttl_secs: u64,
    rate_window_secs: u64,
}

#[derive(Debug, Serialize)]
struct SourcesData {
    sources: Vec<SourceEntry>,
    chains: BTreeMap<&'static str, ChainEntry>,
}

pub fn run(aggregator: &MetricsAggregator) -> Result<Value, CliError> {
    let sources = ProviderId::ALL
        .into_iter()
        .map(|id| match aggregator.provider(id) {
            Some(provider) => {
                let capabilities = provider.capabilities();
                SourceEntry {
                    id,
                    registered: true,
                    metrics: capabilities.supported_metrics(),
                    history: capabilities.history,
                }
            }
            None => SourceEntry {
                id,
                registered: false,
                metrics: Vec::new(),
                history: false,
            },
        })
        .collect();

    let config = aggregator.config();
    let mut chains = MetricKind::ALL
        .into_iter()
        .map(|kind| {
            let policy = config.policy(kind);
            (
                kind.as_str(),
                ChainEntry {
                    sources: policy.sources,
                    ttl_secs: policy.ttl.as_secs(),
                    rate_window_secs: policy.rate_window.as_secs(),
                },
            )
        })
        .collect::<BTreeMap<_, _>>();

    let history = config.history_policy();
    chains.insert(
        "history",
        ChainEntry {
            sources: history.sources.clone(),
            ttl_secs: history.ttl.as_secs(),
            rate_window_secs: history.rate_window.as_secs(),
        },
    );

    let meta = serde_json::json!({ "registered": aggregator.provider_ids().len() });
    Ok(serde_json::to_value(CommandResponse::ok(
        SourcesData { sources, chains },
        meta,
    ))?)
}
