use btcpulse_core::{HealthSnapshot, MetricsAggregator, ProviderId};
use serde::Serialize;
use serde_json::Value;

use crate::error::CliError;

use super::CommandResponse;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthMeta {
    probe_timeout_ms: u64,
    unreachable: Vec<ProviderId>,
}

pub async fn run(aggregator: &MetricsAggregator) -> Result<Value, CliError> {
    let health: HealthSnapshot = aggregator.check_health().await;
    let meta = HealthMeta {
        probe_timeout_ms: aggregator.config().probe_timeout.as_millis() as u64,
        unreachable: health.unreachable(),
    };

    Ok(serde_json::to_value(CommandResponse::ok(health, meta))?)
}
