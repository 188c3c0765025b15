use btcpulse_core::{MetricsAggregator, MetricsResponse};
use serde_json::Value;

use crate::error::CliError;

pub async fn run(aggregator: &MetricsAggregator) -> Result<Value, CliError> {
    let snapshot = aggregator.snapshot().await;
    let response = MetricsResponse::from_snapshot(&snapshot);
    Ok(serde_json::to_value(response)?)
}
