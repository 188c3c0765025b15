use btcpulse_core::{MetricsAggregator, SourceMeta};
use serde_json::Value;

use crate::cli::MetricArgs;
use crate::error::CliError;

use super::CommandResponse;

pub async fn run(args: &MetricArgs, aggregator: &MetricsAggregator) -> Result<Value, CliError> {
    let sources = args
        .sources
        .as_deref()
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let reading = aggregator.fetch_metric_named(&args.name, &sources).await?;
    let meta = SourceMeta::from_reading(&reading);

    Ok(serde_json::to_value(CommandResponse::ok(reading.data, meta))?)
}
