use btcpulse_core::{HistoryRequest, MetricsAggregator, PricePoint, SourceMeta};
use serde::Serialize;
use serde_json::Value;

use crate::cli::HistoryArgs;
use crate::error::CliError;

use super::CommandResponse;

#[derive(Debug, Serialize)]
struct HistoryData {
    days: u32,
    points: Vec<PricePoint>,
}

pub async fn run(args: &HistoryArgs, aggregator: &MetricsAggregator) -> Result<Value, CliError> {
    let request = HistoryRequest::new(args.days)?;
    let reading = aggregator.price_history(request).await;
    let meta = SourceMeta::from_reading(&reading);

    let data = HistoryData {
        days: request.days(),
        points: reading.data,
    };
    Ok(serde_json::to_value(CommandResponse::ok(data, meta))?)
}
