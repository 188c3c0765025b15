mod health;
mod history;
mod metric;
mod snapshot;
mod sources;

use std::time::Duration;

use btcpulse_core::{AggregatorConfig, MetricsAggregator, MetricsAggregatorBuilder, UtcDateTime};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Success envelope shared by the single-purpose commands.
#[derive(Debug, Serialize)]
pub struct CommandResponse<D, M> {
    pub success: bool,
    pub data: D,
    pub meta: M,
    pub timestamp: UtcDateTime,
}

impl<D, M> CommandResponse<D, M> {
    pub fn ok(data: D, meta: M) -> Self {
        Self {
            success: true,
            data,
            meta,
            timestamp: UtcDateTime::now(),
        }
    }
}

pub async fn run(cli: &Cli) -> Result<Value, CliError> {
    let aggregator = build_aggregator(cli)?;
    debug!(
        command = ?cli.command,
        mock = cli.mock,
        providers = aggregator.provider_ids().len(),
        "running command"
    );

    match &cli.command {
        Command::Snapshot => snapshot::run(&aggregator).await,
        Command::Metric(args) => metric::run(args, &aggregator).await,
        Command::History(args) => history::run(args, &aggregator).await,
        Command::Health => health::run(&aggregator).await,
        Command::Sources => sources::run(&aggregator),
    }
}

fn build_aggregator(cli: &Cli) -> Result<MetricsAggregator, CliError> {
    let mut config = AggregatorConfig::from_env()?;
    if let Some(ms) = cli.fetch_timeout_ms {
        config = config.with_fetch_timeout(Duration::from_millis(ms));
    }

    let builder = if cli.mock {
        MetricsAggregatorBuilder::new().with_mock_mode()
    } else {
        MetricsAggregatorBuilder::new().with_real_clients()
    };

    Ok(builder.with_config(config).build())
}
