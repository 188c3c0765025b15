//! CLI argument definitions for btcpulse.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `snapshot` | Every dashboard metric plus provider health, as one JSON response |
//! | `metric` | A single metric through its fallback chain |
//! | `history` | Daily BTC/USD price series |
//! | `health` | Reachability probe per provider |
//! | `sources` | Provider capability matrix and default chains |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--mock` | `false` | Serve canned provider responses, no network |
//! | `--fetch-timeout-ms` | `5000` | Per-provider request timeout |
//! | `--log-json` | `false` | Emit logs to stderr as JSON lines |
//!
//! Log verbosity follows `RUST_LOG` (default `warn`).
//!
//! # Examples
//!
//! ```bash
//! btcpulse snapshot --pretty
//! btcpulse metric price --sources coincap,coingecko
//! btcpulse history --days 90
//! RUST_LOG=btcpulse_core=debug btcpulse --mock snapshot
//! ```

use clap::{Args, Parser, Subcommand};

/// btcpulse - resilient multi-source Bitcoin market metrics
#[derive(Debug, Parser)]
#[command(
    name = "btcpulse",
    author,
    version,
    about = "Resilient multi-source Bitcoin market metrics",
    long_about = "btcpulse reads Bitcoin price, dominance, Fear & Greed and on-chain cycle \
metrics from several public providers with caching, per-source cool-down, ordered \
fallback, plausibility validation and a synthetic fallback when every provider is down.\n\
\n\
Output is always JSON on stdout; logs go to stderr."
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Use canned offline provider responses instead of the network.
    #[arg(long, global = true, default_value_t = false)]
    pub mock: bool,

    /// Per-provider request timeout in milliseconds.
    ///
    /// Overrides BTCPULSE_FETCH_TIMEOUT_MS.
    #[arg(long, global = true)]
    pub fetch_timeout_ms: Option<u64>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch every dashboard metric concurrently, plus provider health.
    ///
    /// # Examples
    ///
    ///   btcpulse snapshot
    ///   btcpulse snapshot --pretty
    Snapshot,

    /// Fetch one metric through its fallback chain.
    ///
    /// Metrics: price, dominance, fear_greed, nupl, sopr, mvrv.
    ///
    /// # Examples
    ///
    ///   btcpulse metric price
    ///   btcpulse metric dominance --sources coinpaprika,coingecko
    Metric(MetricArgs),

    /// Fetch a daily BTC/USD price series.
    ///
    /// # Examples
    ///
    ///   btcpulse history --days 30
    History(HistoryArgs),

    /// Probe every provider for reachability.
    Health,

    /// List provider capabilities and default fallback chains.
    Sources,
}

/// Arguments for the `metric` command.
#[derive(Debug, Args)]
pub struct MetricArgs {
    /// Metric name.
    pub name: String,

    /// Comma-separated provider list, tried in order.
    ///
    /// Defaults to the metric's configured chain.
    #[arg(long)]
    pub sources: Option<String>,
}

/// Arguments for the `history` command.
#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Number of days, 1 to 2000.
    #[arg(long, default_value_t = 30, allow_negative_numbers = true)]
    pub days: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "btcpulse",
            "metric",
            "price",
            "--sources",
            "coincap,coingecko",
            "--pretty",
            "--mock",
        ])
        .expect("valid args");

        assert!(cli.pretty);
        assert!(cli.mock);
        match cli.command {
            Command::Metric(args) => {
                assert_eq!(args.name, "price");
                assert_eq!(args.sources.as_deref(), Some("coincap,coingecko"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn history_days_default_and_accept_out_of_range_for_later_validation() {
        let cli = Cli::try_parse_from(["btcpulse", "history"]).expect("valid args");
        assert!(matches!(cli.command, Command::History(HistoryArgs { days: 30 })));

        let cli = Cli::try_parse_from(["btcpulse", "history", "--days", "-5"]).expect("parses");
        assert!(matches!(cli.command, Command::History(HistoryArgs { days: -5 })));
    }

    #[test]
    fn verifies_command_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
