mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use btcpulse_core::MetricsResponse;

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) if error.is_contract_error() => {
            warn!(error = %error, exit_code = error.exit_code(), "request rejected");
            let code = ExitCode::from(error.exit_code());
            match output::render(&MetricsResponse::failure(&error), cli.pretty) {
                Ok(()) => code,
                Err(render_error) => {
                    eprintln!("error: {render_error}");
                    ExitCode::from(render_error.exit_code())
                }
            }
        }
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run(cli: &Cli) -> Result<(), CliError> {
    let response = commands::run(cli).await?;
    output::render(&response, cli.pretty)
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
