mod cli;
mod connect;
mod error;
mod output;

use std::process::ExitCode;

use clap::Parser;
use snapshift_core::ClusterRole;
use snapshift_operations::operations::{MigrateOperation, MigrationOutput};
use snapshift_operations::providers::SystemClock;
use snapshift_operations::traits::Clock;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::Cli;
use crate::connect::connect;
use crate::error::{CliError, Result};
use crate::output::{OutputFormatter, PlainTextFormatter};

const DEFAULT_LOG_FILTER: &str = "snapshift=info";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_filter());

    match run(&cli).await {
        Ok(output) => {
            print!("{}", PlainTextFormatter.format_success(&output));
            ExitCode::SUCCESS
        }
        Err(e) => {
            print_error(&e);
            if let CliError::Migration(failure) = &e {
                eprint!("\n{}", PlainTextFormatter.format_failure(failure));
            }
            ExitCode::FAILURE
        }
    }
}

/// `--verbose` wins over `RUST_LOG`.
fn init_tracing(verbose_filter: Option<&str>) {
    let filter = match verbose_filter {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

async fn run(cli: &Cli) -> Result<MigrationOutput> {
    let request = cli.to_request();
    request.validate().map_err(CliError::InvalidRequest)?;

    let clock = SystemClock::new();
    let deadline = clock.now() + request.timeout;
    let origin = connect(ClusterRole::Origin, &cli.origin_connection(), deadline).await?;
    let destination =
        connect(ClusterRole::Destination, &cli.destination_connection(), deadline).await?;

    let operation = MigrateOperation::new(origin, destination, clock);
    Ok(operation.execute_until(&request, deadline).await?)
}

fn print_error(error: &CliError) {
    eprintln!("error: {error}");

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("caused by: {cause}");
        source = std::error::Error::source(cause);
    }
}
