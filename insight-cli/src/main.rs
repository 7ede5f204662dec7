//! Insight CLI
//!
//! Runs CloudWatch Logs Insights queries from the command line.
//!
//! Architecture:
//! - Configuration: region, profile and pacing from flags or environment
//! - Commands: `query` (submit, poll, print), `status` and `stop`
//! - Scheduler: the poll loop that drives a submitted query to completion
//!
//! Logs go to stderr so that stdout only carries result rows.

mod commands;
mod config;
mod exit;
mod output;
mod scheduler;

use clap::Parser;
use colored::*;
use std::process::ExitCode;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::{Commands, handle_command};
use config::{Config, DEFAULT_REGION};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "insight")]
#[command(about = "Run CloudWatch Logs Insights queries", long_about = None)]
struct Cli {
    /// AWS region
    #[arg(long, global = true, env = "INSIGHT_REGION", default_value = DEFAULT_REGION)]
    region: String,

    /// AWS profile to load credentials from
    #[arg(long, global = true, env = "AWS_PROFILE")]
    profile: Option<String>,

    /// Seconds to wait between status checks
    #[arg(long, global = true, env = "INSIGHT_POLL_INTERVAL", default_value_t = 5)]
    poll_interval: u64,

    /// Output format for result rows
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let config = Config {
        profile: cli.profile,
        poll_interval: Duration::from_secs(cli.poll_interval),
        output: cli.output,
        ..Config::new(cli.region)
    };
    debug!("Loaded configuration: {:?}", config);

    let result = match config.validate() {
        Ok(()) => handle_command(cli.command, &config).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            exit::to_exit_code(&e)
        }
    }
}

/// Initialize logging to stderr, honouring RUST_LOG when set
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "insight_cli=debug,insight_client=debug"
    } else {
        "insight_cli=info,insight_client=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
