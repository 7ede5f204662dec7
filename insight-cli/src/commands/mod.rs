//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod job;
mod query;

pub use query::QueryArgs;

use anyhow::Result;
use clap::Subcommand;
use insight_client::InsightsClient;
use tracing::debug;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run a query and print the matched records
    Query(QueryArgs),
    /// Show the current status and rows of a query
    Status {
        /// Query ID returned when the query was started
        query_id: String,
    },
    /// Stop a running query
    Stop {
        /// Query ID returned when the query was started
        query_id: String,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Query(args) => query::run_query(args, config).await,
        Commands::Status { query_id } => job::show_status(&query_id, config).await,
        Commands::Stop { query_id } => job::stop_query(&query_id, config).await,
    }
}

/// Builds a service client from the configuration
async fn connect(config: &Config) -> InsightsClient {
    let client = InsightsClient::connect(config.region.clone(), config.profile.as_deref()).await;
    debug!("Connected to CloudWatch Logs in {}", client.region());
    client
}
