//! Query command
//!
//! Submits a query, polls it to a terminal outcome and prints the rows.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use insight_client::JobSubmitter;
use insight_core::{QueryRequest, TimeRange};
use std::sync::Arc;
use tracing::info;

use crate::commands::connect;
use crate::config::Config;
use crate::output::print_rows;
use crate::scheduler::{PollPolicy, QueryPoller, TokioDelay};

/// Arguments of the `query` command
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Start date, inclusive (YYYY-MM-DD, UTC)
    #[arg(short = 's', long, default_value = "2018-12-25")]
    pub start: String,

    /// End date (YYYY-MM-DD, UTC)
    #[arg(short = 'e', long, default_value = "2018-12-26")]
    pub end: String,

    /// Log group to query
    #[arg(short = 'n', long = "log-group", default_value = "/aws/lambda/hoge")]
    pub log_group: String,

    /// Maximum number of records; a running query is stopped once it has this many
    #[arg(short = 'l', long, default_value_t = 10)]
    pub limit: u32,

    /// Query text
    #[arg(
        short = 'q',
        long,
        default_value = "fields @timestamp, @message | sort @timestamp desc"
    )]
    pub query: String,

    /// Also stop the query early while it is still scheduled
    #[arg(long, conflicts_with = "no_early_stop")]
    pub stop_while_scheduled: bool,

    /// Wait for the query to complete even after the limit is reached
    #[arg(long)]
    pub no_early_stop: bool,
}

impl QueryArgs {
    /// Validates the arguments into a request
    pub fn to_request(&self) -> Result<QueryRequest> {
        let range = TimeRange::from_dates(&self.start, &self.end)?;
        let request = QueryRequest::new(range, self.limit, &self.log_group, &self.query)?;
        Ok(request)
    }
}

/// Run a query end to end
pub async fn run_query(args: QueryArgs, config: &Config) -> Result<()> {
    let request = args.to_request()?;

    print_parameters(&request);

    let client = Arc::new(connect(config).await);

    let handle = client
        .submit(&request)
        .await
        .context("Failed to start query")?;

    let policy = PollPolicy::new(request.limit() as usize)
        .with_interval(config.poll_interval)
        .with_early_stop_on_scheduled(args.stop_while_scheduled)
        .with_early_stop_on_running(!args.no_early_stop);

    let poller = QueryPoller::new(client.clone(), client, Arc::new(TokioDelay), policy);
    let outcome = poller.poll(&handle).await?;

    info!(
        "Query {} finished with status {}",
        handle,
        outcome.snapshot().status
    );

    if outcome.stopped_early() {
        eprintln!(
            "{}",
            format!(
                "Query {} was stopped after reaching the limit of {}; results may be partial.",
                handle,
                request.limit()
            )
            .yellow()
        );
    }

    let rows = outcome.into_snapshot().into_rows();
    info!("Printing {} row(s)", rows.len());

    print_rows(&rows, config.output)
}

fn print_parameters(request: &QueryRequest) {
    eprintln!("{}", "Query parameters:".bold());
    eprint!("{}", describe_parameters(request));
}

/// Describes a validated request, times as epoch seconds
fn describe_parameters(request: &QueryRequest) -> String {
    format!(
        "  Start:     {}\n  End:       {}\n  Limit:     {}\n  Log group: {}\n  Query:     {}\n",
        request.start_time(),
        request.end_time(),
        request.limit(),
        request.resource_name(),
        request.query()
    )
}
