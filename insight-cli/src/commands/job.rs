//! Single-call job commands
//!
//! Inspect or stop a query that was started earlier, by its ID.

use anyhow::{Context, Result};
use colored::*;
use insight_client::{JobCanceller, StatusProber};
use insight_core::JobHandle;

use crate::commands::connect;
use crate::config::Config;
use crate::output::print_snapshot;

/// Probe a query once and print what it has so far
pub async fn show_status(query_id: &str, config: &Config) -> Result<()> {
    let client = connect(config).await;
    let handle = JobHandle::new(query_id);

    let snapshot = client
        .probe(&handle)
        .await
        .with_context(|| format!("Failed to read status of query {}", handle))?;

    print_snapshot(&snapshot, config.output)?;

    if !snapshot.status.is_terminal() {
        eprintln!(
            "{}",
            format!("Query {} is still {}; rows may be partial.", handle, snapshot.status)
                .yellow()
        );
    }

    Ok(())
}

/// Ask the service to stop a query
pub async fn stop_query(query_id: &str, config: &Config) -> Result<()> {
    let client = connect(config).await;
    let handle = JobHandle::new(query_id);

    let ack = match client.cancel(&handle).await {
        Ok(ack) => ack,
        Err(e) if e.is_already_terminal() => {
            eprintln!(
                "{}",
                format!("Query {} has already finished.", handle).yellow()
            );
            return Err(e.into());
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to stop query {}", handle)),
    };

    eprintln!("{} Stopped query {}", "✓".green(), ack.handle.to_string().cyan());
    Ok(())
}
