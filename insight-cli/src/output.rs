//! Result rendering
//!
//! Rows go to stdout; everything else (progress, notes, errors) goes to stderr.

use clap::ValueEnum;
use insight_core::{ResultRow, StatusSnapshot};

/// Output format for result rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One `field=..., value=...` line per field
    #[default]
    Text,
    /// JSON array with one list of field/value pairs per row
    Json,
}

/// Renders rows as `field=<name>, value=<value>` lines
pub fn render_text(rows: &[ResultRow]) -> String {
    let mut out = String::new();
    for row in rows {
        for field in row.iter() {
            out.push_str(&format!("field={}, value={}\n", field.field, field.value));
        }
    }
    out
}

/// Renders rows as a JSON array, one array of `{"field", "value"}` pairs per row
///
/// Pairs keep the order the service returned them in, repeated names included.
pub fn render_json(rows: &[ResultRow]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(rows)
}

/// Prints rows to stdout in the requested format
pub fn print_rows(rows: &[ResultRow], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => print!("{}", render_text(rows)),
        OutputFormat::Json => println!("{}", render_json(rows)?),
    }
    Ok(())
}

/// Prints a snapshot: status for text output, status and rows for JSON
pub fn print_snapshot(snapshot: &StatusSnapshot, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            println!("status={}, rows={}", snapshot.status, snapshot.row_count());
            print!("{}", render_text(&snapshot.rows));
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(snapshot)?),
    }
    Ok(())
}
