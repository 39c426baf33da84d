//! Merge command implementation.

use crate::render::{print_entry, EntryInfo};
use crate::sqlite::SqliteExecutor;
use edgelog_core::{entries_from_json_slice, log_path_for, Config, LocalLog};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Merge output.
#[derive(Debug, Serialize)]
pub struct MergeReport {
    /// Number of leading entries confirmed upstream.
    pub commit_point: usize,
    /// Block position of the last confirmed entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_position: Option<String>,
    /// Whether the position was written to the log header.
    pub committed: bool,
    /// Merged order.
    pub merged: Vec<EntryInfo>,
}

/// Runs the merge command.
///
/// `upstream` is a JSON array of entries carrying their block positions.
pub fn run(
    path: &Path,
    client_id: &str,
    upstream: &Path,
    commit: bool,
    config: Config,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let upstream_entries = entries_from_json_slice(&fs::read(upstream)?)?;
    let upstream_count = upstream_entries.len();

    let executor = SqliteExecutor::open(path)?;
    let mut log = LocalLog::open(log_path_for(path), client_id, executor, config)?;
    let outcome = log.merge(upstream_entries)?;

    let position = outcome.confirmed_position();
    let committed = match position {
        Some(position) if commit && position > log.header().position() => {
            log.commit_position(position)?;
            true
        }
        _ => false,
    };

    match format {
        "json" => {
            let report = MergeReport {
                commit_point: outcome.commit_point,
                confirmed_position: position.map(|p| p.to_string()),
                committed,
                merged: outcome.merged.iter().map(EntryInfo::from).collect(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!(
                "Merged {} upstream entries with {} local entries",
                upstream_count,
                log.header().entries
            );
            println!("================");
            println!();
            for (i, entry) in outcome.merged.iter().enumerate() {
                let marker = if i < outcome.commit_point { "  " } else { "* " };
                print_entry(marker, entry);
            }
            println!();
            println!("Commit point: {}", outcome.commit_point);
            if outcome.commit_point < outcome.merged.len() {
                println!("* pending upstream confirmation");
            }
            if let Some(position) = position {
                if committed {
                    println!("Committed position {}", position);
                } else {
                    println!("Confirmed position {}", position);
                }
            }
        }
    }

    log.close()?;
    Ok(())
}
