//! Dump command implementation.

use crate::render::{print_entry, EntryInfo};
use edgelog_core::{read_log, Config};
use std::path::Path;

/// Runs the dump command.
pub fn run(
    log_path: &Path,
    config: &Config,
    limit: Option<usize>,
    skip: usize,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = read_log(log_path, config)?;
    let entries = snapshot
        .entries
        .iter()
        .skip(skip)
        .take(limit.unwrap_or(usize::MAX));

    match format {
        "json" => {
            let infos: Vec<EntryInfo> = entries.map(EntryInfo::from).collect();
            println!("{}", serde_json::to_string_pretty(&infos)?);
        }
        _ => {
            println!("Log Entries ({} total)", snapshot.entries.len());
            println!("================");
            println!();
            for entry in entries {
                let marker = if entry.seq < snapshot.header.next_publish {
                    "  "
                } else {
                    "* "
                };
                print_entry(marker, entry);
            }
            if snapshot.header.unpublished() > 0 {
                println!();
                println!("* not yet published");
            }
            if snapshot.tail_bytes() > 0 {
                println!();
                println!(
                    "{} bytes after the last entry (incomplete write)",
                    snapshot.tail_bytes()
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::SqliteExecutor;
    use edgelog_core::LocalLog;
    use tempfile::TempDir;

    #[test]
    fn dump_handles_both_formats() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.db-loc");
        let config = Config::new().sync_on_write(false);
        let executor = SqliteExecutor::in_memory().unwrap();
        let mut log = LocalLog::open(&path, "dev", executor, config.clone()).unwrap();
        for sql in ["SELECT 1", "SELECT 2", "SELECT 3"] {
            log.execute(sql, Vec::new(), &mut |_| {}).unwrap();
        }
        log.close().unwrap();

        run(&path, &config, Some(1), 1, "json").unwrap();
        run(&path, &config, None, 0, "text").unwrap();
        run(&path, &config, None, 10, "text").unwrap();
    }
}
