//! Inspect command implementation.

use edgelog_core::{Config, LocalLogHeader, LogReader};
use serde::Serialize;
use std::fs::File;
use std::path::Path;

/// Header inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Log file path.
    pub path: String,
    /// Log file size in bytes.
    pub file_size: u64,
    /// Magic number, hex-formatted.
    pub magic: String,
    /// Format version.
    pub version: u32,
    /// Reconciled upstream block.
    pub block_id: u64,
    /// Reconciled index within the block.
    pub block_index: u64,
    /// Sequence number of the next entry to publish.
    pub next_publish: u64,
    /// Sequence number for the next appended entry.
    pub sequence: u64,
    /// Entries stored in the file.
    pub entries: u32,
    /// Entries not yet published.
    pub unpublished: u64,
}

impl InspectResult {
    fn new(path: &Path, file_size: u64, header: &LocalLogHeader) -> Self {
        Self {
            path: path.display().to_string(),
            file_size,
            magic: format!("{:#010x}", header.magic),
            version: header.version,
            block_id: header.block_id,
            block_index: header.block_index,
            next_publish: header.next_publish,
            sequence: header.sequence,
            entries: header.entries,
            unpublished: header.unpublished(),
        }
    }
}

/// Runs the inspect command.
pub fn run(
    log_path: &Path,
    config: &Config,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if !log_path.exists() {
        return Err(format!("No local log found at {:?}", log_path).into());
    }

    let mut file = File::open(log_path)?;
    let file_size = file.metadata()?.len();
    let reader = LogReader::new(&mut file, config.max_field_length)?;
    let result = InspectResult::new(log_path, file_size, reader.header());

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("Local Log: {}", result.path);
    println!("================");
    println!();
    println!("File size:     {} bytes", result.file_size);
    println!("Magic:         {}", result.magic);
    println!("Version:       {}", result.version);
    println!("Position:      block:{}.{}", result.block_id, result.block_index);
    println!("Sequence:      {}", result.sequence);
    println!("Entries:       {}", result.entries);
    println!("Next publish:  {}", result.next_publish);
    println!("Unpublished:   {}", result.unpublished);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::SqliteExecutor;
    use edgelog_core::LocalLog;
    use tempfile::TempDir;

    #[test]
    fn inspect_reports_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.db-loc");
        let config = Config::new().sync_on_write(false);
        let executor = SqliteExecutor::in_memory().unwrap();
        let mut log = LocalLog::open(&path, "dev", executor, config.clone()).unwrap();
        log.execute("SELECT 1", Vec::new(), &mut |_| {}).unwrap();
        log.close().unwrap();

        let mut file = File::open(&path).unwrap();
        let reader = LogReader::new(&mut file, config.max_field_length).unwrap();
        let result = InspectResult::new(&path, 0, reader.header());
        assert_eq!(result.entries, 1);
        assert_eq!(result.sequence, 1);
        assert_eq!(result.unpublished, 1);

        run(&path, &config, "json").unwrap();
    }

    #[test]
    fn missing_log_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(run(&dir.path().join("none-loc"), &Config::new(), "text").is_err());
    }
}
