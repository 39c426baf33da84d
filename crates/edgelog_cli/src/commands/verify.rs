//! Verify command implementation.

use edgelog_core::{Config, LogReader, HEADER_SIZE};
use std::fs::File;
use std::path::Path;

/// Verification result.
#[derive(Debug)]
pub struct VerifyResult {
    /// Number of entries the header claims.
    pub entries_expected: u32,
    /// Number of entries checked.
    pub entries_checked: usize,
    /// Number of entries that decoded and passed the checks.
    pub valid_entries: usize,
    /// Bytes after the last counted entry.
    pub tail_bytes: u64,
    /// Problems that make the log unusable.
    pub errors: Vec<String>,
    /// Problems open tolerates.
    pub warnings: Vec<String>,
}

impl VerifyResult {
    fn new() -> Self {
        Self {
            entries_expected: 0,
            entries_checked: 0,
            valid_entries: 0,
            tail_bytes: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs the verify command.
pub fn run(log_path: &Path, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying local log at {:?}", log_path);
    println!();

    if !log_path.exists() {
        return Err(format!("No local log found at {:?}", log_path).into());
    }

    let result = verify_log(log_path, config)?;
    print_result(&result);

    println!();
    if result.is_ok() {
        println!("✓ Local log verification passed");
        Ok(())
    } else {
        println!("✗ Local log verification failed");
        Err("Verification failed".into())
    }
}

fn verify_log(
    log_path: &Path,
    config: &Config,
) -> Result<VerifyResult, Box<dyn std::error::Error>> {
    let mut result = VerifyResult::new();
    let mut file = File::open(log_path)?;
    let file_len = file.metadata()?.len();

    if file_len < HEADER_SIZE as u64 {
        result.errors.push(format!(
            "File is {} bytes, shorter than the {}-byte header",
            file_len, HEADER_SIZE
        ));
        return Ok(result);
    }

    let mut reader = match LogReader::new(&mut file, config.max_field_length) {
        Ok(reader) => reader,
        Err(e) => {
            result.errors.push(format!("Invalid header: {}", e));
            return Ok(result);
        }
    };
    let header = *reader.header();
    result.entries_expected = header.entries;

    let mut previous_seq: Option<u64> = None;
    let mut end = reader.position();
    let mut index = 0usize;
    while let Some(entry) = reader.next() {
        result.entries_checked += 1;
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                result.errors.push(format!(
                    "Entry #{} at offset {} does not decode: {}",
                    index, end, e
                ));
                break;
            }
        };

        let mut valid = true;
        if previous_seq.is_some_and(|prev| entry.seq <= prev) {
            result.errors.push(format!(
                "Entry #{} has seq {} after seq {}",
                index,
                entry.seq,
                previous_seq.unwrap_or_default()
            ));
            valid = false;
        }
        if entry.seq >= header.sequence {
            result.errors.push(format!(
                "Entry #{} has seq {} but the header sequence is {}",
                index, entry.seq, header.sequence
            ));
            valid = false;
        }
        if entry.events.is_empty() {
            result
                .warnings
                .push(format!("Entry #{} (seq {}) has no events", index, entry.seq));
        }
        if valid {
            result.valid_entries += 1;
        }
        previous_seq = Some(entry.seq);
        end = reader.position();
        index += 1;
    }

    if result.is_ok() {
        result.tail_bytes = file_len - end;
        if result.tail_bytes > 0 {
            result.warnings.push(format!(
                "{} bytes after the last entry; the next open truncates them",
                result.tail_bytes
            ));
        }
    }

    Ok(result)
}

fn print_result(result: &VerifyResult) {
    println!(
        "  Entries expected: {}, checked: {}, valid: {}",
        result.entries_expected, result.entries_checked, result.valid_entries
    );
    for warning in &result.warnings {
        println!("    WARNING: {}", warning);
    }
    for error in &result.errors {
        println!("    ERROR: {}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::SqliteExecutor;
    use edgelog_core::LocalLog;
    use std::fs::OpenOptions;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_log(dir: &TempDir, statements: usize) -> PathBuf {
        let path = dir.path().join("app.db-loc");
        let executor = SqliteExecutor::in_memory().unwrap();
        let mut log =
            LocalLog::open(&path, "dev", executor, Config::new().sync_on_write(false)).unwrap();
        for i in 0..statements {
            log.execute(&format!("SELECT {i}"), Vec::new(), &mut |_| {})
                .unwrap();
        }
        log.close().unwrap();
        path
    }

    #[test]
    fn healthy_log_passes() {
        let dir = TempDir::new().unwrap();
        let path = write_log(&dir, 3);
        let result = verify_log(&path, &Config::new()).unwrap();
        assert!(result.is_ok(), "{:?}", result.errors);
        assert_eq!(result.entries_expected, 3);
        assert_eq!(result.valid_entries, 3);
        assert_eq!(result.tail_bytes, 0);
    }

    #[test]
    fn incomplete_tail_is_a_warning() {
        let dir = TempDir::new().unwrap();
        let path = write_log(&dir, 2);
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[0xAB; 13]).unwrap();

        let result = verify_log(&path, &Config::new()).unwrap();
        assert!(result.is_ok());
        assert_eq!(result.tail_bytes, 13);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn truncated_entry_fails() {
        let dir = TempDir::new().unwrap();
        let path = write_log(&dir, 2);
        let len = std::fs::metadata(&path).unwrap().len();
        OpenOptions::new()
            .write(true)
            .open(&path)
            .unwrap()
            .set_len(len - 3)
            .unwrap();

        let result = verify_log(&path, &Config::new()).unwrap();
        assert!(!result.is_ok());
        assert_eq!(result.valid_entries, 1);
    }

    #[test]
    fn short_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short-loc");
        std::fs::write(&path, [0u8; 10]).unwrap();
        let result = verify_log(&path, &Config::new()).unwrap();
        assert!(!result.is_ok());
    }
}
