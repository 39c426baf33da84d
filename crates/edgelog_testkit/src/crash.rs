//! Crash simulation on local log files.
//!
//! An append writes the entry first and the header second. A crash between
//! the two leaves bytes past the last counted entry; a crash during the
//! entry write leaves a partial record there. These helpers reproduce both
//! states on a closed log file.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use edgelog_testkit::prelude::*;
//!
//! let temp = TempLog::new();
//! temp.populated(&["a"]).close().unwrap();
//! append_uncounted_entry(temp.path(), &local_entry("A", 1, "b")).unwrap();
//! let log = temp.open(RecordingExecutor::new());
//! assert_eq!(log.header().entries, 1);
//! ```

use edgelog_core::{Encode, LogEntry};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Points at which an append can be interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrashPoint {
    /// Part of the entry reached the file.
    DuringEntryWrite,
    /// The whole entry reached the file but the header was not updated.
    BeforeHeaderWrite,
}

/// Appends bytes as an interrupted append at `point` would leave them.
///
/// Returns the number of bytes added.
pub fn simulate_crash(path: &Path, entry: &LogEntry, point: CrashPoint) -> io::Result<u64> {
    match point {
        CrashPoint::DuringEntryWrite => append_partial_entry(path, entry),
        CrashPoint::BeforeHeaderWrite => append_uncounted_entry(path, entry),
    }
}

/// Appends a complete encoded entry without touching the header.
pub fn append_uncounted_entry(path: &Path, entry: &LogEntry) -> io::Result<u64> {
    let bytes = encode(entry)?;
    append_bytes(path, &bytes)
}

/// Appends the first half of an encoded entry.
pub fn append_partial_entry(path: &Path, entry: &LogEntry) -> io::Result<u64> {
    let bytes = encode(entry)?;
    append_bytes(path, &bytes[..bytes.len() / 2])
}

/// Appends `len` bytes of a repeating non-zero pattern.
pub fn append_garbage(path: &Path, len: usize) -> io::Result<u64> {
    let garbage: Vec<u8> = (0..len).map(|i| 0xA5 ^ (i as u8)).collect();
    append_bytes(path, &garbage)
}

/// Cuts `len` bytes off the end of the file.
pub fn truncate_tail(path: &Path, len: u64) -> io::Result<u64> {
    let current = file_len(path)?;
    let new_len = current.saturating_sub(len);
    OpenOptions::new().write(true).open(path)?.set_len(new_len)?;
    Ok(current - new_len)
}

/// Current length of the file.
pub fn file_len(path: &Path) -> io::Result<u64> {
    Ok(fs::metadata(path)?.len())
}

fn encode(entry: &LogEntry) -> io::Result<Vec<u8>> {
    entry
        .to_bytes()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))
}

fn append_bytes(path: &Path, bytes: &[u8]) -> io::Result<u64> {
    let mut file = OpenOptions::new().append(true).open(path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(bytes.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{local_entry, RecordingExecutor, TempLog};

    #[test]
    fn uncounted_entry_is_dropped_on_open() {
        let temp = TempLog::new();
        temp.populated(&["a"]).close().unwrap();
        let clean_len = file_len(temp.path()).unwrap();

        let added =
            simulate_crash(temp.path(), &local_entry("A", 1, "b"), CrashPoint::BeforeHeaderWrite)
                .unwrap();
        assert!(added > 0);

        let log = temp.open(RecordingExecutor::new());
        assert_eq!(log.header().entries, 1);
        assert_eq!(log.executor().patterns(), vec!["a"]);
        assert_eq!(file_len(temp.path()).unwrap(), clean_len);
    }

    #[test]
    fn partial_entry_is_dropped_on_open() {
        let temp = TempLog::new();
        temp.populated(&["a", "b"]).close().unwrap();
        simulate_crash(temp.path(), &local_entry("A", 2, "c"), CrashPoint::DuringEntryWrite)
            .unwrap();

        let mut log = temp.open(RecordingExecutor::new());
        assert_eq!(log.header().entries, 2);
        let seq = log.execute("d", Vec::new(), &mut |_| {}).unwrap();
        assert_eq!(seq, 2);
    }

    #[test]
    fn truncate_tail_is_bounded_by_length() {
        let temp = TempLog::new();
        temp.populated(&[]).close().unwrap();
        let len = file_len(temp.path()).unwrap();
        assert_eq!(truncate_tail(temp.path(), len + 10).unwrap(), len);
        assert_eq!(file_len(temp.path()).unwrap(), 0);
    }
}
