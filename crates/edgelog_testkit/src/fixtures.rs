//! Test fixtures and log helpers.
//!
//! Provides executors that record what they are asked to run, builders for
//! entries in the shapes merge and publish expect, and a temporary log
//! directory that outlives individual sessions.

use edgelog_core::{
    BlockPosition, Config, Event, Executor, ExecutorError, LocalLog, LogEntry, Row,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// An executor that accepts every statement and remembers it.
#[derive(Debug, Default, Clone)]
pub struct RecordingExecutor {
    /// Statements executed, in order.
    pub executed: Vec<Event>,
    rows: Vec<(Vec<String>, Vec<Option<String>>)>,
}

impl RecordingExecutor {
    /// Creates an executor with no canned rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every statement produce `values` as one result row.
    #[must_use]
    pub fn with_row(mut self, columns: &[&str], values: &[Option<&str>]) -> Self {
        self.rows.push((
            columns.iter().map(|c| c.to_string()).collect(),
            values.iter().map(|v| v.map(String::from)).collect(),
        ));
        self
    }

    /// Patterns of the executed statements.
    pub fn patterns(&self) -> Vec<&str> {
        self.executed.iter().map(|e| e.pattern.as_str()).collect()
    }
}

impl Executor for RecordingExecutor {
    fn execute(
        &mut self,
        statement: &Event,
        on_row: &mut dyn FnMut(Row<'_>),
    ) -> Result<(), ExecutorError> {
        self.executed.push(statement.clone());
        for (columns, values) in &self.rows {
            on_row(Row { columns, values });
        }
        Ok(())
    }
}

/// An executor that rejects selected statements.
#[derive(Debug, Default, Clone)]
pub struct FailingExecutor {
    /// Statements that succeeded, in order.
    pub executed: Vec<Event>,
    needle: Option<String>,
    fail_call: Option<usize>,
    calls: usize,
}

impl FailingExecutor {
    /// Fails every statement whose pattern contains `needle`.
    pub fn on_pattern(needle: impl Into<String>) -> Self {
        Self {
            needle: Some(needle.into()),
            ..Self::default()
        }
    }

    /// Fails only the `n`-th call (1-based).
    pub fn on_call(n: usize) -> Self {
        Self {
            fail_call: Some(n),
            ..Self::default()
        }
    }

    /// Number of calls seen, failed or not.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl Executor for FailingExecutor {
    fn execute(
        &mut self,
        statement: &Event,
        _on_row: &mut dyn FnMut(Row<'_>),
    ) -> Result<(), ExecutorError> {
        self.calls += 1;
        let by_pattern = self
            .needle
            .as_deref()
            .is_some_and(|n| statement.pattern.contains(n));
        if by_pattern || self.fail_call == Some(self.calls) {
            return Err(ExecutorError::with_code(1, format!("rejected: {}", statement.pattern)));
        }
        self.executed.push(statement.clone());
        Ok(())
    }
}

/// Builds a local entry with one statement.
pub fn local_entry(client_id: &str, seq: u64, sql: &str) -> LogEntry {
    LogEntry::new(client_id)
        .with_seq(seq)
        .with_event(Event::new(sql))
}

/// Builds a confirmed upstream entry at `block_id.block_index`.
pub fn upstream_entry(client_id: &str, seq: u64, block_id: u64, block_index: u64) -> LogEntry {
    LogEntry::new(client_id)
        .with_seq(seq)
        .at(BlockPosition::new(block_id, block_index))
        .with_event(Event::new(format!("upstream {client_id}:{seq}")))
}

/// Configuration used by fixtures: no fsync.
pub fn test_config() -> Config {
    Config::new().sync_on_write(false)
}

/// A log file inside a temporary directory.
///
/// The directory lives as long as this value, so the log can be closed and
/// reopened any number of times.
pub struct TempLog {
    dir: TempDir,
    path: PathBuf,
    client_id: String,
}

impl TempLog {
    /// Creates an empty directory for a log owned by client `"A"`.
    pub fn new() -> Self {
        Self::for_client("A")
    }

    /// Creates an empty directory for a log owned by `client_id`.
    pub fn for_client(client_id: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("test.db-loc");
        Self {
            dir,
            path,
            client_id: client_id.to_string(),
        }
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the log.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Client id used by [`TempLog::open`].
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Opens the log with [`test_config`].
    pub fn open<E: Executor>(&self, executor: E) -> LocalLog<E> {
        self.open_with(executor, test_config())
    }

    /// Opens the log with an explicit configuration.
    pub fn open_with<E: Executor>(&self, executor: E, config: Config) -> LocalLog<E> {
        LocalLog::open(&self.path, self.client_id.as_str(), executor, config)
            .expect("Failed to open local log")
    }

    /// Opens a log and appends one statement per item in `statements`.
    pub fn populated(&self, statements: &[&str]) -> LocalLog<RecordingExecutor> {
        let mut log = self.open(RecordingExecutor::new());
        for sql in statements {
            log.execute(sql, Vec::new(), &mut |_| {})
                .expect("Failed to execute statement");
        }
        log
    }
}

impl Default for TempLog {
    fn default() -> Self {
        Self::new()
    }
}
