//! The local log session.

use super::header::{LocalLogHeader, HEADER_SIZE};
use super::reader::{read_snapshot, LogReader, LogSnapshot};
use crate::config::{Config, ReplayMode};
use crate::error::{CoreError, CoreResult};
use crate::executor::{Executor, Row};
use crate::merge::{merge, MergeOutcome};
use crate::record::{Argument, Event, LogEntry};
use crate::types::BlockPosition;
use edgelog_codec::{Buffer, Encode};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// An open local log.
///
/// The session holds an exclusive advisory lock on the file for its whole
/// lifetime, so at most one `LocalLog` per path exists across processes.
///
/// # File discipline
///
/// Appends are two-phase: the entry is written and flushed at the end of
/// the last counted entry, then the header is rewritten at offset 0. The
/// in-memory header only changes once the header write succeeds, so a
/// failed append leaves the session describing exactly what the on-disk
/// header counts.
///
/// # Example
///
/// ```rust,ignore
/// use edgelog_core::{Config, LocalLog};
///
/// let mut log = LocalLog::open("app.db-loc", "device-1", executor, Config::default())?;
/// let seq = log.execute("INSERT INTO t VALUES (?)", vec![Argument::positional(1i64)], &mut |_| {})?;
/// let executor = log.close()?;
/// ```
pub struct LocalLog<E> {
    path: PathBuf,
    file: File,
    header: LocalLogHeader,
    /// Offset just past the last counted entry.
    end_offset: u64,
    client_id: String,
    config: Config,
    executor: E,
    replayed: usize,
}

impl<E: Executor> LocalLog<E> {
    /// Opens the log at `path` for `client_id`, creating it if missing.
    ///
    /// An existing log is read in full and each entry is replayed against
    /// `executor` according to [`Config::replay`]. Bytes after the last
    /// counted entry are treated as an interrupted append and truncated.
    ///
    /// # Errors
    ///
    /// - [`CoreError::LogLocked`] if another session holds the file
    /// - [`CoreError::InvalidFormat`] if the file is missing and
    ///   `create_if_missing` is false
    /// - decode, validation and executor errors from replay
    pub fn open(
        path: impl AsRef<Path>,
        client_id: impl Into<String>,
        mut executor: E,
        config: Config,
    ) -> CoreResult<Self> {
        let path = path.as_ref();
        if !path.exists() && !config.create_if_missing {
            return Err(CoreError::invalid_format(format!(
                "log file does not exist: {}",
                path.display()
            )));
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(config.create_if_missing)
            .truncate(false)
            .open(path)?;

        if file.try_lock_exclusive().is_err() {
            return Err(CoreError::LogLocked);
        }

        let file_len = file.metadata()?.len();
        let (header, end_offset, replayed) = if file_len == 0 {
            let header = LocalLogHeader::new();
            write_header(&mut file, &header, config.sync_on_write)?;
            info!(path = %path.display(), "created local log");
            (header, HEADER_SIZE as u64, 0)
        } else {
            let (header, end_offset, replayed) =
                replay(&mut file, &mut executor, &config)?;
            if file_len > end_offset {
                warn!(
                    path = %path.display(),
                    tail = file_len - end_offset,
                    "truncating incomplete tail"
                );
                file.set_len(end_offset)?;
                if config.sync_on_write {
                    file.sync_all()?;
                }
            }
            info!(
                path = %path.display(),
                entries = header.entries,
                sequence = header.sequence,
                next_publish = header.next_publish,
                replayed,
                "opened local log"
            );
            (header, end_offset, replayed)
        };

        file.seek(SeekFrom::Start(end_offset))?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            header,
            end_offset,
            client_id: client_id.into(),
            config,
            executor,
            replayed,
        })
    }

    /// Runs `sql` with `args` and appends it on success.
    ///
    /// Returns the sequence number assigned to the new entry. A statement
    /// the executor rejects is never logged.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Executor`] verbatim on executor failure, or the
    /// errors of [`LocalLog::append`].
    pub fn execute(
        &mut self,
        sql: &str,
        args: Vec<Argument>,
        on_row: &mut dyn FnMut(Row<'_>),
    ) -> CoreResult<u64> {
        let event = Event::new(sql).with_args(args);
        self.executor.execute(&event, on_row)?;
        let mut entry = LogEntry::new(self.client_id.clone()).with_event(event);
        self.append(&mut entry)
    }

    /// Returns the executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Returns the executor mutably.
    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    /// Releases the file and its lock and hands back the executor.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the final sync fails.
    pub fn close(self) -> CoreResult<E> {
        if self.config.sync_on_write {
            self.file.sync_all()?;
        }
        // Closing the handle drops the lock as well; unlock explicitly so
        // failures surface here.
        FileExt::unlock(&self.file)?;
        debug!(path = %self.path.display(), "closed local log");
        Ok(self.executor)
    }
}

impl<E> LocalLog<E> {
    /// Appends `entry`, assigning it the next sequence number.
    ///
    /// Whatever `entry.seq` held is overwritten. Returns the assigned
    /// sequence number.
    ///
    /// # Errors
    ///
    /// On failure the entry may be physically present but is not counted;
    /// the next append overwrites it and reopening truncates it.
    pub fn append(&mut self, entry: &mut LogEntry) -> CoreResult<u64> {
        let mut next = self.header;
        next.entries = next
            .entries
            .checked_add(1)
            .ok_or_else(|| CoreError::invalid_operation("entry count overflow"))?;
        next.sequence = next
            .sequence
            .checked_add(1)
            .ok_or_else(|| CoreError::invalid_operation("sequence overflow"))?;

        entry.seq = self.header.sequence;

        self.file.seek(SeekFrom::Start(self.end_offset))?;
        let written = {
            let mut buf = Buffer::bound(&mut self.file);
            entry.encode(&mut buf)?;
            buf.flush()?
        };
        if self.config.sync_on_write {
            self.file.sync_data()?;
        }

        write_header(&mut self.file, &next, self.config.sync_on_write)?;
        self.header = next;
        self.end_offset += written as u64;
        self.file.seek(SeekFrom::Start(self.end_offset))?;

        debug!(seq = entry.seq, bytes = written, "appended entry");
        Ok(entry.seq)
    }

    /// Re-reads the header and every counted entry from disk.
    ///
    /// # Errors
    ///
    /// Returns decode errors if the file no longer parses.
    pub fn read_entries(&mut self) -> CoreResult<LogSnapshot> {
        let file_len = self.file.metadata()?.len();
        self.file.seek(SeekFrom::Start(0))?;
        let snapshot = read_snapshot(&mut self.file, self.config.max_field_length, file_len);
        self.file.seek(SeekFrom::Start(self.end_offset))?;
        snapshot
    }

    /// Merges `upstream` with this log's entries.
    ///
    /// The file is not modified; see [`LocalLog::commit_position`].
    ///
    /// # Errors
    ///
    /// Returns read errors or [`CoreError::MergeIntegrity`].
    pub fn merge(&mut self, upstream: Vec<LogEntry>) -> CoreResult<MergeOutcome> {
        let snapshot = self.read_entries()?;
        merge(
            &self.client_id,
            snapshot.header.position(),
            snapshot.entries,
            upstream,
        )
    }

    /// Records that the log is reconciled up to `position`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] if `position` is behind the
    /// current one.
    pub fn commit_position(&mut self, position: BlockPosition) -> CoreResult<()> {
        if position < self.header.position() {
            return Err(CoreError::invalid_operation(format!(
                "{position} is behind {}",
                self.header.position()
            )));
        }
        let mut next = self.header;
        next.block_id = position.block_id;
        next.block_index = position.block_index;
        self.commit_header(next)
    }

    /// Advances the publish cursor by one and persists the header.
    ///
    /// Returns the new cursor.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] if every entry is already
    /// published, or an I/O error if the header write fails.
    pub fn advance_publish_cursor(&mut self) -> CoreResult<u64> {
        if self.header.next_publish >= self.header.sequence {
            return Err(CoreError::invalid_operation(
                "publish cursor is already at the sequence counter",
            ));
        }
        let mut next = self.header;
        next.next_publish += 1;
        self.commit_header(next)?;
        Ok(self.header.next_publish)
    }

    /// The in-memory header, matching the last successful header write.
    #[must_use]
    pub fn header(&self) -> &LocalLogHeader {
        &self.header
    }

    /// This session's client id.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries replayed when the log was opened.
    ///
    /// Only entries that dispatched at least one event count; entries with
    /// no events are skipped.
    #[must_use]
    pub fn replayed(&self) -> usize {
        self.replayed
    }

    fn commit_header(&mut self, next: LocalLogHeader) -> CoreResult<()> {
        write_header(&mut self.file, &next, self.config.sync_on_write)?;
        self.header = next;
        self.file.seek(SeekFrom::Start(self.end_offset))?;
        Ok(())
    }
}

impl<E> std::fmt::Debug for LocalLog<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalLog")
            .field("path", &self.path)
            .field("client_id", &self.client_id)
            .field("header", &self.header)
            .field("end_offset", &self.end_offset)
            .finish_non_exhaustive()
    }
}

fn write_header(file: &mut File, header: &LocalLogHeader, sync: bool) -> CoreResult<()> {
    file.seek(SeekFrom::Start(0))?;
    let mut buf = Buffer::bound(&mut *file);
    header.encode(&mut buf)?;
    buf.flush()?;
    drop(buf);
    if sync {
        file.sync_data()?;
    }
    Ok(())
}

/// Streams every counted entry into the executor.
///
/// Returns the header, the end offset of the last counted entry and the
/// number of entries replayed.
fn replay<E: Executor>(
    file: &mut File,
    executor: &mut E,
    config: &Config,
) -> CoreResult<(LocalLogHeader, u64, usize)> {
    file.seek(SeekFrom::Start(0))?;
    let mut reader = LogReader::new(file, config.max_field_length)?;
    let mut replayed = 0;
    for entry in reader.by_ref() {
        let entry = entry?;
        let events = match config.replay {
            ReplayMode::FirstEvent => &entry.events[..entry.events.len().min(1)],
            ReplayMode::AllEvents => &entry.events[..],
        };
        if events.is_empty() {
            warn!(seq = entry.seq, "entry has no events, nothing to replay");
            continue;
        }
        for event in events {
            debug!(seq = entry.seq, pattern = %event.pattern, "replaying");
            executor.execute(event, &mut |_| {})?;
        }
        replayed += 1;
    }
    Ok((*reader.header(), reader.position(), replayed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ExecutorError;
    use crate::record::Value;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<Event>,
        fail_on: Option<String>,
    }

    impl Executor for Recorder {
        fn execute(
            &mut self,
            statement: &Event,
            _on_row: &mut dyn FnMut(Row<'_>),
        ) -> Result<(), ExecutorError> {
            if self.fail_on.as_deref() == Some(statement.pattern.as_str()) {
                return Err(ExecutorError::new("no such table: t"));
            }
            self.seen.push(statement.clone());
            Ok(())
        }
    }

    fn config() -> Config {
        Config::new().sync_on_write(false)
    }

    fn open(dir: &TempDir) -> LocalLog<Recorder> {
        LocalLog::open(dir.path().join("db-loc"), "A", Recorder::default(), config()).unwrap()
    }

    #[test]
    fn create_writes_fresh_header() {
        let dir = TempDir::new().unwrap();
        let log = open(&dir);
        assert_eq!(*log.header(), LocalLogHeader::new());
        assert_eq!(
            fs::metadata(log.path()).unwrap().len(),
            HEADER_SIZE as u64
        );
        assert_eq!(log.replayed(), 0);
    }

    #[test]
    fn missing_file_without_create() {
        let dir = TempDir::new().unwrap();
        let err = LocalLog::open(
            dir.path().join("absent"),
            "A",
            Recorder::default(),
            config().create_if_missing(false),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidFormat { .. }));
    }

    #[test]
    fn append_assigns_sequence_and_updates_header() {
        let dir = TempDir::new().unwrap();
        let mut log = open(&dir);
        for expected in 0..3 {
            let mut entry = LogEntry::new("A").with_seq(99).with_event(Event::new("x"));
            assert_eq!(log.append(&mut entry).unwrap(), expected);
            assert_eq!(entry.seq, expected);
        }
        assert_eq!(log.header().sequence, 3);
        assert_eq!(log.header().entries, 3);

        let snapshot = log.read_entries().unwrap();
        assert_eq!(snapshot.header, *log.header());
        let seqs: Vec<u64> = snapshot.entries.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert_eq!(snapshot.tail_bytes(), 0);
    }

    #[test]
    fn execute_logs_only_successful_statements() {
        let dir = TempDir::new().unwrap();
        let mut log = open(&dir);
        log.executor_mut().fail_on = Some("bad".into());

        let args = vec![Argument::positional(Value::Int(1))];
        assert_eq!(log.execute("good", args.clone(), &mut |_| {}).unwrap(), 0);
        let err = log.execute("bad", Vec::new(), &mut |_| {}).unwrap_err();
        assert!(matches!(err, CoreError::Executor(_)));
        assert_eq!(log.header().entries, 1);

        let snapshot = log.read_entries().unwrap();
        assert_eq!(snapshot.entries[0].client_id, "A");
        assert_eq!(snapshot.entries[0].events, vec![Event::new("good").with_args(args)]);
    }

    #[test]
    fn reopen_replays_first_event_of_each_entry() {
        let dir = TempDir::new().unwrap();
        let mut log = open(&dir);
        log.execute("one", Vec::new(), &mut |_| {}).unwrap();
        let mut multi = LogEntry::new("A")
            .with_event(Event::new("two"))
            .with_event(Event::new("two-b"));
        log.append(&mut multi).unwrap();
        let mut empty = LogEntry::new("A");
        log.append(&mut empty).unwrap();
        log.close().unwrap();

        let log = open(&dir);
        assert_eq!(log.header().entries, 3);
        assert_eq!(log.replayed(), 2);
        let patterns: Vec<&str> = log
            .executor()
            .seen
            .iter()
            .map(|e| e.pattern.as_str())
            .collect();
        assert_eq!(patterns, vec!["one", "two"]);
    }

    #[test]
    fn reopen_can_replay_all_events() {
        let dir = TempDir::new().unwrap();
        let mut log = open(&dir);
        let mut multi = LogEntry::new("A")
            .with_event(Event::new("a"))
            .with_event(Event::new("b"));
        log.append(&mut multi).unwrap();
        log.close().unwrap();

        let log = LocalLog::open(
            dir.path().join("db-loc"),
            "A",
            Recorder::default(),
            config().replay(ReplayMode::AllEvents),
        )
        .unwrap();
        assert_eq!(log.executor().seen.len(), 2);
    }

    #[test]
    fn replay_failure_fails_open() {
        let dir = TempDir::new().unwrap();
        let mut log = open(&dir);
        log.execute("boom", Vec::new(), &mut |_| {}).unwrap();
        log.close().unwrap();

        let recorder = Recorder {
            fail_on: Some("boom".into()),
            ..Recorder::default()
        };
        let err = LocalLog::open(dir.path().join("db-loc"), "A", recorder, config()).unwrap_err();
        assert!(matches!(err, CoreError::Executor(_)));
    }

    #[test]
    fn second_session_is_locked_out() {
        let dir = TempDir::new().unwrap();
        let _log = open(&dir);
        let err = LocalLog::open(dir.path().join("db-loc"), "A", Recorder::default(), config())
            .unwrap_err();
        assert!(matches!(err, CoreError::LogLocked));
    }

    #[test]
    fn close_releases_lock() {
        let dir = TempDir::new().unwrap();
        open(&dir).close().unwrap();
        open(&dir).close().unwrap();
    }

    #[test]
    fn incomplete_tail_is_truncated_and_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db-loc");
        let mut log = open(&dir);
        log.execute("first", Vec::new(), &mut |_| {}).unwrap();
        log.close().unwrap();
        let counted_len = fs::metadata(&path).unwrap().len();

        // An entry flushed without its header update.
        let mut bytes = fs::read(&path).unwrap();
        bytes.extend_from_slice(&[0xEE; 37]);
        fs::write(&path, &bytes).unwrap();

        let mut log = open(&dir);
        assert_eq!(fs::metadata(&path).unwrap().len(), counted_len);
        log.execute("second", Vec::new(), &mut |_| {}).unwrap();
        let snapshot = log.read_entries().unwrap();
        assert_eq!(snapshot.entries.len(), 2);
        assert_eq!(snapshot.entries[1].events[0].pattern, "second");
        assert_eq!(snapshot.entries[1].seq, 1);
    }

    #[test]
    fn corrupt_header_fails_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db-loc");
        fs::write(&path, [0u8; HEADER_SIZE]).unwrap();
        let err = LocalLog::open(&path, "A", Recorder::default(), config()).unwrap_err();
        assert!(matches!(err, CoreError::ProtocolMismatch { .. }));

        fs::write(&path, [1u8; 7]).unwrap();
        let err = LocalLog::open(&path, "A", Recorder::default(), config()).unwrap_err();
        assert!(err.is_shortfall());
    }

    #[test]
    fn publish_cursor_is_persisted() {
        let dir = TempDir::new().unwrap();
        let mut log = open(&dir);
        assert!(log.advance_publish_cursor().is_err());
        log.execute("a", Vec::new(), &mut |_| {}).unwrap();
        log.execute("b", Vec::new(), &mut |_| {}).unwrap();
        assert_eq!(log.advance_publish_cursor().unwrap(), 1);
        log.close().unwrap();

        let mut log = open(&dir);
        assert_eq!(log.header().next_publish, 1);
        assert_eq!(log.header().unpublished(), 1);
        // Appending after a cursor move still lands after the last entry.
        log.execute("c", Vec::new(), &mut |_| {}).unwrap();
        assert_eq!(log.read_entries().unwrap().entries.len(), 3);
    }

    #[test]
    fn merge_uses_entries_on_disk() {
        let dir = TempDir::new().unwrap();
        let mut log = open(&dir);
        for sql in ["a", "b", "c"] {
            log.execute(sql, Vec::new(), &mut |_| {}).unwrap();
        }
        let confirmed = LogEntry::new("A")
            .with_seq(1)
            .at(BlockPosition::new(7, 0))
            .with_event(Event::new("b"));
        let out = log.merge(vec![confirmed.clone()]).unwrap();
        assert_eq!(out.commit_point, 1);
        assert_eq!(out.merged[0], confirmed);
        assert_eq!(out.pending().len(), 1);
        assert_eq!(out.pending()[0].seq, 2);

        log.commit_position(BlockPosition::new(7, 0)).unwrap();
        assert!(log.commit_position(BlockPosition::new(6, 9)).is_err());
        assert_eq!(log.header().position(), BlockPosition::new(7, 0));
        // Already reconciled upstream is now stale.
        let out = log.merge(vec![confirmed]).unwrap();
        assert_eq!(out.commit_point, 0);
        assert_eq!(out.merged.len(), 3);
    }
}
