//! Streaming reader over a local log.
//!
//! The reader decodes the header, then yields exactly `header.entries`
//! records. Bytes after the last counted record are an incomplete tail left
//! by a crash between the entry flush and the header flush; the reader never
//! interprets them.

use super::header::{LocalLogHeader, HEADER_SIZE};
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::record::LogEntry;
use edgelog_codec::{Buffer, Decode, Stream};
use std::fs::File;
use std::path::Path;

/// Streams the entries of a log from its first byte.
///
/// # Example
///
/// ```ignore
/// let mut reader = LogReader::new(&mut file, config.max_field_length)?;
/// for entry in reader.by_ref() {
///     let entry = entry?;
///     // ...
/// }
/// let end = reader.position();
/// ```
pub struct LogReader<'s> {
    buf: Buffer<'s>,
    header: LocalLogHeader,
    remaining: u32,
    failed: bool,
}

impl<'s> LogReader<'s> {
    /// Decodes and validates the header.
    ///
    /// `stream` must be positioned at offset 0.
    ///
    /// # Errors
    ///
    /// Returns a shortfall error if the header is incomplete and a format
    /// error if it fails validation.
    pub fn new(stream: &'s mut dyn Stream, max_field_length: u32) -> CoreResult<Self> {
        let mut buf = Buffer::bound(stream).with_max_length(max_field_length);
        let header = LocalLogHeader::decode(&mut buf)?;
        header.validate()?;
        Ok(Self {
            buf,
            remaining: header.entries,
            header,
            failed: false,
        })
    }

    /// The decoded header.
    #[must_use]
    pub fn header(&self) -> &LocalLogHeader {
        &self.header
    }

    /// Byte offset just past the last record read.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.buf.position()
    }
}

impl Iterator for LogReader<'_> {
    type Item = CoreResult<LogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 || self.failed {
            return None;
        }
        let index = self.header.entries - self.remaining;
        match LogEntry::decode(&mut self.buf) {
            Ok(entry) => {
                self.remaining -= 1;
                Some(Ok(entry))
            }
            Err(e) => {
                self.failed = true;
                tracing::debug!(index, error = %e, "failed to decode entry");
                Some(Err(e.into()))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        (0, Some(self.remaining as usize))
    }
}

/// A fully decoded log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSnapshot {
    /// Header as stored on disk.
    pub header: LocalLogHeader,
    /// Every counted entry, in append order.
    pub entries: Vec<LogEntry>,
    /// Offset just past the last counted entry.
    pub end_offset: u64,
    /// Physical file length.
    pub file_len: u64,
}

impl LogSnapshot {
    /// Bytes after the last counted entry.
    #[must_use]
    pub fn tail_bytes(&self) -> u64 {
        self.file_len.saturating_sub(self.end_offset)
    }
}

/// Decodes header and all entries from `stream`, positioned at offset 0.
pub(crate) fn read_snapshot(
    stream: &mut dyn Stream,
    max_field_length: u32,
    file_len: u64,
) -> CoreResult<LogSnapshot> {
    let mut reader = LogReader::new(stream, max_field_length)?;
    let entries = reader.by_ref().collect::<CoreResult<Vec<_>>>()?;
    Ok(LogSnapshot {
        header: *reader.header(),
        entries,
        end_offset: reader.position(),
        file_len,
    })
}

/// Reads a log without locking it or replaying anything.
///
/// Intended for inspection tools; a live session may append concurrently.
///
/// # Errors
///
/// Returns [`CoreError::Io`] if the file cannot be opened and the decode
/// errors of [`LogReader`] otherwise.
pub fn read_log(path: &Path, config: &Config) -> CoreResult<LogSnapshot> {
    let mut file = File::open(path)?;
    let file_len = file.metadata()?.len();
    if file_len < HEADER_SIZE as u64 {
        return Err(CoreError::invalid_format(format!(
            "file is {file_len} bytes, shorter than the {HEADER_SIZE}-byte header"
        )));
    }
    read_snapshot(&mut file, config.max_field_length, file_len)
}
