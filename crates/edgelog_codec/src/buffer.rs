//! Growable staging buffer with optional stream backing.
//!
//! A [`Buffer`] is used in one direction at a time:
//!
//! - **Writing**: values are appended in memory with [`Buffer::write`] and the
//!   unflushed region (`read_p..offset`) is pushed to the bound stream with
//!   [`Buffer::flush`].
//! - **Reading**: [`Buffer::read`] consumes bytes from `read_p`, pulling
//!   [`PAGE_SIZE`] chunks from the bound stream whenever the buffered data
//!   runs out.
//!
//! ```text
//! 0          read_p            offset              size
//! | consumed | unread/unflushed | free capacity     |
//! ```

use crate::error::{CodecError, CodecResult};
use std::io::{self, Read, Write};

/// Initial allocation and refill granularity.
pub const PAGE_SIZE: usize = 4096;

/// Default ceiling for length-prefixed strings and blobs.
pub const DEFAULT_MAX_LENGTH: u32 = 16 * 1024 * 1024;

/// A byte stream a [`Buffer`] can be bound to.
pub trait Stream: Read + Write {}

impl<T: Read + Write + ?Sized> Stream for T {}

/// Growable byte accumulator that doubles as a paged reader and a
/// flush-on-demand writer.
pub struct Buffer<'s> {
    data: Vec<u8>,
    read_p: usize,
    offset: usize,
    /// Stream bytes already discarded from the front of `data`.
    base: u64,
    max_length: u32,
    stream: Option<&'s mut dyn Stream>,
}

impl<'s> Buffer<'s> {
    /// Creates an empty, unbound buffer.
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            read_p: 0,
            offset: 0,
            base: 0,
            max_length: DEFAULT_MAX_LENGTH,
            stream: None,
        }
    }

    /// Creates an empty buffer bound to `stream`.
    pub fn bound(stream: &'s mut dyn Stream) -> Self {
        Self {
            stream: Some(stream),
            ..Self::new()
        }
    }

    /// Creates an unbound buffer whose unread region is `bytes`.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let offset = bytes.len();
        Self {
            data: bytes,
            offset,
            ..Self::new()
        }
    }

    /// Sets the ceiling applied to decoded string and blob lengths.
    #[must_use]
    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = max_length;
        self
    }

    /// Returns the ceiling applied to decoded string and blob lengths.
    pub fn max_length(&self) -> u32 {
        self.max_length
    }

    /// Returns true if a stream is bound.
    pub fn is_bound(&self) -> bool {
        self.stream.is_some()
    }

    /// Returns the current allocation size.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Returns the number of buffered bytes not yet read or flushed.
    pub fn unread(&self) -> usize {
        self.offset - self.read_p
    }

    /// Returns the bytes not yet read or flushed.
    pub fn pending(&self) -> &[u8] {
        &self.data[self.read_p..self.offset]
    }

    /// Returns every byte written to (or pulled into) this buffer and still held.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.offset]
    }

    /// Consumes the buffer and returns the held bytes.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.data.truncate(self.offset);
        self.data
    }

    /// Number of stream bytes consumed by reads, or pushed out by flushes,
    /// since the buffer was created.
    pub fn position(&self) -> u64 {
        self.base + self.read_p as u64
    }

    /// Guarantees room for at least `count` more bytes past `offset`.
    ///
    /// Capacity starts at [`PAGE_SIZE`] and doubles until the request fits.
    pub fn ensure(&mut self, count: usize) {
        let size = self.data.len();
        if count <= size - self.offset {
            return;
        }
        let mut new_size = if size == 0 { PAGE_SIZE } else { size };
        while count > new_size - self.offset {
            new_size *= 2;
        }
        self.data.resize(new_size, 0);
    }

    /// Appends `bytes`, growing on demand. Never touches the stream.
    pub fn write(&mut self, bytes: &[u8]) {
        self.ensure(bytes.len());
        self.data[self.offset..self.offset + bytes.len()].copy_from_slice(bytes);
        self.offset += bytes.len();
    }

    /// Consumes exactly `count` bytes, refilling from the stream page by page.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::ShortRead`] if the stream is exhausted (or there is
    /// no stream) before `count` bytes are available, and
    /// [`CodecError::Io`] if the stream fails.
    pub fn read(&mut self, count: usize) -> CodecResult<&[u8]> {
        while self.unread() < count {
            if !self.fill_page()? {
                return Err(CodecError::ShortRead {
                    needed: count,
                    available: self.unread(),
                });
            }
        }
        let start = self.read_p;
        self.read_p += count;
        Ok(&self.data[start..start + count])
    }

    /// Writes the unflushed region to the bound stream.
    ///
    /// Returns the number of bytes written. Bytes already flushed are never
    /// written again.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Unbound`] without a stream and [`CodecError::Io`]
    /// if the write is short or fails.
    pub fn flush(&mut self) -> CodecResult<usize> {
        let stream = self.stream.as_deref_mut().ok_or(CodecError::Unbound)?;
        let pending = &self.data[self.read_p..self.offset];
        stream.write_all(pending)?;
        stream.flush()?;
        let written = pending.len();
        self.read_p = self.offset;
        Ok(written)
    }

    /// Pulls up to one page from the stream, discarding consumed bytes first.
    /// Returns false at end of stream or when unbound.
    fn fill_page(&mut self) -> CodecResult<bool> {
        if self.stream.is_none() {
            return Ok(false);
        }
        // Consumed bytes are dead in read mode; keep memory at one record
        // plus one page.
        if self.read_p > 0 {
            self.data.copy_within(self.read_p..self.offset, 0);
            self.base += self.read_p as u64;
            self.offset -= self.read_p;
            self.read_p = 0;
        }
        self.ensure(PAGE_SIZE);

        let start = self.offset;
        let end = start + PAGE_SIZE;
        let mut filled = 0;
        if let Some(stream) = self.stream.as_deref_mut() {
            while start + filled < end {
                match stream.read(&mut self.data[start + filled..end]) {
                    Ok(0) => break,
                    Ok(n) => filled += n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                }
            }
        }
        self.offset += filled;
        Ok(filled > 0)
    }
}

impl Default for Buffer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Buffer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("read_p", &self.read_p)
            .field("offset", &self.offset)
            .field("size", &self.data.len())
            .field("bound", &self.stream.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct BrokenStream;

    impl Read for BrokenStream {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "device gone"))
        }
    }

    impl Write for BrokenStream {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn ensure_starts_at_page_and_doubles() {
        let mut buf = Buffer::new();
        assert_eq!(buf.capacity(), 0);

        buf.ensure(1);
        assert_eq!(buf.capacity(), PAGE_SIZE);

        buf.write(&[7u8; PAGE_SIZE]);
        buf.ensure(PAGE_SIZE + 1);
        assert_eq!(buf.capacity(), PAGE_SIZE * 4);
    }

    #[test]
    fn growth_preserves_bytes() {
        let mut buf = Buffer::new();
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        for chunk in data.chunks(333) {
            buf.write(chunk);
        }
        assert_eq!(buf.as_bytes(), data.as_slice());
    }

    #[test]
    fn unbound_read_past_end_fails() {
        let mut buf = Buffer::from_bytes(vec![1, 2, 3]);
        assert_eq!(buf.read(2).unwrap(), &[1, 2]);
        let err = buf.read(2).unwrap_err();
        assert_eq!(
            err,
            CodecError::ShortRead {
                needed: 2,
                available: 1
            }
        );
    }

    #[test]
    fn read_pulls_pages_from_stream() {
        let data: Vec<u8> = (0..(PAGE_SIZE * 3 + 17)).map(|i| i as u8).collect();
        let mut stream = Cursor::new(data.clone());
        let mut buf = Buffer::bound(&mut stream);

        assert_eq!(buf.read(10).unwrap(), &data[..10]);
        // Spans several refills.
        assert_eq!(buf.read(PAGE_SIZE * 2).unwrap(), &data[10..10 + PAGE_SIZE * 2]);
        let rest = data.len() - 10 - PAGE_SIZE * 2;
        assert_eq!(buf.read(rest).unwrap(), &data[10 + PAGE_SIZE * 2..]);
        assert_eq!(buf.position(), data.len() as u64);
        assert!(buf.read(1).is_err());
    }

    #[test]
    fn streaming_reads_stay_bounded() {
        let data = vec![3u8; PAGE_SIZE * 10];
        let mut stream = Cursor::new(data);
        let mut buf = Buffer::bound(&mut stream);
        for _ in 0..(PAGE_SIZE * 10 / 100) {
            buf.read(100).unwrap();
        }
        assert!(buf.capacity() <= PAGE_SIZE * 2);
        assert_eq!(buf.position(), (PAGE_SIZE * 10 / 100 * 100) as u64);
    }

    #[test]
    fn read_reports_exhausted_stream() {
        let mut stream = Cursor::new(vec![0u8; 5]);
        let mut buf = Buffer::bound(&mut stream);
        let err = buf.read(8).unwrap_err();
        assert!(err.is_shortfall());
        assert_eq!(
            err,
            CodecError::ShortRead {
                needed: 8,
                available: 5
            }
        );
    }

    #[test]
    fn read_propagates_stream_errors() {
        let mut stream = BrokenStream;
        let mut buf = Buffer::bound(&mut stream);
        assert!(matches!(buf.read(1), Err(CodecError::Io { .. })));
    }

    #[test]
    fn flush_writes_only_unflushed_region() {
        let mut sink = Cursor::new(Vec::new());
        {
            let mut buf = Buffer::bound(&mut sink);
            buf.write(b"abc");
            assert_eq!(buf.flush().unwrap(), 3);
            assert_eq!(buf.flush().unwrap(), 0);
            buf.write(b"de");
            assert_eq!(buf.flush().unwrap(), 2);
            assert_eq!(buf.position(), 5);
        }
        assert_eq!(sink.into_inner(), b"abcde");
    }

    #[test]
    fn flush_requires_stream() {
        let mut buf = Buffer::new();
        buf.write(b"x");
        assert_eq!(buf.flush(), Err(CodecError::Unbound));
    }

    #[test]
    fn short_write_is_an_io_error() {
        let mut stream = BrokenStream;
        let mut buf = Buffer::bound(&mut stream);
        buf.write(b"payload");
        assert!(matches!(buf.flush(), Err(CodecError::Io { .. })));
        assert_eq!(buf.unread(), 7);
    }
}
