//! The on-disk local log.
//!
//! ## File layout
//!
//! ```text
//! | header (48) | entry 0 | entry 1 | ... | entry N-1 | incomplete tail? |
//! ```
//!
//! All integers are big-endian. The header counts the entries that follow
//! it; anything after the last counted entry is the remains of an
//! interrupted append.
//!
//! ## Recovery policy
//!
//! - **Header shorter than 48 bytes, or a counted entry cut short**: fatal,
//!   reported as a shortfall.
//! - **Foreign magic or unsupported version**: fatal,
//!   [`CoreError::ProtocolMismatch`](crate::CoreError::ProtocolMismatch).
//! - **Bytes past the last counted entry**: tolerated. Opening a session
//!   truncates them.

mod file;
mod header;
mod reader;

pub use file::LocalLog;
pub use header::{LocalLogHeader, HEADER_SIZE, LOCAL_LOG_MAGIC, LOCAL_LOG_VERSION};
pub use reader::{read_log, LogReader, LogSnapshot};
