//! # edgelog core
//!
//! Client-side write-ahead log for SQL statements that are executed
//! locally and later synchronized with an authoritative upstream log.
//!
//! This crate provides:
//! - The record model ([`Argument`], [`Event`], [`LogEntry`]) with binary
//!   and JSON encodings
//! - The on-disk [`LocalLog`] with crash-tolerant append and replay
//! - The [`merge`] engine reconciling local entries with upstream history
//! - The [`Executor`] seam to the embedded SQL engine
//!
//! ## Example
//!
//! ```rust,ignore
//! use edgelog_core::{log_path_for, Config, LocalLog};
//!
//! let path = log_path_for(Path::new("app.db"));
//! let mut log = LocalLog::open(&path, "device-1", executor, Config::default())?;
//! log.execute("CREATE TABLE t (v INTEGER)", Vec::new(), &mut |_| {})?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod executor;
mod log;
mod merge;
mod record;
mod types;

pub use config::{log_path_for, Config, ReplayMode, LOG_SUFFIX};
pub use error::{CoreError, CoreResult};
pub use executor::{Executor, ExecutorError, Row};
pub use log::{
    read_log, LocalLog, LocalLogHeader, LogReader, LogSnapshot, HEADER_SIZE, LOCAL_LOG_MAGIC,
    LOCAL_LOG_VERSION,
};
pub use merge::{merge, MergeOutcome};
pub use record::{entries_from_json_slice, Argument, ArgumentType, Event, LogEntry, Value};
pub use types::BlockPosition;

// Re-export the codec traits so callers can encode records without a direct
// dependency.
pub use edgelog_codec::{Decode, Encode};

/// Crate version, as recorded in the package manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
