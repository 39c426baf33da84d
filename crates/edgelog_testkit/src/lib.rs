//! # edgelog testkit
//!
//! Test utilities for edgelog.
//!
//! This crate provides:
//! - Executors and entry builders for driving a [`edgelog_core::LocalLog`]
//! - A temporary log directory that survives reopen
//! - Property-based test generators using proptest
//! - Crash simulation on log files
//!
//! ## Usage
//!
//! ```rust,ignore
//! use edgelog_testkit::prelude::*;
//!
//! #[test]
//! fn replays_on_reopen() {
//!     let temp = TempLog::new();
//!     let mut log = temp.open(RecordingExecutor::new());
//!     log.execute("CREATE TABLE t (v)", Vec::new(), &mut |_| {}).unwrap();
//!     log.close().unwrap();
//!
//!     let log = temp.open(RecordingExecutor::new());
//!     assert_eq!(log.replayed(), 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod crash;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::crash::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use crash::*;
pub use fixtures::*;
pub use generators::*;
