//! Local log configuration.

use edgelog_codec::DEFAULT_MAX_LENGTH;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Suffix appended to a database path to name its local log.
pub const LOG_SUFFIX: &str = "-loc";

/// Which events of each entry are dispatched to the executor on open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayMode {
    /// Replay only the first event of every entry.
    #[default]
    FirstEvent,
    /// Replay every event of every entry, in order.
    AllEvents,
}

/// Configuration for opening a local log.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create the log if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to fsync after every entry and header write.
    pub sync_on_write: bool,

    /// Ceiling for decoded string and blob lengths.
    pub max_field_length: u32,

    /// Replay policy applied on open.
    pub replay: ReplayMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            sync_on_write: true,
            max_field_length: DEFAULT_MAX_LENGTH, // 16 MiB
            replay: ReplayMode::FirstEvent,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the log if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to fsync after every write.
    #[must_use]
    pub const fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }

    /// Sets the decode ceiling for string and blob lengths.
    #[must_use]
    pub const fn max_field_length(mut self, length: u32) -> Self {
        self.max_field_length = length;
        self
    }

    /// Sets the replay policy.
    #[must_use]
    pub const fn replay(mut self, mode: ReplayMode) -> Self {
        self.replay = mode;
        self
    }
}

/// Returns the local log path belonging to the database at `db_path`.
///
/// ```
/// use edgelog_core::log_path_for;
/// use std::path::Path;
///
/// assert_eq!(log_path_for(Path::new("data/app.db")), Path::new("data/app.db-loc"));
/// ```
#[must_use]
pub fn log_path_for(db_path: &Path) -> PathBuf {
    let mut name = OsString::from(db_path.as_os_str());
    name.push(LOG_SUFFIX);
    PathBuf::from(name)
}
