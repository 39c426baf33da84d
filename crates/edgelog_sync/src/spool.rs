//! Directory-backed transport.
//!
//! Each delivered message becomes one file under
//! `<root>/<topic>/<token>.json`, written to a temporary name and renamed so
//! a reader never sees a partial payload. Useful for tooling and for
//! devices that hand payloads to a separate uploader.

use crate::config::PublishConfig;
use crate::error::{SyncError, SyncResult};
use crate::transport::{DeliveryAck, Message, Transport};
use parking_lot::Mutex;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Transport that writes messages into a spool directory.
#[derive(Debug)]
pub struct SpoolTransport {
    root: PathBuf,
    /// Next token; `None` while disconnected.
    next_token: Mutex<Option<u64>>,
}

impl SpoolTransport {
    /// Creates a transport spooling under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            next_token: Mutex::new(None),
        }
    }

    /// Returns the spool root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the messages of `topic`.
    pub fn topic_dir(&self, topic: &str) -> PathBuf {
        let name: String = topic
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
            .collect();
        self.root.join(name)
    }
}

fn io_error(context: &str, err: io::Error) -> SyncError {
    match err.kind() {
        io::ErrorKind::PermissionDenied | io::ErrorKind::NotFound => {
            SyncError::transport_fatal(format!("{context}: {err}"))
        }
        _ => SyncError::transport_retryable(format!("{context}: {err}")),
    }
}

/// Highest numeric file stem in `dir`, plus one.
fn next_free_token(dir: &Path) -> io::Result<u64> {
    let mut next = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(n) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<u64>().ok())
        {
            next = next.max(n + 1);
        }
    }
    Ok(next)
}

/// Local writes finish or fail on their own, so the delivery and disconnect
/// deadlines are not enforced.
impl Transport for SpoolTransport {
    fn connect(&self, config: &PublishConfig) -> SyncResult<()> {
        let dir = self.topic_dir(&config.topic);
        fs::create_dir_all(&dir).map_err(|e| io_error("create spool directory", e))?;
        let next = next_free_token(&dir).map_err(|e| io_error("scan spool directory", e))?;
        *self.next_token.lock() = Some(next);
        debug!(dir = %dir.display(), next, "spool connected");
        Ok(())
    }

    fn publish(&self, message: &Message<'_>, _timeout: Duration) -> SyncResult<DeliveryAck> {
        let mut next_token = self.next_token.lock();
        let token = next_token.ok_or(SyncError::NotConnected)?;

        let dir = self.topic_dir(message.topic);
        fs::create_dir_all(&dir).map_err(|e| io_error("create topic directory", e))?;
        let tmp = dir.join(format!("{token:010}.tmp"));
        let dest = dir.join(format!("{token:010}.json"));
        let write = || -> io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(message.payload)?;
            file.sync_all()?;
            fs::rename(&tmp, &dest)
        };
        write().map_err(|e| io_error("spool message", e))?;

        *next_token = Some(token + 1);
        Ok(DeliveryAck { token })
    }

    fn is_connected(&self) -> bool {
        self.next_token.lock().is_some()
    }

    fn disconnect(&self, _timeout: Duration) -> SyncResult<()> {
        *self.next_token.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::QoS;

    fn message<'a>(topic: &'a str, payload: &'a [u8]) -> Message<'a> {
        Message {
            topic,
            payload,
            qos: QoS::AtLeastOnce,
            retained: false,
        }
    }

    #[test]
    fn spools_one_file_per_message() {
        let dir = tempfile::tempdir().unwrap();
        let spool = SpoolTransport::new(dir.path());
        let config = PublishConfig::new("spool", "c", "edgelog/entries");

        assert!(matches!(
            spool.publish(&message(&config.topic, b"{}"), Duration::ZERO),
            Err(SyncError::NotConnected)
        ));

        spool.connect(&config).unwrap();
        assert!(spool.is_connected());
        let a = spool.publish(&message(&config.topic, b"{\"a\":1}"), Duration::ZERO).unwrap();
        let b = spool.publish(&message(&config.topic, b"{\"b\":2}"), Duration::ZERO).unwrap();
        assert_eq!((a.token, b.token), (0, 1));
        spool.disconnect(Duration::ZERO).unwrap();
        assert!(!spool.is_connected());

        let topic_dir = spool.topic_dir("edgelog/entries");
        assert!(topic_dir.ends_with("edgelog_entries"));
        assert_eq!(
            fs::read(topic_dir.join("0000000001.json")).unwrap(),
            b"{\"b\":2}"
        );
    }

    #[test]
    fn reconnect_continues_numbering() {
        let dir = tempfile::tempdir().unwrap();
        let spool = SpoolTransport::new(dir.path());
        let config = PublishConfig::new("spool", "c", "t");

        spool.connect(&config).unwrap();
        spool.publish(&message("t", b"1"), Duration::ZERO).unwrap();
        spool.disconnect(Duration::ZERO).unwrap();

        let spool = SpoolTransport::new(dir.path());
        spool.connect(&config).unwrap();
        let ack = spool.publish(&message("t", b"2"), Duration::ZERO).unwrap();
        assert_eq!(ack.token, 1);
    }
}
