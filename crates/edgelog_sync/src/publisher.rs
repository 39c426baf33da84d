//! The publish cursor.
//!
//! Publishing walks the log from the persisted cursor, delivers each entry's
//! JSON form and advances the cursor on disk after every acknowledgment:
//!
//! ```text
//! read log ─▶ skip seq < next_publish ─▶ connect
//!                                         │
//!        ┌────────────────────────────────┘
//!        ▼
//!   encode JSON ─▶ deliver (QoS 1, deadline) ─▶ next_publish += 1, flush header
//!        ▲                                             │
//!        └─────────────────────────────────────────────┘
//! ```
//!
//! Delivery is at-least-once. An entry whose acknowledgment is lost may be
//! delivered again on the next run, but an acknowledged entry never is.

use crate::config::PublishConfig;
use crate::error::SyncResult;
use crate::transport::{Message, QoS, Transport};
use edgelog_core::{LocalLog, LogEntry};
use std::thread;
use tracing::{debug, info, warn};

/// Outcome of a publish run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Entries delivered during this run.
    pub published: u64,
    /// Entries skipped because an earlier run delivered them.
    pub skipped: usize,
    /// Cursor after the run.
    pub next_publish: u64,
}

/// Publishes local log entries through a [`Transport`].
pub struct Publisher<T: Transport> {
    config: PublishConfig,
    transport: T,
}

impl<T: Transport> Publisher<T> {
    /// Creates a new publisher.
    pub fn new(config: PublishConfig, transport: T) -> Self {
        Self { config, transport }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PublishConfig {
        &self.config
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Delivers every entry at or after the log's publish cursor.
    ///
    /// The transport is only connected when there is something to send, and
    /// is always disconnected again before returning.
    ///
    /// # Errors
    ///
    /// Stops at the first encoding, delivery or header write failure. The
    /// cursor then points at the entry that failed.
    pub fn publish<E>(&self, log: &mut LocalLog<E>) -> SyncResult<PublishReport> {
        let snapshot = log.read_entries()?;
        let next_publish = snapshot.header.next_publish;
        let skipped = snapshot
            .entries
            .iter()
            .take_while(|e| e.seq < next_publish)
            .count();
        let pending = &snapshot.entries[skipped..];

        let mut report = PublishReport {
            published: 0,
            skipped,
            next_publish,
        };
        if pending.is_empty() {
            debug!(next_publish, "nothing to publish");
            return Ok(report);
        }

        self.transport.connect(&self.config)?;
        info!(
            address = %self.config.address,
            topic = %self.config.topic,
            pending = pending.len(),
            "connected for publish"
        );

        let result = self.deliver_all(log, pending, &mut report);

        if let Err(e) = self.transport.disconnect(self.config.disconnect_timeout) {
            warn!(error = %e, "disconnect failed");
        }

        match result {
            Ok(()) => {
                info!(
                    published = report.published,
                    next_publish = report.next_publish,
                    "publish complete"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(
                    published = report.published,
                    next_publish = report.next_publish,
                    error = %e,
                    "publish aborted"
                );
                Err(e)
            }
        }
    }

    fn deliver_all<E>(
        &self,
        log: &mut LocalLog<E>,
        pending: &[LogEntry],
        report: &mut PublishReport,
    ) -> SyncResult<()> {
        for entry in pending {
            let payload = entry.to_json_vec()?;
            self.deliver(&payload, entry.seq)?;
            report.next_publish = log.advance_publish_cursor()?;
            report.published += 1;
            debug!(seq = entry.seq, next_publish = report.next_publish, "published");
        }
        Ok(())
    }

    fn deliver(&self, payload: &[u8], seq: u64) -> SyncResult<()> {
        let message = Message {
            topic: &self.config.topic,
            payload,
            qos: QoS::AtLeastOnce,
            retained: false,
        };
        let retry = &self.config.retry;
        let mut attempt = 0;
        loop {
            match self.transport.publish(&message, self.config.delivery_timeout) {
                Ok(_) => return Ok(()),
                Err(e) if e.is_retryable() && attempt + 1 < retry.max_attempts => {
                    attempt += 1;
                    let delay = retry.delay_for_attempt(attempt);
                    warn!(seq, attempt, error = %e, ?delay, "delivery failed, retrying");
                    thread::sleep(delay);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl<T: Transport> std::fmt::Debug for Publisher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
