//! Reconciliation of local pending entries with upstream history.
//!
//! Upstream entries arrive ordered by block position. The merge walks them
//! against this log's entries, which are ordered by `seq`:
//!
//! 1. Leading upstream entries at or before the log's reconciled position
//!    are already reflected locally and are dropped.
//! 2. Entries from other clients pass straight through.
//! 3. For this client's entries, local entries with a smaller `seq` were
//!    skipped upstream and are dropped. The local entry with an equal `seq`
//!    is replaced by the upstream copy. A missing or larger local `seq` is
//!    an integrity failure and aborts the whole merge.
//! 4. Whatever local entries remain stay pending after the commit point.

use crate::error::{CoreError, CoreResult};
use crate::record::LogEntry;
use crate::types::BlockPosition;
use tracing::{debug, info, warn};

/// Result of a successful merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Combined order: confirmed entries, then local pending ones.
    pub merged: Vec<LogEntry>,
    /// Number of leading entries confirmed by upstream.
    pub commit_point: usize,
}

impl MergeOutcome {
    /// Entries confirmed by upstream.
    #[must_use]
    pub fn confirmed(&self) -> &[LogEntry] {
        &self.merged[..self.commit_point]
    }

    /// Local entries still waiting for confirmation.
    #[must_use]
    pub fn pending(&self) -> &[LogEntry] {
        &self.merged[self.commit_point..]
    }

    /// Block position of the last confirmed entry, if any.
    #[must_use]
    pub fn confirmed_position(&self) -> Option<BlockPosition> {
        self.confirmed().last().map(LogEntry::position)
    }
}

/// Merges `upstream` into the entries of the log owned by `client_id`,
/// whose reconciled position is `position`.
///
/// # Errors
///
/// Returns [`CoreError::MergeIntegrity`] if upstream carries a sequence
/// number for `client_id` that the local entries cannot account for. No
/// partial output is produced.
pub fn merge(
    client_id: &str,
    position: BlockPosition,
    local: Vec<LogEntry>,
    upstream: Vec<LogEntry>,
) -> CoreResult<MergeOutcome> {
    let mut merged = Vec::with_capacity(local.len() + upstream.len());
    let mut local = local.into_iter().peekable();
    let mut upstream = upstream.into_iter().peekable();

    let mut stale = 0usize;
    while upstream.next_if(|e| e.position() <= position).is_some() {
        stale += 1;
    }
    if stale > 0 {
        debug!(stale, %position, "dropped upstream entries already reconciled");
    }

    for incoming in upstream {
        if incoming.client_id != client_id {
            merged.push(incoming);
            continue;
        }

        while let Some(skipped) = local.next_if(|e| e.seq < incoming.seq) {
            warn!(
                local_seq = skipped.seq,
                upstream_seq = incoming.seq,
                client_id,
                "local entry skipped upstream, discarding"
            );
        }

        match local.peek() {
            None => {
                return Err(CoreError::merge_integrity(
                    client_id,
                    incoming.seq,
                    "sequence not found in local log",
                ));
            }
            Some(next) if next.seq > incoming.seq => {
                return Err(CoreError::merge_integrity(
                    client_id,
                    incoming.seq,
                    format!("local log is already at seq {}", next.seq),
                ));
            }
            Some(_) => {
                local.next();
                merged.push(incoming);
            }
        }
    }

    let commit_point = merged.len();
    merged.extend(local);

    info!(
        client_id,
        merged = merged.len(),
        commit_point,
        "merged upstream entries"
    );
    Ok(MergeOutcome {
        merged,
        commit_point,
    })
}
