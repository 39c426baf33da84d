//! Publish command implementation.

use crate::sqlite::SqliteExecutor;
use edgelog_core::{log_path_for, Config, LocalLog};
use edgelog_sync::{PublishConfig, Publisher, RetryConfig, SpoolTransport};
use std::path::Path;

/// Runs the publish command.
///
/// Entries are delivered to `spool` as one JSON file each, under a
/// directory named after `topic`.
pub fn run(
    path: &Path,
    client_id: &str,
    spool: &Path,
    topic: &str,
    attempts: u32,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let executor = SqliteExecutor::open(path)?;
    let mut log = LocalLog::open(log_path_for(path), client_id, executor, config)?;

    let retry = if attempts > 1 {
        RetryConfig::new(attempts)
    } else {
        RetryConfig::no_retry()
    };
    let publish_config =
        PublishConfig::new(format!("file://{}", spool.display()), client_id, topic)
            .with_retry(retry);
    let transport = SpoolTransport::new(spool);
    let publisher = Publisher::new(publish_config, transport);

    let report = publisher.publish(&mut log)?;
    println!(
        "Published {} entries ({} already published), next publish seq {}",
        report.published, report.skipped, report.next_publish
    );
    if report.published > 0 {
        println!(
            "Spooled to {}",
            publisher.transport().topic_dir(topic).display()
        );
    }

    log.close()?;
    Ok(())
}
