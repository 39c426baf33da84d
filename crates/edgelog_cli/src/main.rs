//! edgelog CLI
//!
//! Command-line harness for edgelog local logs.
//!
//! # Commands
//!
//! - `exec` - Run a SQL statement and log it
//! - `inspect` - Display the log header
//! - `dump` - Dump log entries for debugging
//! - `verify` - Verify log integrity
//! - `merge` - Merge upstream entries into the log
//! - `publish` - Publish pending entries to a spool directory

mod commands;
mod render;
mod sqlite;

use clap::{Parser, Subcommand};
use edgelog_core::{log_path_for, Argument, Config, ReplayMode};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// edgelog command-line log tools.
#[derive(Parser)]
#[command(name = "edgelog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the SQLite database; its log lives next to it with a `-loc` suffix
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Client id recorded in new entries (defaults to a random UUID)
    #[arg(global = true, long)]
    client_id: Option<String>,

    /// Replay every event of each entry on open, not just the first
    #[arg(global = true, long)]
    replay_all: bool,

    /// Skip fsync after each write
    #[arg(global = true, long)]
    no_sync: bool,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a SQL statement and append it to the log
    Exec {
        /// SQL statement
        sql: String,

        /// Bound argument as [NAME=]TYPE:VALUE (text, int, float, blob) or [NAME=]null
        #[arg(short, long = "arg", value_parser = commands::exec::parse_argument)]
        args: Vec<Argument>,
    },

    /// Display the log header
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Dump log entries for debugging
    Dump {
        /// Maximum number of entries to dump
        #[arg(short, long)]
        limit: Option<usize>,

        /// Skip this many entries
        #[arg(short, long, default_value = "0")]
        skip: usize,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Verify log integrity
    Verify,

    /// Merge upstream entries into the log
    Merge {
        /// JSON array of upstream entries
        upstream: PathBuf,

        /// Record the last confirmed block position in the log header
        #[arg(short, long)]
        commit: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Publish pending entries to a spool directory
    Publish {
        /// Spool directory
        #[arg(short, long)]
        spool: PathBuf,

        /// Topic to publish to
        #[arg(short, long, default_value = "edgelog/entries")]
        topic: String,

        /// Delivery attempts per entry
        #[arg(short, long, default_value = "1")]
        attempts: u32,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::new()
        .sync_on_write(!cli.no_sync)
        .replay(if cli.replay_all {
            ReplayMode::AllEvents
        } else {
            ReplayMode::FirstEvent
        });
    let client_id = cli
        .client_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    match cli.command {
        Commands::Exec { sql, args } => {
            let path = cli.path.ok_or("Database path required for exec")?;
            commands::exec::run(&path, &client_id, &sql, args, config)?;
        }
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Database path required for inspect")?;
            commands::inspect::run(&log_path_for(&path), &config, &format)?;
        }
        Commands::Dump {
            limit,
            skip,
            format,
        } => {
            let path = cli.path.ok_or("Database path required for dump")?;
            commands::dump::run(&log_path_for(&path), &config, limit, skip, &format)?;
        }
        Commands::Verify => {
            let path = cli.path.ok_or("Database path required for verify")?;
            commands::verify::run(&log_path_for(&path), &config)?;
        }
        Commands::Merge {
            upstream,
            commit,
            format,
        } => {
            let path = cli.path.ok_or("Database path required for merge")?;
            commands::merge::run(&path, &client_id, &upstream, commit, config, &format)?;
        }
        Commands::Publish {
            spool,
            topic,
            attempts,
        } => {
            let path = cli.path.ok_or("Database path required for publish")?;
            commands::publish::run(&path, &client_id, &spool, &topic, attempts, config)?;
        }
        Commands::Version => {
            println!("edgelog CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("edgelog core v{}", edgelog_core::VERSION);
        }
    }

    Ok(())
}
