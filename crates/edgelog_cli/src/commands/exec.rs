//! Exec command implementation.

use crate::render::hex_decode;
use crate::sqlite::SqliteExecutor;
use edgelog_core::{log_path_for, Argument, Config, LocalLog, Row, Value};
use std::path::Path;

/// Runs the exec command.
///
/// Opening the log replays every logged statement into the database before
/// `sql` runs.
pub fn run(
    path: &Path,
    client_id: &str,
    sql: &str,
    args: Vec<Argument>,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let executor = SqliteExecutor::open(path)?;
    let mut log = LocalLog::open(log_path_for(path), client_id, executor, config)?;
    if log.replayed() > 0 {
        println!("Replayed {} entries", log.replayed());
    }

    let mut printed_columns = false;
    let seq = log.execute(sql, args, &mut |row: Row<'_>| {
        if !printed_columns {
            println!("{}", row.columns.join(" | "));
            printed_columns = true;
        }
        let values: Vec<&str> = row
            .values
            .iter()
            .map(|v| v.as_deref().unwrap_or("NULL"))
            .collect();
        println!("{}", values.join(" | "));
    })?;

    println!("Logged as seq {seq}");
    log.close()?;
    Ok(())
}

/// Parses an argument given as `[NAME=]TYPE:VALUE` or `[NAME=]null`.
///
/// Types are `text`, `int`, `float` and `blob` (hex digits). A name may
/// carry its SQLite sigil (`:id`, `@id`, `$id`).
pub fn parse_argument(spec: &str) -> Result<Argument, String> {
    let (name, typed) = match spec.split_once('=') {
        Some((name, rest)) if is_parameter_name(name) => (name, rest),
        _ => ("", spec),
    };
    let value = match typed.split_once(':') {
        None if typed == "null" => Value::Null,
        Some(("text", v)) => Value::String(v.to_string()),
        Some(("int", v)) => Value::Int(v.parse().map_err(|e| format!("bad int `{v}`: {e}"))?),
        Some(("float", v)) => {
            Value::Float(v.parse().map_err(|e| format!("bad float `{v}`: {e}"))?)
        }
        Some(("blob", v)) => Value::Blob(hex_decode(v)?),
        _ => return Err(format!("expected [NAME=]TYPE:VALUE, got `{spec}`")),
    };
    Ok(Argument::new(name, value))
}

fn is_parameter_name(name: &str) -> bool {
    let bare = name.strip_prefix([':', '@', '$']).unwrap_or(name);
    !bare.is_empty() && bare.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
