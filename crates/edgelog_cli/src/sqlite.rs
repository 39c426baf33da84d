//! SQLite execution engine backed by `rusqlite`.
//!
//! The connection keeps one transaction open for the whole session and never
//! commits it. The local log is the durable record; every open rebuilds the
//! database state by replaying it.

use edgelog_core::{Argument, Event, Executor, ExecutorError, Row, Value};
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, Statement};
use std::path::Path;
use tracing::debug;

/// An [`Executor`] running statements on a SQLite connection.
pub struct SqliteExecutor {
    conn: Connection,
}

impl SqliteExecutor {
    /// Opens the database at `path` and starts the session transaction.
    pub fn open(path: &Path) -> Result<Self, ExecutorError> {
        let conn = Connection::open(path).map_err(to_executor_error)?;
        Self::init(conn)
    }

    /// Opens a private in-memory database.
    #[cfg(test)]
    pub fn in_memory() -> Result<Self, ExecutorError> {
        let conn = Connection::open_in_memory().map_err(to_executor_error)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, ExecutorError> {
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(to_executor_error)?;
        conn.execute_batch("PRAGMA read_uncommitted = 1; BEGIN TRANSACTION;")
            .map_err(to_executor_error)?;
        debug!(journal_mode = %mode, "sqlite session started");
        Ok(Self { conn })
    }
}

impl Executor for SqliteExecutor {
    fn execute(
        &mut self,
        statement: &Event,
        on_row: &mut dyn FnMut(Row<'_>),
    ) -> Result<(), ExecutorError> {
        let mut stmt = self
            .conn
            .prepare(&statement.pattern)
            .map_err(to_executor_error)?;
        bind_all(&mut stmt, &statement.args)?;

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.raw_query();
        let mut values = Vec::with_capacity(columns.len());
        while let Some(row) = rows.next().map_err(to_executor_error)? {
            values.clear();
            for i in 0..columns.len() {
                let value = row.get_ref(i).map_err(to_executor_error)?;
                values.push(render(value));
            }
            on_row(Row {
                columns: &columns,
                values: &values,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for SqliteExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteExecutor")
            .field("path", &self.conn.path())
            .finish()
    }
}

/// Binds positional arguments by position and named ones by name.
///
/// A name without a `:`, `@` or `$` prefix is looked up as `:name`.
fn bind_all(stmt: &mut Statement<'_>, args: &[Argument]) -> Result<(), ExecutorError> {
    for (i, arg) in args.iter().enumerate() {
        let index = if arg.name.is_empty() {
            i + 1
        } else {
            parameter_index(stmt, &arg.name)?
        };
        stmt.raw_bind_parameter(index, to_sql(&arg.value))
            .map_err(to_executor_error)?;
    }
    Ok(())
}

fn parameter_index(stmt: &Statement<'_>, name: &str) -> Result<usize, ExecutorError> {
    let found = if name.starts_with([':', '@', '$']) {
        stmt.parameter_index(name)
    } else {
        stmt.parameter_index(&format!(":{name}"))
    };
    found
        .map_err(to_executor_error)?
        .ok_or_else(|| ExecutorError::new(format!("no such parameter: {name}")))
}

fn to_sql(value: &Value) -> ToSqlOutput<'_> {
    ToSqlOutput::Borrowed(match value {
        Value::Null => ValueRef::Null,
        Value::String(s) => ValueRef::Text(s.as_bytes()),
        Value::Int(i) => ValueRef::Integer(*i),
        Value::Float(f) => ValueRef::Real(*f),
        Value::Blob(b) => ValueRef::Blob(b),
    })
}

/// Renders a column as SQLite's text conversion would.
fn render(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) | ValueRef::Blob(t) => Some(String::from_utf8_lossy(t).into_owned()),
    }
}

fn to_executor_error(err: rusqlite::Error) -> ExecutorError {
    match &err {
        rusqlite::Error::SqliteFailure(code, message) => ExecutorError::with_code(
            code.extended_code,
            message.clone().unwrap_or_else(|| code.to_string()),
        ),
        _ => ExecutorError::new(err.to_string()),
    }
}
