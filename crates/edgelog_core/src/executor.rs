//! Seam between the log and the embedded SQL engine.
//!
//! The log never interprets SQL. It hands each [`Event`] to an
//! [`Executor`] and only appends the event once the executor reports
//! success.

use crate::record::Event;
use thiserror::Error;

/// Failure reported by an execution engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ExecutorError {
    /// Engine-specific result code, if it has one.
    pub code: Option<i32>,
    /// Engine-supplied description.
    pub message: String,
}

impl ExecutorError {
    /// Creates an executor error without a result code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Creates an executor error carrying an engine result code.
    pub fn with_code(code: i32, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }
}

/// One result row, as column names and nullable text values.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    /// Column names, in result order.
    pub columns: &'a [String],
    /// Column values rendered as text; `None` for SQL NULL.
    pub values: &'a [Option<String>],
}

impl<'a> Row<'a> {
    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Looks up a value by column name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.values.get(idx)?.as_deref()
    }

    /// Iterates `(column, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, Option<&'a str>)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Option::as_deref))
    }
}

/// An embedded SQL engine the log drives.
pub trait Executor {
    /// Executes `statement` with its bound arguments, calling `on_row` once
    /// per result row.
    ///
    /// # Errors
    ///
    /// Returns the engine's error verbatim.
    fn execute(
        &mut self,
        statement: &Event,
        on_row: &mut dyn FnMut(Row<'_>),
    ) -> Result<(), ExecutorError>;
}

impl<E: Executor + ?Sized> Executor for &mut E {
    fn execute(
        &mut self,
        statement: &Event,
        on_row: &mut dyn FnMut(Row<'_>),
    ) -> Result<(), ExecutorError> {
        (**self).execute(statement, on_row)
    }
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn execute(
        &mut self,
        statement: &Event,
        on_row: &mut dyn FnMut(Row<'_>),
    ) -> Result<(), ExecutorError> {
        (**self).execute(statement, on_row)
    }
}
