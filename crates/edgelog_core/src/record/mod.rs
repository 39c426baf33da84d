//! Record model: arguments, events and log entries.
//!
//! Every record has two independent encodings:
//!
//! - **Binary** ([`Encode`]/[`Decode`]): the durable local format. Carries
//!   every field, including the block position of an entry.
//! - **JSON** (`to_json`/`from_json`): the publish format. An entry's JSON
//!   form omits its block position, and inbound JSON treats most fields as
//!   nullable.
//!
//! The two are deliberately not interchangeable.
//!
//! [`Encode`]: edgelog_codec::Encode
//! [`Decode`]: edgelog_codec::Decode

mod argument;
mod entry;
mod event;

pub use argument::{Argument, ArgumentType, Value};
pub use entry::LogEntry;
pub use event::Event;

use crate::error::{CoreError, CoreResult};
use edgelog_codec::{CodecError, CodecResult};
use serde_json::{Map, Value as Json};

/// Upper bound on speculative allocation for decoded element counts.
const PREALLOC_LIMIT: usize = 64;

fn element_count(len: usize, what: &str) -> CodecResult<u32> {
    u32::try_from(len).map_err(|_| {
        CodecError::invalid_structure(format!("{what} count {len} does not fit in u32"))
    })
}

fn with_capacity_for<T>(count: u32) -> Vec<T> {
    Vec::with_capacity((count as usize).min(PREALLOC_LIMIT))
}

fn json_object<'a>(value: &'a Json, what: &str) -> CoreResult<&'a Map<String, Json>> {
    value
        .as_object()
        .ok_or_else(|| CoreError::json_shape(what, "expected an object"))
}

/// Returns the field, treating JSON `null` as absent.
fn optional<'a>(obj: &'a Map<String, Json>, field: &str) -> Option<&'a Json> {
    obj.get(field).filter(|v| !v.is_null())
}

fn required<'a>(obj: &'a Map<String, Json>, field: &str) -> CoreResult<&'a Json> {
    optional(obj, field).ok_or_else(|| CoreError::json_shape(field, "field not found"))
}

fn json_str<'a>(value: &'a Json, field: &str) -> CoreResult<&'a str> {
    value
        .as_str()
        .ok_or_else(|| CoreError::json_shape(field, "expected a string"))
}

fn json_u64(value: &Json, field: &str) -> CoreResult<u64> {
    value
        .as_u64()
        .ok_or_else(|| CoreError::json_shape(field, "expected a non-negative integer"))
}

fn json_array<'a>(value: &'a Json, field: &str) -> CoreResult<&'a Vec<Json>> {
    value
        .as_array()
        .ok_or_else(|| CoreError::json_shape(field, "expected an array"))
}

/// Parses a JSON array of entries, such as an upstream batch.
///
/// # Errors
///
/// Returns [`CoreError::JsonShape`] if the text is not a JSON array or any
/// element fails [`LogEntry::from_json`].
pub fn entries_from_json_slice(bytes: &[u8]) -> CoreResult<Vec<LogEntry>> {
    let doc: Json = serde_json::from_slice(bytes)
        .map_err(|e| CoreError::json_shape("entries", e.to_string()))?;
    json_array(&doc, "entries")?
        .iter()
        .map(LogEntry::from_json)
        .collect()
}
