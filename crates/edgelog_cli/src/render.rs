//! Output forms for entries shared by several commands.

use edgelog_core::{ArgumentType, LogEntry, Value};
use serde::Serialize;
use serde_json::{Number, Value as Json};

/// Entry representation for output, including its block position.
#[derive(Debug, Serialize)]
pub struct EntryInfo {
    /// Upstream block id.
    pub block_id: u64,
    /// Index within the block.
    pub block_index: u64,
    /// Originating client.
    pub client_id: String,
    /// Per-client sequence number.
    pub seq: u64,
    /// Statements in the entry.
    pub events: Vec<EventInfo>,
}

/// Event representation for output.
#[derive(Debug, Serialize)]
pub struct EventInfo {
    /// SQL text.
    pub pattern: String,
    /// Bound arguments.
    pub args: Vec<ArgInfo>,
}

/// Argument representation for output.
///
/// Unlike the publish form, blobs are hex-encoded and non-finite floats are
/// spelled out, so any entry can be dumped.
#[derive(Debug, Serialize)]
pub struct ArgInfo {
    /// Parameter name, omitted for positional parameters.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Type name.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Value.
    pub value: Json,
}

impl From<&LogEntry> for EntryInfo {
    fn from(entry: &LogEntry) -> Self {
        Self {
            block_id: entry.block_id,
            block_index: entry.block_index,
            client_id: entry.client_id.clone(),
            seq: entry.seq,
            events: entry
                .events
                .iter()
                .map(|event| EventInfo {
                    pattern: event.pattern.clone(),
                    args: event
                        .args
                        .iter()
                        .map(|arg| ArgInfo {
                            name: arg.name.clone(),
                            kind: type_name(arg.arg_type()),
                            value: value_json(&arg.value),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Human-readable name of an argument type.
pub fn type_name(kind: ArgumentType) -> &'static str {
    match kind {
        ArgumentType::Null => "null",
        ArgumentType::String => "text",
        ArgumentType::Int => "int",
        ArgumentType::Float => "float",
        ArgumentType::Blob => "blob",
    }
}

fn value_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::String(s) => Json::String(s.clone()),
        Value::Int(i) => Json::from(*i),
        Value::Float(f) => Number::from_f64(*f)
            .map(Json::Number)
            .unwrap_or_else(|| Json::String(f.to_string())),
        Value::Blob(b) => Json::String(hex_encode(b)),
    }
}

/// Renders a value the way a SQL literal would look.
pub fn describe(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => format!("{s:?}"),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format!("{f:?}"),
        Value::Blob(b) => format!("x'{}'", hex_encode(b)),
    }
}

/// Prints one entry as a header line plus one indented line per event.
pub fn print_entry(prefix: &str, entry: &LogEntry) {
    println!(
        "{prefix}[{}] client={} seq={} events={}",
        entry.position(),
        entry.client_id,
        entry.seq,
        entry.events.len()
    );
    for event in &entry.events {
        print!("{prefix}    {}", event.pattern);
        if !event.args.is_empty() {
            let args: Vec<String> = event
                .args
                .iter()
                .map(|arg| {
                    if arg.name.is_empty() {
                        describe(&arg.value)
                    } else {
                        format!("{}={}", arg.name, describe(&arg.value))
                    }
                })
                .collect();
            print!("  ({})", args.join(", "));
        }
        println!();
    }
}

pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

pub fn hex_decode(text: &str) -> Result<Vec<u8>, String> {
    if text.len() % 2 != 0 {
        return Err(format!("odd number of hex digits in `{text}`"));
    }
    (0..text.len())
        .step_by(2)
        .map(|i| {
            text.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| format!("invalid hex in `{text}`"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgelog_core::{Argument, BlockPosition, Event};

    #[test]
    fn hex_roundtrip() {
        assert_eq!(hex_encode(&[0x00, 0xAB, 0xFF]), "00abff");
        assert_eq!(hex_decode("00abFF").unwrap(), vec![0x00, 0xAB, 0xFF]);
        assert!(hex_decode("abc").is_err());
        assert!(hex_decode("zz").is_err());
    }

    #[test]
    fn entry_info_keeps_unencodable_values() {
        let entry = LogEntry::new("A")
            .with_seq(3)
            .at(BlockPosition::new(9, 1))
            .with_event(Event::new("INSERT INTO t VALUES (?, :b)").with_args(vec![
                Argument::positional(f64::NAN),
                Argument::new("b", vec![0xFFu8, 0x00]),
            ]));
        let doc = serde_json::to_value(EntryInfo::from(&entry)).unwrap();
        assert_eq!(doc["block_id"], 9);
        assert_eq!(doc["seq"], 3);
        let args = &doc["events"][0]["args"];
        assert_eq!(args[0]["type"], "float");
        assert_eq!(args[0]["value"], "NaN");
        assert!(args[0].get("name").is_none());
        assert_eq!(args[1]["name"], "b");
        assert_eq!(args[1]["value"], "ff00");
    }

    #[test]
    fn describe_values() {
        assert_eq!(describe(&Value::Null), "NULL");
        assert_eq!(describe(&Value::from("a\"b")), "\"a\\\"b\"");
        assert_eq!(describe(&Value::Float(-0.0)), "-0.0");
        assert_eq!(describe(&Value::Blob(vec![1, 2])), "x'0102'");
    }
}
