//! Property-based test generators using proptest.
//!
//! Two families of strategies exist. The plain ones cover everything the
//! binary format must carry, including NaN payloads, signed zeros and
//! arbitrary blob bytes. The `json_safe_*` ones stay within what the JSON
//! publish form can express: finite floats and UTF-8 blobs.

use edgelog_core::{
    Argument, BlockPosition, Event, LocalLogHeader, LogEntry, Value, LOCAL_LOG_VERSION,
};
use proptest::prelude::*;

/// Strategy for client ids.
pub fn client_id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9-]{0,15}").expect("Invalid regex")
}

/// Strategy for floats, weighted towards the values codecs get wrong.
pub fn float_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        4 => any::<f64>(),
        1 => Just(f64::NAN),
        1 => Just(-0.0),
        1 => Just(f64::INFINITY),
        1 => any::<u64>().prop_map(f64::from_bits),
    ]
}

/// Strategy for any argument value.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        ".{0,24}".prop_map(Value::String),
        any::<i64>().prop_map(Value::Int),
        float_strategy().prop_map(Value::Float),
        prop::collection::vec(any::<u8>(), 0..64).prop_map(Value::Blob),
    ]
}

/// Strategy for values the JSON publish form can carry.
pub fn json_safe_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        ".{0,24}".prop_map(Value::String),
        any::<i64>().prop_map(Value::Int),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(Value::Float),
        "[ -~]{0,24}".prop_map(|s| Value::Blob(s.into_bytes())),
    ]
}

fn parameter_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        prop::string::string_regex(":[a-z_]{1,8}").expect("Invalid regex"),
    ]
}

/// Strategy for arguments, positional or named.
pub fn argument_strategy() -> impl Strategy<Value = Argument> {
    (parameter_name_strategy(), value_strategy())
        .prop_map(|(name, value)| Argument { name, value })
}

/// Strategy for arguments the JSON publish form can carry.
pub fn json_safe_argument_strategy() -> impl Strategy<Value = Argument> {
    (parameter_name_strategy(), json_safe_value_strategy())
        .prop_map(|(name, value)| Argument { name, value })
}

/// Strategy for events.
pub fn event_strategy() -> impl Strategy<Value = Event> {
    (".{0,48}", prop::collection::vec(argument_strategy(), 0..4))
        .prop_map(|(pattern, args)| Event::new(pattern).with_args(args))
}

/// Strategy for events the JSON publish form can carry.
pub fn json_safe_event_strategy() -> impl Strategy<Value = Event> {
    (
        ".{0,48}",
        prop::collection::vec(json_safe_argument_strategy(), 0..4),
    )
        .prop_map(|(pattern, args)| Event::new(pattern).with_args(args))
}

/// Strategy for block positions.
pub fn position_strategy() -> impl Strategy<Value = BlockPosition> {
    (any::<u64>(), any::<u64>()).prop_map(|(id, index)| BlockPosition::new(id, index))
}

/// Strategy for entries with any position and sequence number.
pub fn entry_strategy() -> impl Strategy<Value = LogEntry> {
    (
        client_id_strategy(),
        any::<u64>(),
        position_strategy(),
        prop::collection::vec(event_strategy(), 0..4),
    )
        .prop_map(|(client_id, seq, position, events)| {
            let mut entry = LogEntry::new(client_id).with_seq(seq).at(position);
            entry.events = events;
            entry
        })
}

/// Strategy for entries the JSON publish form can carry.
///
/// Sequence numbers stay within `i64` so they survive a JSON integer.
pub fn json_safe_entry_strategy() -> impl Strategy<Value = LogEntry> {
    (
        client_id_strategy(),
        0..i64::MAX as u64,
        prop::collection::vec(json_safe_event_strategy(), 0..4),
    )
        .prop_map(|(client_id, seq, events)| {
            let mut entry = LogEntry::new(client_id).with_seq(seq);
            entry.events = events;
            entry
        })
}

/// Strategy for headers that pass validation.
pub fn header_strategy() -> impl Strategy<Value = LocalLogHeader> {
    (
        1..=LOCAL_LOG_VERSION,
        position_strategy(),
        any::<u32>(),
        0..u64::MAX / 2,
        0..u64::MAX / 2,
    )
        .prop_map(|(version, position, entries, extra, published)| {
            let sequence = u64::from(entries) + extra;
            LocalLogHeader {
                version,
                block_id: position.block_id,
                block_index: position.block_index,
                next_publish: published.min(sequence),
                sequence,
                entries,
                ..LocalLogHeader::new()
            }
        })
}

/// Strategy for a batch of SQL statements to append.
pub fn statements_strategy(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[A-Z]{3,8} [a-z]{1,8}", 0..max)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests, such as ones touching disk.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn generated_headers_validate(header in header_strategy()) {
            prop_assert!(header.validate().is_ok());
        }

        #[test]
        fn json_safe_entries_encode_as_json(entry in json_safe_entry_strategy()) {
            prop_assert!(entry.to_json().is_ok());
        }

        #[test]
        fn client_ids_are_not_empty(id in client_id_strategy()) {
            prop_assert!(!id.is_empty());
        }
    }
}
