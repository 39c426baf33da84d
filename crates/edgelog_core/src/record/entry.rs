//! Durable units of local history.

use super::{
    element_count, json_array, json_object, json_str, json_u64, optional, required,
    with_capacity_for, Event,
};
use crate::error::{CoreError, CoreResult};
use crate::types::BlockPosition;
use edgelog_codec::{Buffer, CodecResult, Decode, Encode};
use serde_json::{json, Value as Json};

/// One durable unit of local history.
///
/// `seq` is assigned by the log on append; whatever the caller sets is
/// overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogEntry {
    /// Upstream block this entry is associated with, 0 until confirmed.
    pub block_id: u64,
    /// Index within `block_id`, 0 until confirmed.
    pub block_index: u64,
    /// Originating device or session.
    pub client_id: String,
    /// Per-client sequence number.
    pub seq: u64,
    /// Statements, in execution order.
    pub events: Vec<Event>,
}

impl LogEntry {
    /// Creates an unconfirmed entry with no events.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            ..Self::default()
        }
    }

    /// Appends an event.
    #[must_use]
    pub fn with_event(mut self, event: Event) -> Self {
        self.events.push(event);
        self
    }

    /// Sets the sequence number.
    #[must_use]
    pub fn with_seq(mut self, seq: u64) -> Self {
        self.seq = seq;
        self
    }

    /// Sets the block position.
    #[must_use]
    pub fn at(mut self, position: BlockPosition) -> Self {
        self.block_id = position.block_id;
        self.block_index = position.block_index;
        self
    }

    /// Returns the block position.
    #[must_use]
    pub fn position(&self) -> BlockPosition {
        BlockPosition::new(self.block_id, self.block_index)
    }

    /// Builds the JSON publish form. The block position is not included.
    ///
    /// # Errors
    ///
    /// Propagates [`Event::to_json`] failures.
    pub fn to_json(&self) -> CoreResult<Json> {
        let events = self
            .events
            .iter()
            .map(Event::to_json)
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(json!({
            "client_id": self.client_id,
            "client_seq": self.seq,
            "events": events,
        }))
    }

    /// Serializes the JSON publish form to bytes.
    ///
    /// # Errors
    ///
    /// Propagates [`LogEntry::to_json`] failures.
    pub fn to_json_vec(&self) -> CoreResult<Vec<u8>> {
        let doc = self.to_json()?;
        serde_json::to_vec(&doc).map_err(|e| CoreError::json_shape("entry", e.to_string()))
    }

    /// Parses an inbound JSON entry.
    ///
    /// `block_id` and `block_index` are required. `client_id`, `client_seq`
    /// and `events` are nullable.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::JsonShape`] naming the offending field.
    pub fn from_json(doc: &Json) -> CoreResult<Self> {
        let obj = json_object(doc, "entry")?;
        let client_id = match optional(obj, "client_id") {
            Some(v) => json_str(v, "client_id")?.to_string(),
            None => String::new(),
        };
        let seq = match optional(obj, "client_seq") {
            Some(v) => json_u64(v, "client_seq")?,
            None => 0,
        };
        let block_id = json_u64(required(obj, "block_id")?, "block_id")?;
        let block_index = json_u64(required(obj, "block_index")?, "block_index")?;
        let events = match optional(obj, "events") {
            Some(v) => json_array(v, "events")?
                .iter()
                .map(Event::from_json)
                .collect::<CoreResult<Vec<_>>>()?,
            None => Vec::new(),
        };
        Ok(Self {
            block_id,
            block_index,
            client_id,
            seq,
            events,
        })
    }

    /// Parses an inbound JSON payload, as received from a broker.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::JsonShape`] for unparsable text or a bad shape.
    pub fn from_json_slice(payload: &[u8]) -> CoreResult<Self> {
        let doc: Json = serde_json::from_slice(payload)
            .map_err(|e| CoreError::json_shape("entry", e.to_string()))?;
        Self::from_json(&doc)
    }
}

impl Encode for LogEntry {
    fn encode(&self, buf: &mut Buffer<'_>) -> CodecResult<()> {
        buf.put_u64(self.block_id);
        buf.put_u64(self.block_index);
        buf.put_str(&self.client_id)?;
        buf.put_u64(self.seq);
        buf.put_u32(element_count(self.events.len(), "event")?);
        for event in &self.events {
            event.encode(buf)?;
        }
        Ok(())
    }
}

impl Decode for LogEntry {
    fn decode(buf: &mut Buffer<'_>) -> CodecResult<Self> {
        let block_id = buf.get_u64()?;
        let block_index = buf.get_u64()?;
        let client_id = buf.get_string()?;
        let seq = buf.get_u64()?;
        let count = buf.get_u32()?;
        let mut events = with_capacity_for(count);
        for _ in 0..count {
            events.push(Event::decode(buf)?);
        }
        Ok(Self {
            block_id,
            block_index,
            client_id,
            seq,
            events,
        })
    }
}
