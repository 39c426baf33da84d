//! Executed SQL statements.

use super::{
    element_count, json_array, json_object, json_str, optional, required, with_capacity_for,
    Argument,
};
use crate::error::CoreResult;
use edgelog_codec::{Buffer, CodecResult, Decode, Encode};
use serde_json::{json, Value as Json};

/// One executed SQL statement with its positionally bound arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    /// SQL text, possibly containing placeholders.
    pub pattern: String,
    /// Arguments bound to `pattern`, in order.
    pub args: Vec<Argument>,
}

impl Event {
    /// Creates an event without arguments.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            args: Vec::new(),
        }
    }

    /// Attaches bound arguments.
    #[must_use]
    pub fn with_args(mut self, args: Vec<Argument>) -> Self {
        self.args = args;
        self
    }

    /// Builds the JSON publish form.
    ///
    /// # Errors
    ///
    /// Propagates [`Argument::to_json`] failures.
    pub fn to_json(&self) -> CoreResult<Json> {
        let args = self
            .args
            .iter()
            .map(Argument::to_json)
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(json!({ "pattern": self.pattern, "args": args }))
    }

    /// Parses an inbound JSON event. `pattern` is required, `args` nullable.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::JsonShape`] naming the offending field.
    pub fn from_json(doc: &Json) -> CoreResult<Self> {
        let obj = json_object(doc, "event")?;
        let pattern = json_str(required(obj, "pattern")?, "pattern")?.to_string();
        let args = match optional(obj, "args") {
            Some(v) => json_array(v, "args")?
                .iter()
                .map(Argument::from_json)
                .collect::<CoreResult<Vec<_>>>()?,
            None => Vec::new(),
        };
        Ok(Self { pattern, args })
    }
}

impl Encode for Event {
    fn encode(&self, buf: &mut Buffer<'_>) -> CodecResult<()> {
        buf.put_str(&self.pattern)?;
        buf.put_u32(element_count(self.args.len(), "argument")?);
        for arg in &self.args {
            arg.encode(buf)?;
        }
        Ok(())
    }
}

impl Decode for Event {
    fn decode(buf: &mut Buffer<'_>) -> CodecResult<Self> {
        let pattern = buf.get_string()?;
        let count = buf.get_u32()?;
        let mut args = with_capacity_for(count);
        for _ in 0..count {
            args.push(Argument::decode(buf)?);
        }
        Ok(Self { pattern, args })
    }
}
