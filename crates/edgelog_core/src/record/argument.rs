//! Bound SQL parameters.

use super::{json_object, json_str, optional, required};
use crate::error::{CoreError, CoreResult};
use edgelog_codec::{Buffer, CodecError, CodecResult, Decode, Encode};
use serde_json::{json, Number, Value as Json};

/// Type tag of an argument, as written to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ArgumentType {
    /// SQL NULL.
    Null = 0,
    /// UTF-8 text.
    String = 1,
    /// 64-bit signed integer.
    Int = 2,
    /// 64-bit float.
    Float = 3,
    /// Opaque bytes.
    Blob = 4,
}

impl ArgumentType {
    /// Converts a tag byte to an argument type.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Null),
            1 => Some(Self::String),
            2 => Some(Self::Int),
            3 => Some(Self::Float),
            4 => Some(Self::Blob),
            _ => None,
        }
    }

    /// Converts the argument type to its tag byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

/// A typed argument value.
///
/// Float equality compares bit patterns, so `NaN == NaN` and
/// `0.0 != -0.0`. This matches how floats travel through the log.
#[derive(Debug, Clone)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// UTF-8 text.
    String(String),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit float.
    Float(f64),
    /// Opaque bytes.
    Blob(Vec<u8>),
}

impl Value {
    /// Returns the type tag for this value.
    #[must_use]
    pub fn arg_type(&self) -> ArgumentType {
        match self {
            Self::Null => ArgumentType::Null,
            Self::String(_) => ArgumentType::String,
            Self::Int(_) => ArgumentType::Int,
            Self::Float(_) => ArgumentType::Float,
            Self::Blob(_) => ArgumentType::Blob,
        }
    }

    /// Returns true for SQL NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Blob(a), Self::Blob(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Blob(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// One bound SQL parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    /// Parameter name, empty for positional parameters.
    pub name: String,
    /// Typed value.
    pub value: Value,
}

impl Argument {
    /// Creates a named argument.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Creates a positional argument.
    pub fn positional(value: impl Into<Value>) -> Self {
        Self::new(String::new(), value)
    }

    /// Returns the type tag.
    #[must_use]
    pub fn arg_type(&self) -> ArgumentType {
        self.value.arg_type()
    }

    /// Builds the JSON publish form.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::JsonShape`] for a non-finite float or a blob
    /// that is not valid UTF-8, neither of which JSON can carry.
    pub fn to_json(&self) -> CoreResult<Json> {
        let value = match &self.value {
            Value::Null => Json::Null,
            Value::String(s) => Json::String(s.clone()),
            Value::Int(n) => Json::from(*n),
            Value::Float(f) => Number::from_f64(*f)
                .map(Json::Number)
                .ok_or_else(|| CoreError::json_shape("value", format!("non-finite float {f}")))?,
            Value::Blob(bytes) => std::str::from_utf8(bytes)
                .map(|s| Json::String(s.to_string()))
                .map_err(|_| CoreError::json_shape("value", "blob is not valid UTF-8"))?,
        };
        Ok(json!({
            "name": self.name,
            "type": self.arg_type().as_byte(),
            "value": value,
        }))
    }

    /// Parses an inbound JSON argument.
    ///
    /// `name` is nullable. `type` is required, and so is `value` unless the
    /// type is Null. Floats must be JSON floats and ints JSON integers.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::JsonShape`] naming the first offending field.
    pub fn from_json(doc: &Json) -> CoreResult<Self> {
        let obj = json_object(doc, "argument")?;

        let name = match optional(obj, "name") {
            Some(v) => json_str(v, "name")?.to_string(),
            None => String::new(),
        };

        let tag = required(obj, "type")?
            .as_u64()
            .ok_or_else(|| CoreError::json_shape("type", "expected an integer"))?;
        let arg_type = u8::try_from(tag)
            .ok()
            .and_then(ArgumentType::from_byte)
            .ok_or_else(|| CoreError::json_shape("type", format!("unknown argument type {tag}")))?;

        if arg_type == ArgumentType::Null {
            return Ok(Self::new(name, Value::Null));
        }

        let raw = required(obj, "value")?;
        let value = match arg_type {
            ArgumentType::Null => Value::Null,
            ArgumentType::String => Value::String(json_str(raw, "value")?.to_string()),
            ArgumentType::Int => Value::Int(
                raw.as_i64()
                    .ok_or_else(|| CoreError::json_shape("value", "expected an integer"))?,
            ),
            ArgumentType::Float => {
                if !raw.is_f64() {
                    return Err(CoreError::json_shape("value", "expected a float"));
                }
                Value::Float(raw.as_f64().unwrap_or_default())
            }
            ArgumentType::Blob => Value::Blob(json_str(raw, "value")?.as_bytes().to_vec()),
        };
        Ok(Self { name, value })
    }
}

impl Encode for Argument {
    fn encode(&self, buf: &mut Buffer<'_>) -> CodecResult<()> {
        buf.put_str(&self.name)?;
        buf.put_u8(self.arg_type().as_byte());
        match &self.value {
            Value::Null => {}
            Value::String(s) => buf.put_str(s)?,
            Value::Int(n) => buf.put_u64(*n as u64),
            Value::Float(f) => buf.put_f64(*f),
            Value::Blob(b) => buf.put_blob(b)?,
        }
        Ok(())
    }
}

impl Decode for Argument {
    fn decode(buf: &mut Buffer<'_>) -> CodecResult<Self> {
        let name = buf.get_string()?;
        let tag = buf.get_u8()?;
        let arg_type = ArgumentType::from_byte(tag)
            .ok_or_else(|| CodecError::invalid_structure(format!("unknown argument type {tag}")))?;
        let value = match arg_type {
            ArgumentType::Null => Value::Null,
            ArgumentType::String => Value::String(buf.get_string()?),
            ArgumentType::Int => Value::Int(buf.get_u64()? as i64),
            ArgumentType::Float => Value::Float(buf.get_f64()?),
            ArgumentType::Blob => Value::Blob(buf.get_blob()?),
        };
        Ok(Self { name, value })
    }
}
