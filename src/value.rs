//! Native values, their kinds, and the typed value wrapper.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde_json::Value;

use crate::codec::{self, DecodeOptions};
use crate::error::{EnvelopeError, Result};
use crate::types::{Envelope, Identity, QueryMode};

// ============================================================================
// ValueKind
// ============================================================================

/// The closed set of value kinds an envelope can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Integer,
    Boolean,
    Date,
    Float,
    Text,
    Document,
}

impl ValueKind {
    pub const ALL: [ValueKind; 6] = [
        ValueKind::Integer,
        ValueKind::Boolean,
        ValueKind::Date,
        ValueKind::Float,
        ValueKind::Text,
        ValueKind::Document,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Integer => "integer",
            ValueKind::Boolean => "boolean",
            ValueKind::Date => "date",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
            ValueKind::Document => "document",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts the kind names above as well as the database `cast_as` names
/// (`int`, `small_int`, `big_int`, `real`, `double`, `jsonb`, ...).
impl FromStr for ValueKind {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "integer" | "int" | "small_int" | "big_int" => Ok(ValueKind::Integer),
            "boolean" | "bool" => Ok(ValueKind::Boolean),
            "date" => Ok(ValueKind::Date),
            "float" | "real" | "double" => Ok(ValueKind::Float),
            "text" | "utf8_str" => Ok(ValueKind::Text),
            "document" | "jsonb" => Ok(ValueKind::Document),
            other => Err(EnvelopeError::InvalidValue(format!(
                "unknown value kind \"{other}\""
            ))),
        }
    }
}

// ============================================================================
// PlainValue
// ============================================================================

/// A native value of one of the supported kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum PlainValue {
    Integer(i64),
    Boolean(bool),
    Date(NaiveDate),
    Float(f64),
    Text(String),
    /// A JSON document. Under a path query this holds the path expression
    /// as a JSON string.
    Document(Value),
}

impl PlainValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            PlainValue::Integer(_) => ValueKind::Integer,
            PlainValue::Boolean(_) => ValueKind::Boolean,
            PlainValue::Date(_) => ValueKind::Date,
            PlainValue::Float(_) => ValueKind::Float,
            PlainValue::Text(_) => ValueKind::Text,
            PlainValue::Document(_) => ValueKind::Document,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PlainValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PlainValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            PlainValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PlainValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PlainValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Value> {
        match self {
            PlainValue::Document(doc) => Some(doc),
            _ => None,
        }
    }
}

impl From<i64> for PlainValue {
    fn from(n: i64) -> Self {
        PlainValue::Integer(n)
    }
}

impl From<i32> for PlainValue {
    fn from(n: i32) -> Self {
        PlainValue::Integer(i64::from(n))
    }
}

impl From<bool> for PlainValue {
    fn from(b: bool) -> Self {
        PlainValue::Boolean(b)
    }
}

impl From<NaiveDate> for PlainValue {
    fn from(d: NaiveDate) -> Self {
        PlainValue::Date(d)
    }
}

impl From<f64> for PlainValue {
    fn from(f: f64) -> Self {
        PlainValue::Float(f)
    }
}

impl From<String> for PlainValue {
    fn from(s: String) -> Self {
        PlainValue::Text(s)
    }
}

impl From<&str> for PlainValue {
    fn from(s: &str) -> Self {
        PlainValue::Text(s.to_string())
    }
}

impl From<Value> for PlainValue {
    fn from(doc: Value) -> Self {
        PlainValue::Document(doc)
    }
}

// ============================================================================
// TypedValue
// ============================================================================

/// A native value paired with the identity of the column it belongs to.
///
/// Built right before encoding or right after decoding; the identity cannot
/// change after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedValue {
    value: PlainValue,
    identity: Identity,
}

impl TypedValue {
    pub fn new(
        value: impl Into<PlainValue>,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            value: value.into(),
            identity: Identity::new(table, column),
        }
    }

    pub fn with_identity(value: impl Into<PlainValue>, identity: Identity) -> Self {
        Self {
            value: value.into(),
            identity,
        }
    }

    pub fn value(&self) -> &PlainValue {
        &self.value
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn kind(&self) -> ValueKind {
        self.value.kind()
    }

    pub fn into_value(self) -> PlainValue {
        self.value
    }

    /// Encode to envelope JSON text.
    pub fn to_db_format(&self, query_mode: Option<&QueryMode>) -> Result<String> {
        codec::encode_with_identity(&self.value, &self.identity, query_mode)
    }

    /// Decode a parsed envelope as `kind`, keeping the identity it carries.
    pub fn from_parsed_json(envelope: &Value, kind: ValueKind) -> Result<Self> {
        Self::from_parsed_json_with(envelope, kind, &DecodeOptions::default())
    }

    pub fn from_parsed_json_with(
        envelope: &Value,
        kind: ValueKind,
        opts: &DecodeOptions,
    ) -> Result<Self> {
        let envelope = Envelope::from_value(envelope)?;
        let value = codec::decode_envelope(&envelope, kind, opts)?;
        Ok(Self {
            value,
            identity: envelope.i,
        })
    }
}
