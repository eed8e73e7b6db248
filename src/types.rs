//! Envelope wire types: identity, query mode, and the envelope itself.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EnvelopeError, Result};

/// Kind tag for a plaintext-carrying envelope.
pub const PLAINTEXT_KIND: &str = "pt";

/// Kind tag the downstream service uses for ciphertext envelopes.
pub const CIPHERTEXT_KIND: &str = "ct";

/// Current envelope schema version.
pub const ENVELOPE_VERSION: u64 = 1;

// ============================================================================
// Identity
// ============================================================================

/// The `{t, c}` pair naming the table and column a value belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    t: String,
    c: String,
}

impl Identity {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            t: table.into(),
            c: column.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.t
    }

    pub fn column(&self) -> &str {
        &self.c
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.t, self.c)
    }
}

// ============================================================================
// QueryMode
// ============================================================================

/// Tag telling the downstream service how an envelope will be queried.
///
/// The set is open: tags this crate does not know are carried verbatim in
/// `Other`. Only [`QueryMode::EjsonPath`] changes how a value is encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QueryMode {
    /// Structured (vector) search over a document: `ste_vec`.
    SteVec,
    /// Path selector into a document: `ejson_path`.
    EjsonPath,
    Unique,
    Match,
    Ore,
    Other(String),
}

impl QueryMode {
    pub fn as_str(&self) -> &str {
        match self {
            QueryMode::SteVec => "ste_vec",
            QueryMode::EjsonPath => "ejson_path",
            QueryMode::Unique => "unique",
            QueryMode::Match => "match",
            QueryMode::Ore => "ore",
            QueryMode::Other(tag) => tag,
        }
    }

    /// Whether a document value under this mode is a path expression rather
    /// than a document.
    pub fn is_path_query(&self) -> bool {
        matches!(self, QueryMode::EjsonPath)
    }
}

impl From<String> for QueryMode {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "ste_vec" => QueryMode::SteVec,
            "ejson_path" => QueryMode::EjsonPath,
            "unique" => QueryMode::Unique,
            "match" => QueryMode::Match,
            "ore" => QueryMode::Ore,
            _ => QueryMode::Other(tag),
        }
    }
}

impl From<&str> for QueryMode {
    fn from(tag: &str) -> Self {
        QueryMode::from(tag.to_string())
    }
}

impl From<QueryMode> for String {
    fn from(mode: QueryMode) -> Self {
        match mode {
            QueryMode::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// One encryptable value as exchanged with the database encryption layer.
///
/// Field declaration order is the wire order:
/// `{"k":"pt","p":...,"i":{"t":...,"c":...},"v":1,"q":...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Kind discriminator.
    pub k: String,
    /// Payload. A string for every type except a structural document.
    pub p: Value,
    /// Origin identity.
    pub i: Identity,
    /// Schema version.
    pub v: u64,
    /// Query mode, serialized as `null` when absent.
    pub q: Option<QueryMode>,
}

impl Envelope {
    /// Build a plaintext envelope around an already-serialized payload.
    pub fn plaintext(payload: String, identity: Identity, query_mode: Option<QueryMode>) -> Self {
        Self {
            k: PLAINTEXT_KIND.to_string(),
            p: Value::String(payload),
            i: identity,
            v: ENVELOPE_VERSION,
            q: query_mode,
        }
    }

    /// Read an envelope out of an already-parsed JSON structure.
    ///
    /// `k` may be omitted (older writers only emitted `p` and `i`), but when
    /// present it must be `"pt"`. `p` and `i` are required.
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            EnvelopeError::MalformedEnvelope(format!("expected a JSON object, got {value}"))
        })?;

        let k = match obj.get("k") {
            None | Some(Value::Null) => PLAINTEXT_KIND.to_string(),
            Some(Value::String(k)) if k == PLAINTEXT_KIND => k.clone(),
            Some(Value::String(k)) => return Err(EnvelopeError::UnsupportedKind(k.clone())),
            Some(other) => {
                return Err(EnvelopeError::MalformedEnvelope(format!(
                    "\"k\" must be a string, got {other}"
                )))
            }
        };

        let p = match obj.get("p") {
            None | Some(Value::Null) => {
                return Err(EnvelopeError::MalformedEnvelope(
                    "missing \"p\" field".to_string(),
                ))
            }
            Some(p) => p.clone(),
        };

        let i = match obj.get("i") {
            None | Some(Value::Null) => {
                return Err(EnvelopeError::MalformedEnvelope(
                    "missing \"i\" field".to_string(),
                ))
            }
            Some(i) => Identity::deserialize(i).map_err(|e| {
                EnvelopeError::MalformedEnvelope(format!("invalid \"i\" field: {e}"))
            })?,
        };

        let v = match obj.get("v") {
            None | Some(Value::Null) => ENVELOPE_VERSION,
            Some(v) => v.as_u64().ok_or_else(|| {
                EnvelopeError::MalformedEnvelope(format!("\"v\" must be an integer, got {v}"))
            })?,
        };

        let q = match obj.get("q") {
            None | Some(Value::Null) => None,
            Some(Value::String(tag)) => Some(QueryMode::from(tag.as_str())),
            Some(other) => {
                return Err(EnvelopeError::MalformedEnvelope(format!(
                    "\"q\" must be a string, got {other}"
                )))
            }
        };

        Ok(Self { k, p, i, v, q })
    }

    /// Parse envelope JSON text.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    /// Serialize to canonical compact JSON text.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// The textual payload, if this is a plaintext envelope with a string `p`.
    pub fn plaintext_payload(&self) -> Option<&str> {
        if self.k == PLAINTEXT_KIND {
            self.p.as_str()
        } else {
            None
        }
    }
}
