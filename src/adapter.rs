//! Column adapter: the bind/result hooks a host mapper calls for one
//! encrypted column.
//!
//! The identity is captured when the column is declared and never re-derived
//! per call. `None` (SQL null) goes straight through both hooks without
//! touching the codec.

use serde_json::Value;

use crate::codec::{self, DecodeOptions};
use crate::error::{EnvelopeError, Result};
use crate::types::{Envelope, Identity, QueryMode};
use crate::value::{PlainValue, ValueKind};

/// Bind/result hooks for one column.
pub trait ColumnAdapter: Send + Sync {
    /// Serialize a value for a write. `None` in, `None` out.
    fn bind(&self, value: Option<&PlainValue>) -> Result<Option<String>>;

    /// Materialize a column read, given either a parsed envelope structure or
    /// envelope JSON text. `None`/`null` in, `None` out.
    fn result(&self, raw: Option<&Value>) -> Result<Option<PlainValue>>;
}

/// An encrypted column declaration: kind, identity, and default query mode.
#[derive(Debug, Clone)]
pub struct EncryptedColumn {
    kind: ValueKind,
    identity: Identity,
    query_mode: Option<QueryMode>,
    options: DecodeOptions,
}

impl EncryptedColumn {
    pub fn new(kind: ValueKind, table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            kind,
            identity: Identity::new(table, column),
            query_mode: None,
            options: DecodeOptions::default(),
        }
    }

    pub fn integer(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::new(ValueKind::Integer, table, column)
    }

    pub fn boolean(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::new(ValueKind::Boolean, table, column)
    }

    pub fn date(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::new(ValueKind::Date, table, column)
    }

    pub fn float(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::new(ValueKind::Float, table, column)
    }

    pub fn text(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::new(ValueKind::Text, table, column)
    }

    pub fn document(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::new(ValueKind::Document, table, column)
    }

    /// Query mode attached to every bind.
    pub fn with_query_mode(mut self, query_mode: QueryMode) -> Self {
        self.query_mode = Some(query_mode);
        self
    }

    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn query_mode(&self) -> Option<&QueryMode> {
        self.query_mode.as_ref()
    }

    /// Bind with an explicit query mode for this call, overriding the
    /// column's default.
    pub fn bind_for_query(
        &self,
        value: Option<&PlainValue>,
        query_mode: Option<&QueryMode>,
    ) -> Result<Option<String>> {
        match value {
            None => Ok(None),
            Some(value) => {
                codec::encode_as(self.kind, value, &self.identity, query_mode).map(Some)
            }
        }
    }
}

impl ColumnAdapter for EncryptedColumn {
    fn bind(&self, value: Option<&PlainValue>) -> Result<Option<String>> {
        self.bind_for_query(value, self.query_mode.as_ref())
    }

    fn result(&self, raw: Option<&Value>) -> Result<Option<PlainValue>> {
        let parsed;
        let structure = match raw {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(text)) => {
                parsed = serde_json::from_str::<Value>(text).map_err(|e| {
                    EnvelopeError::MalformedEnvelope(format!(
                        "column {} holds text that is not an envelope: {e}",
                        self.identity
                    ))
                })?;
                &parsed
            }
            Some(structure) => structure,
        };
        let envelope = Envelope::from_value(structure)?;
        codec::decode_envelope(&envelope, self.kind, &self.options).map(Some)
    }
}
