//! Row decoding: apply the envelope codec to every registered column of a
//! result row, passing everything else through.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::codec::{self, DecodeOptions};
use crate::error::Result;
use crate::value::{PlainValue, ValueKind};

// ============================================================================
// ColumnRegistry
// ============================================================================

/// Column name → value kind mapping used to decode rows.
///
/// Built once, then only read; share it behind an `Arc` across threads.
#[derive(Debug, Clone, Default)]
pub struct ColumnRegistry {
    columns: HashMap<String, ValueKind>,
    options: DecodeOptions,
}

impl ColumnRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry for the conventional encrypted column names
    /// (`encrypted_int`, `encrypted_boolean`, `encrypted_date`,
    /// `encrypted_float`, `encrypted_utf8_str`, `encrypted_jsonb`).
    pub fn conventional() -> Self {
        Self::new()
            .register("encrypted_int", ValueKind::Integer)
            .register("encrypted_boolean", ValueKind::Boolean)
            .register("encrypted_date", ValueKind::Date)
            .register("encrypted_float", ValueKind::Float)
            .register("encrypted_utf8_str", ValueKind::Text)
            .register("encrypted_jsonb", ValueKind::Document)
    }

    /// Register (or replace) the kind of a column.
    pub fn register(mut self, column: impl Into<String>, kind: ValueKind) -> Self {
        self.columns.insert(column.into(), kind);
        self
    }

    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn kind_of(&self, column: &str) -> Option<ValueKind> {
        self.columns.get(column).copied()
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// ============================================================================
// DecodedRow
// ============================================================================

/// One column of a decoded row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowValue {
    Null,
    /// A registered column decoded through its kind's rule.
    Decoded(PlainValue),
    /// An unregistered column, unchanged.
    Raw(Value),
}

impl RowValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RowValue::Null)
    }

    pub fn as_decoded(&self) -> Option<&PlainValue> {
        match self {
            RowValue::Decoded(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&Value> {
        match self {
            RowValue::Raw(v) => Some(v),
            _ => None,
        }
    }
}

/// Decoded row, in the column order of the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedRow {
    columns: Vec<(String, RowValue)>,
}

impl DecodedRow {
    pub fn get(&self, column: &str) -> Option<&RowValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &RowValue)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn into_columns(self) -> Vec<(String, RowValue)> {
        self.columns
    }
}

// ============================================================================
// decode_row
// ============================================================================

/// Decode every column of `row`.
///
/// - `null` stays null;
/// - a registered column is decoded with its kind's rule;
/// - an unregistered column passes through unchanged.
///
/// All or nothing: the first column that fails to decode aborts the row, and
/// the returned error names that column.
pub fn decode_row(registry: &ColumnRegistry, row: &Map<String, Value>) -> Result<DecodedRow> {
    let mut columns = Vec::with_capacity(row.len());
    let mut decoded = 0usize;

    for (name, value) in row {
        let cell = match (value, registry.kind_of(name)) {
            (Value::Null, _) => RowValue::Null,
            (value, Some(kind)) => {
                let plain = codec::decode_with(value, kind, registry.options())
                    .map_err(|e| e.in_column(name.as_str()))?;
                decoded += 1;
                RowValue::Decoded(plain)
            }
            (value, None) => RowValue::Raw(value.clone()),
        };
        columns.push((name.clone(), cell));
    }

    tracing::debug!(
        columns = columns.len(),
        decoded,
        "decoded result row"
    );
    Ok(DecodedRow { columns })
}

/// Decode a batch of rows, stopping at the first failing row.
pub fn decode_rows<'a, I>(registry: &ColumnRegistry, rows: I) -> Result<Vec<DecodedRow>>
where
    I: IntoIterator<Item = &'a Map<String, Value>>,
{
    rows.into_iter().map(|row| decode_row(registry, row)).collect()
}
