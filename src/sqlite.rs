//! rusqlite glue: bind envelopes as statement parameters and read envelope
//! columns (or whole rows) back out of result rows.
//!
//! Envelopes are stored as TEXT. `row_to_json` turns every TEXT cell that
//! holds a JSON object into a parsed structure, the shape the row decoder
//! expects from an execution layer. `decode_sqlite_row` only does so for
//! registered columns, so plain TEXT columns come back exactly as stored.

use rusqlite::types::{Type, Value as SqlValue, ValueRef};
use rusqlite::Row;
use serde_json::{Map, Number, Value};

use crate::adapter::{ColumnAdapter, EncryptedColumn};
use crate::error::Result;
use crate::row::{decode_row, ColumnRegistry, DecodedRow};
use crate::value::PlainValue;

impl EncryptedColumn {
    /// Bind hook producing a rusqlite parameter (TEXT envelope or NULL).
    pub fn to_sql(&self, value: Option<&PlainValue>) -> Result<SqlValue> {
        Ok(match self.bind(value)? {
            Some(text) => SqlValue::Text(text),
            None => SqlValue::Null,
        })
    }

    /// Result hook reading column `idx` of a result row.
    pub fn read(&self, row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<PlainValue>> {
        let raw = match row.get_ref(idx)? {
            ValueRef::Null => return Ok(None),
            ValueRef::Text(bytes) => std::str::from_utf8(bytes)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))?,
            other => {
                let name = row.as_ref().column_name(idx)?.to_string();
                return Err(rusqlite::Error::InvalidColumnType(idx, name, other.data_type()));
            }
        };
        self.result(Some(&Value::String(raw.to_string())))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    }
}

/// Convert a result row into an ordered column → JSON mapping.
///
/// Any TEXT cell holding a JSON object is parsed, registered or not.
pub fn row_to_json(row: &Row<'_>) -> rusqlite::Result<Map<String, Value>> {
    collect_row(row, |_| true)
}

fn collect_row(
    row: &Row<'_>,
    parse_text: impl Fn(&str) -> bool,
) -> rusqlite::Result<Map<String, Value>> {
    let stmt = row.as_ref();
    let mut out = Map::new();
    for idx in 0..stmt.column_count() {
        let name = stmt.column_name(idx)?.to_string();
        let value = match row.get_ref(idx)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(n) => Value::from(n),
            ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
            ValueRef::Text(bytes) => {
                let text = std::str::from_utf8(bytes).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
                })?;
                if parse_text(&name) {
                    text_to_json(text)
                } else {
                    Value::String(text.to_string())
                }
            }
            ValueRef::Blob(_) => {
                return Err(rusqlite::Error::InvalidColumnType(idx, name, Type::Blob));
            }
        };
        out.insert(name, value);
    }
    Ok(out)
}

/// TEXT holding a JSON object becomes a structure; anything else stays text.
fn text_to_json(text: &str) -> Value {
    if text.trim_start().starts_with('{') {
        if let Ok(parsed @ Value::Object(_)) = serde_json::from_str::<Value>(text) {
            return parsed;
        }
    }
    Value::String(text.to_string())
}

/// Read a result row and run it through the row decoder.
///
/// Only registered columns are parsed as envelopes; every other TEXT cell is
/// passed through as `RowValue::Raw(Value::String(..))`, even when it holds
/// JSON.
pub fn decode_sqlite_row(registry: &ColumnRegistry, row: &Row<'_>) -> Result<DecodedRow> {
    let json = collect_row(row, |name| registry.kind_of(name).is_some())?;
    decode_row(registry, &json)
}
