//! Typed value envelope codec for encrypted database columns.
//!
//! Values are wrapped in a JSON envelope
//! `{"k":"pt","p":<payload>,"i":{"t":<table>,"c":<column>},"v":1,"q":<mode>}`
//! that a database-side encryption layer consumes and produces. This crate
//! builds those envelopes from native values, decodes them back, and decodes
//! whole result rows.

pub mod adapter;
pub mod codec;
pub mod error;
pub mod format;
pub mod row;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod types;
pub mod value;

pub use adapter::{ColumnAdapter, EncryptedColumn};
pub use codec::{
    decode, decode_with, ejson_path_query, encode, encode_payload, jsonb_query, serialize_query,
    DecodeOptions,
};
pub use error::{EnvelopeError, Result};
pub use row::{decode_row, decode_rows, ColumnRegistry, DecodedRow, RowValue};
#[cfg(feature = "sqlite")]
pub use sqlite::{decode_sqlite_row, row_to_json};
pub use types::{Envelope, Identity, QueryMode, ENVELOPE_VERSION, PLAINTEXT_KIND};
pub use value::{PlainValue, TypedValue, ValueKind};
