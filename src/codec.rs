//! Per-kind payload rules and envelope encode/decode.
//!
//! Every [`ValueKind`] has exactly one entry in the dispatch table, pairing
//! an encoder (native value → payload string) with a decoder (envelope →
//! native value). Adding a kind means adding an enum variant and its entry.
//!
//! | Kind     | Payload                         | Query mode sensitive |
//! |----------|---------------------------------|----------------------|
//! | integer  | decimal string                  | no                   |
//! | boolean  | `"true"` / `"false"`            | no                   |
//! | date     | ISO-8601 calendar date          | no                   |
//! | float    | shortest round-trip decimal     | no                   |
//! | text     | the string itself               | no                   |
//! | document | JSON text, or a path expression | yes (`ejson_path`)   |

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::error::{EnvelopeError, Result};
use crate::format::to_spaced_string;
use crate::types::{Envelope, Identity, QueryMode};
use crate::value::{PlainValue, ValueKind};

// ============================================================================
// DecodeOptions
// ============================================================================

/// Options controlling decode behavior.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Fail with `UnparsablePayload` when a document payload is not JSON.
    /// When `false` (the default) the raw payload string is returned instead,
    /// since payloads written by other encoders may hold pre-serialized text.
    pub strict_documents: bool,
}

// ============================================================================
// Dispatch table
// ============================================================================

pub type EncodeFn = fn(&PlainValue, Option<&QueryMode>) -> Result<String>;
pub type DecodeFn = fn(&Envelope, &DecodeOptions) -> Result<PlainValue>;

/// Encode/decode pair for one value kind.
pub struct KindCodec {
    pub kind: ValueKind,
    pub encode: EncodeFn,
    pub decode: DecodeFn,
}

// Indexed by `ValueKind as usize`.
static CODECS: [KindCodec; 6] = [
    KindCodec {
        kind: ValueKind::Integer,
        encode: encode_integer,
        decode: decode_integer,
    },
    KindCodec {
        kind: ValueKind::Boolean,
        encode: encode_boolean,
        decode: decode_boolean,
    },
    KindCodec {
        kind: ValueKind::Date,
        encode: encode_date,
        decode: decode_date,
    },
    KindCodec {
        kind: ValueKind::Float,
        encode: encode_float,
        decode: decode_float,
    },
    KindCodec {
        kind: ValueKind::Text,
        encode: encode_text,
        decode: decode_text,
    },
    KindCodec {
        kind: ValueKind::Document,
        encode: encode_document,
        decode: decode_document,
    },
];

/// Look up the codec for a kind.
pub fn codec_for(kind: ValueKind) -> &'static KindCodec {
    &CODECS[kind as usize]
}

// ============================================================================
// Public API
// ============================================================================

/// Encode a value into envelope JSON text for `table`.`column`.
///
/// Callers handle null themselves: a null value has no envelope.
pub fn encode(
    value: &PlainValue,
    table: &str,
    column: &str,
    query_mode: Option<&QueryMode>,
) -> Result<String> {
    encode_with_identity(value, &Identity::new(table, column), query_mode)
}

/// Encode with an already-built identity.
pub fn encode_with_identity(
    value: &PlainValue,
    identity: &Identity,
    query_mode: Option<&QueryMode>,
) -> Result<String> {
    encode_as(value.kind(), value, identity, query_mode)
}

/// Encode `value` as `kind`. Fails with `InvalidValue` when the value is of a
/// different kind.
pub fn encode_as(
    kind: ValueKind,
    value: &PlainValue,
    identity: &Identity,
    query_mode: Option<&QueryMode>,
) -> Result<String> {
    let payload = (codec_for(kind).encode)(value, query_mode)?;
    tracing::trace!(%identity, %kind, query_mode = ?query_mode, "encoded envelope payload");
    Envelope::plaintext(payload, identity.clone(), query_mode.cloned()).to_json()
}

/// Build the payload string alone, without the surrounding envelope.
pub fn encode_payload(value: &PlainValue, query_mode: Option<&QueryMode>) -> Result<String> {
    (codec_for(value.kind()).encode)(value, query_mode)
}

/// Decode an already-parsed envelope as `kind`.
pub fn decode(envelope: &Value, kind: ValueKind) -> Result<PlainValue> {
    decode_with(envelope, kind, &DecodeOptions::default())
}

pub fn decode_with(envelope: &Value, kind: ValueKind, opts: &DecodeOptions) -> Result<PlainValue> {
    let envelope = Envelope::from_value(envelope)?;
    decode_envelope(&envelope, kind, opts)
}

/// Decode a typed envelope as `kind`.
pub fn decode_envelope(
    envelope: &Envelope,
    kind: ValueKind,
    opts: &DecodeOptions,
) -> Result<PlainValue> {
    (codec_for(kind).decode)(envelope, opts)
}

// ============================================================================
// Query helpers
// ============================================================================

/// Envelope for a query operand with no query mode.
pub fn serialize_query(value: &PlainValue, table: &str, column: &str) -> Result<String> {
    encode(value, table, column, None)
}

/// Envelope for a document containment operand (`ste_vec`).
pub fn jsonb_query(document: Value, table: &str, column: &str) -> Result<String> {
    encode(
        &PlainValue::Document(document),
        table,
        column,
        Some(&QueryMode::SteVec),
    )
}

/// Envelope for a path selector into a document column (`ejson_path`).
pub fn ejson_path_query(path: &str, table: &str, column: &str) -> Result<String> {
    encode(
        &PlainValue::Document(Value::String(path.to_string())),
        table,
        column,
        Some(&QueryMode::EjsonPath),
    )
}

// ============================================================================
// Per-kind rules
// ============================================================================

fn kind_mismatch(expected: ValueKind, value: &PlainValue) -> EnvelopeError {
    EnvelopeError::InvalidValue(format!(
        "expected {expected} value, got {}",
        value.kind()
    ))
}

fn invalid_payload(kind: ValueKind, payload: &str, reason: impl ToString) -> EnvelopeError {
    EnvelopeError::InvalidPayload {
        kind,
        payload: payload.to_string(),
        reason: reason.to_string(),
    }
}

/// The payload of a scalar kind, which must be a JSON string.
fn text_payload(envelope: &Envelope, kind: ValueKind) -> Result<&str> {
    envelope.p.as_str().ok_or_else(|| {
        EnvelopeError::MalformedEnvelope(format!(
            "{kind} payload must be a string, got {}",
            envelope.p
        ))
    })
}

fn encode_integer(value: &PlainValue, _: Option<&QueryMode>) -> Result<String> {
    match value {
        PlainValue::Integer(n) => Ok(n.to_string()),
        other => Err(kind_mismatch(ValueKind::Integer, other)),
    }
}

fn decode_integer(envelope: &Envelope, _: &DecodeOptions) -> Result<PlainValue> {
    let payload = text_payload(envelope, ValueKind::Integer)?;
    payload
        .trim()
        .parse::<i64>()
        .map(PlainValue::Integer)
        .map_err(|e| invalid_payload(ValueKind::Integer, payload, e))
}

fn encode_boolean(value: &PlainValue, _: Option<&QueryMode>) -> Result<String> {
    match value {
        PlainValue::Boolean(b) => Ok(if *b { "true" } else { "false" }.to_string()),
        other => Err(kind_mismatch(ValueKind::Boolean, other)),
    }
}

// Legacy writers stored `True`/`False`; any ASCII case is accepted and
// anything that is not `true` reads as false.
fn decode_boolean(envelope: &Envelope, _: &DecodeOptions) -> Result<PlainValue> {
    let payload = text_payload(envelope, ValueKind::Boolean)?;
    Ok(PlainValue::Boolean(payload.trim().eq_ignore_ascii_case("true")))
}

fn encode_date(value: &PlainValue, _: Option<&QueryMode>) -> Result<String> {
    match value {
        PlainValue::Date(d) => Ok(d.format("%Y-%m-%d").to_string()),
        other => Err(kind_mismatch(ValueKind::Date, other)),
    }
}

fn decode_date(envelope: &Envelope, _: &DecodeOptions) -> Result<PlainValue> {
    let payload = text_payload(envelope, ValueKind::Date)?;
    parse_date(payload.trim())
        .map(PlainValue::Date)
        .map_err(|e| invalid_payload(ValueKind::Date, payload, e))
}

/// Parse an ISO-8601 date, or a date-time whose time of day is dropped.
fn parse_date(s: &str) -> std::result::Result<NaiveDate, chrono::ParseError> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(datetime) = s.parse::<NaiveDateTime>() {
        return Ok(datetime.date());
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(datetime.date());
    }
    DateTime::parse_from_rfc3339(s).map(|datetime| datetime.date_naive())
}

fn encode_float(value: &PlainValue, _: Option<&QueryMode>) -> Result<String> {
    match value {
        PlainValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(|n| n.to_string())
            .ok_or_else(|| {
                EnvelopeError::InvalidValue(format!("float {f} has no decimal representation"))
            }),
        other => Err(kind_mismatch(ValueKind::Float, other)),
    }
}

fn decode_float(envelope: &Envelope, _: &DecodeOptions) -> Result<PlainValue> {
    let payload = text_payload(envelope, ValueKind::Float)?;
    payload
        .trim()
        .parse::<f64>()
        .map(PlainValue::Float)
        .map_err(|e| invalid_payload(ValueKind::Float, payload, e))
}

fn encode_text(value: &PlainValue, _: Option<&QueryMode>) -> Result<String> {
    match value {
        PlainValue::Text(s) => Ok(s.clone()),
        other => Err(kind_mismatch(ValueKind::Text, other)),
    }
}

fn decode_text(envelope: &Envelope, _: &DecodeOptions) -> Result<PlainValue> {
    text_payload(envelope, ValueKind::Text).map(|s| PlainValue::Text(s.to_string()))
}

fn encode_document(value: &PlainValue, query_mode: Option<&QueryMode>) -> Result<String> {
    let document = match value {
        PlainValue::Document(document) => document,
        other => return Err(kind_mismatch(ValueKind::Document, other)),
    };
    match query_mode {
        Some(mode) if mode.is_path_query() => match document {
            Value::String(path) => Ok(path.clone()),
            other => Err(EnvelopeError::InvalidValue(format!(
                "{mode} query expects a path expression string, got {other}"
            ))),
        },
        _ => to_spaced_string(document),
    }
}

fn decode_document(envelope: &Envelope, opts: &DecodeOptions) -> Result<PlainValue> {
    let raw = match &envelope.p {
        Value::String(raw) => raw,
        structural => return Ok(PlainValue::Document(structural.clone())),
    };
    // A path expression is never JSON-encoded, so it must not be parsed back.
    if envelope.q.as_ref().is_some_and(QueryMode::is_path_query) {
        return Ok(PlainValue::Document(Value::String(raw.clone())));
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(document) => Ok(PlainValue::Document(document)),
        Err(e) if opts.strict_documents => Err(EnvelopeError::UnparsablePayload(e.to_string())),
        Err(e) => {
            tracing::warn!(
                identity = %envelope.i,
                error = %e,
                "document payload is not JSON; returning the raw string"
            );
            Ok(PlainValue::Document(Value::String(raw.clone())))
        }
    }
}
