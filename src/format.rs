//! Document text rendering.
//!
//! Document payloads are written with a space after every `,` and `:`
//! (`{"a": 1, "b": [1, 2]}`), the form stored payloads and existing fixtures
//! use. Key order follows the document, and every non-ASCII character is
//! written as a `\uXXXX` escape (a surrogate pair above U+FFFF).

use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::Value;

use crate::error::{EnvelopeError, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(fragment[start..idx].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = idx + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Render a JSON value as spaced document text.
pub fn to_spaced_string(value: &Value) -> Result<String> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    value.serialize(&mut ser)?;
    String::from_utf8(buf).map_err(|e| EnvelopeError::InvalidValue(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn spaces_object_separators() {
        assert_eq!(to_spaced_string(&json!({"a": 1})).unwrap(), r#"{"a": 1}"#);
        assert_eq!(
            to_spaced_string(&json!({"a": 1, "b": "x"})).unwrap(),
            r#"{"a": 1, "b": "x"}"#
        );
    }

    #[test]
    fn spaces_nested_arrays_and_objects() {
        assert_eq!(
            to_spaced_string(&json!({"top": {"list": [1, 2, {"k": null}]}})).unwrap(),
            r#"{"top": {"list": [1, 2, {"k": null}]}}"#
        );
    }

    #[test]
    fn preserves_key_order() {
        assert_eq!(
            to_spaced_string(&json!({"z": 1, "a": 2})).unwrap(),
            r#"{"z": 1, "a": 2}"#
        );
    }

    #[test]
    fn escapes_non_ascii_characters() {
        assert_eq!(
            to_spaced_string(&json!({"name": "café"})).unwrap(),
            r#"{"name": "caf\u00e9"}"#
        );
        assert_eq!(
            to_spaced_string(&json!({"ünï": "a\"b"})).unwrap(),
            r#"{"\u00fcn\u00ef": "a\"b"}"#
        );
    }

    #[test]
    fn escapes_astral_characters_as_surrogate_pairs() {
        assert_eq!(
            to_spaced_string(&json!(["ok 🙂"])).unwrap(),
            r#"["ok \ud83d\ude42"]"#
        );
    }

    #[test]
    fn escaped_text_parses_back_to_the_same_document() {
        let doc = json!({"name": "café", "tags": ["日本", "🙂"]});
        let text = to_spaced_string(&doc).unwrap();
        assert!(text.is_ascii());
        assert_eq!(serde_json::from_str::<Value>(&text).unwrap(), doc);
    }

    #[test]
    fn empty_containers_and_scalars() {
        assert_eq!(to_spaced_string(&json!({})).unwrap(), "{}");
        assert_eq!(to_spaced_string(&json!([])).unwrap(), "[]");
        assert_eq!(to_spaced_string(&json!("s")).unwrap(), r#""s""#);
        assert_eq!(to_spaced_string(&json!(1.5)).unwrap(), "1.5");
    }
}
