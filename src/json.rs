//! `serde_json` adapter.
//!
//! Translates raw `serde_json` failures into one of four classifications,
//! moving the useful detail (byte offset, field, expected and actual type)
//! into the explanation and keeping the raw error as cause.
//!
//! | Raw error                   | Definition     | Explanation |
//! |-----------------------------|----------------|-------------|
//! | syntax                      | [`INVALID`]    | `check byte at index=N` |
//! | premature end of input      | [`INVALID`]    | `unexpected end of JSON` |
//! | type / value mismatch       | [`DECODING`]   | `check byte at index=N field='f' type expected='e' got='g'` |
//! | serialization failure       | [`ENCODING`]   | `unsupported type='T'` |
//! | I/O                         | [`UNEXPECTED`] | `unexpected json error` |
//!
//! ```rust
//! use oops::json;
//!
//! let err = json::decode::<Vec<u32>>(br#"[1, "two"]"#).unwrap_err();
//! assert!(err.is(&json::DECODING));
//! assert!(err.explanation().starts_with("check byte at index="));
//! ```

use crate::definition::Definition;
use crate::instance::Instance;
use crate::taxonomy::{Blame, Namespace, Reason};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::error::Category;
use std::sync::LazyLock;

/// Malformed JSON text.
pub static INVALID: LazyLock<Definition> = LazyLock::new(|| {
    Definition::classified(Blame::CLIENT, Namespace::RUNTIME, Reason::RESOURCE_DECODING)
        .with_help("invalid json syntax, please use a validator to check the json syntax")
});

/// Well-formed JSON that does not fit the target type.
pub static DECODING: LazyLock<Definition> = LazyLock::new(|| {
    Definition::classified(Blame::CLIENT, Namespace::RUNTIME, Reason::RESOURCE_DECODING)
        .with_help("failed to decode json, please ensure you're using the right types")
});

/// A value that cannot be represented as JSON.
pub static ENCODING: LazyLock<Definition> = LazyLock::new(|| {
    Definition::classified(Blame::CLIENT, Namespace::RUNTIME, Reason::RESOURCE_ENCODING)
        .with_help("failed to encode json, please ensure you're using the right types")
});

/// Anything else, typically I/O from a reader or writer.
pub static UNEXPECTED: LazyLock<Definition> = LazyLock::new(|| {
    Definition::classified(Blame::DEVELOPER, Namespace::RUNTIME, Reason::UNEXPECTED)
});

/// Classify a decoding failure. `input` is the text that was being parsed,
/// used to turn line and column into a byte offset.
pub fn classify(err: serde_json::Error, input: &[u8]) -> Instance {
    match err.classify() {
        Category::Syntax => {
            let offset = byte_offset(input, err.line(), err.column());
            INVALID.wrapf(err, format_args!("check byte at index={}", offset))
        }
        Category::Eof => INVALID.wrap(err, "unexpected end of JSON"),
        Category::Data => {
            let offset = byte_offset(input, err.line(), err.column());
            let message = err.to_string();
            let mismatch = Mismatch::parse(strip_position(&message));
            DECODING.wrapf(
                err,
                format_args!(
                    "check byte at index={} field='{}' type expected='{}' got='{}'",
                    offset, mismatch.field, mismatch.expected, mismatch.got
                ),
            )
        }
        Category::Io => UNEXPECTED.wrap(err, "unexpected json error"),
    }
}

/// Classify an encoding failure of a `T` value.
pub fn classify_encode<T: ?Sized>(err: serde_json::Error) -> Instance {
    match err.classify() {
        Category::Io => UNEXPECTED.wrap(err, "unexpected json error"),
        _ => ENCODING.wrapf(
            err,
            format_args!("unsupported type='{}'", std::any::type_name::<T>()),
        ),
    }
}

/// Classify the error of a decoding result, passing `Ok` through.
pub fn lift<T>(result: Result<T, serde_json::Error>, input: &[u8]) -> crate::Result<T> {
    result.map_err(|err| classify(err, input))
}

/// Decode `input` into `T`.
pub fn decode<T: DeserializeOwned>(input: &[u8]) -> crate::Result<T> {
    lift(serde_json::from_slice(input), input)
}

/// Encode `value` as JSON text.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> crate::Result<String> {
    serde_json::to_string(value).map_err(classify_encode::<T>)
}

/// Byte offset of a 1-based line and column, clamped to the input.
fn byte_offset(input: &[u8], line: usize, column: usize) -> usize {
    let line_start = if line <= 1 {
        0
    } else {
        input
            .iter()
            .enumerate()
            .filter(|(_, b)| **b == b'\n')
            .nth(line - 2)
            .map_or(input.len(), |(idx, _)| idx + 1)
    };
    (line_start + column.saturating_sub(1)).min(input.len())
}

/// Drop the ` at line N column M` suffix serde_json appends.
fn strip_position(message: &str) -> &str {
    match message.rfind(" at line ") {
        Some(idx) => &message[..idx],
        None => message,
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Mismatch<'a> {
    field: &'a str,
    expected: &'a str,
    got: &'a str,
}

impl<'a> Mismatch<'a> {
    /// Pick apart serde's data error messages:
    /// `invalid type: X, expected Y`, `invalid value: X, expected Y`,
    /// `invalid length N, expected Y`, `missing field `f``, `unknown field `f`, ...`.
    fn parse(message: &'a str) -> Self {
        for prefix in ["invalid type: ", "invalid value: ", "invalid length "] {
            if let Some(rest) = message.strip_prefix(prefix) {
                if let Some((got, expected)) = rest.split_once(", expected ") {
                    return Self {
                        field: "",
                        expected,
                        got,
                    };
                }
            }
        }

        for prefix in ["missing field `", "unknown field `", "duplicate field `"] {
            if let Some(rest) = message.strip_prefix(prefix) {
                let field = rest.split_once('`').map_or(rest, |(field, _)| field);
                return Self {
                    field,
                    ..Self::default()
                };
            }
        }

        Self {
            got: message,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Order {
        id: u64,
        note: String,
    }

    #[test]
    fn syntax_errors_cite_offset() {
        let input = b"{x";
        let err = decode::<serde_json::Value>(input).unwrap_err();
        assert!(err.is(&INVALID));
        assert_eq!(err.explanation(), "check byte at index=1");
        assert!(err.find_cause::<serde_json::Error>().is_some());
    }

    #[test]
    fn offsets_span_lines() {
        assert_eq!(byte_offset(b"ab\ncd\nef", 1, 2), 1);
        assert_eq!(byte_offset(b"ab\ncd\nef", 2, 1), 3);
        assert_eq!(byte_offset(b"ab\ncd\nef", 3, 2), 7);
        assert_eq!(byte_offset(b"ab", 9, 9), 2);
        assert_eq!(byte_offset(b"", 0, 0), 0);
    }

    #[test]
    fn truncated_input_is_eof() {
        let err = decode::<Vec<u32>>(b"[1, 2").unwrap_err();
        assert!(err.is(&INVALID));
        assert_eq!(err.explanation(), "unexpected end of JSON");
    }

    #[test]
    fn type_mismatch_is_decoding() {
        let err = decode::<u32>(br#""seven""#).unwrap_err();
        assert!(err.is(&DECODING));
        let explanation = err.explanation();
        assert!(explanation.starts_with("check byte at index="), "{explanation}");
        assert!(explanation.contains("field='' type expected='u32' got='string \"seven\"'"), "{explanation}");
    }

    #[test]
    fn missing_field_is_named() {
        let err = decode::<Order>(br#"{"id": 1}"#).unwrap_err();
        assert!(err.is(&DECODING));
        assert!(err.explanation().contains("field='note'"), "{}", err.explanation());
    }

    #[test]
    fn lift_passes_ok_through() {
        let ok: crate::Result<u8> = lift(Ok(3), b"3");
        assert_eq!(ok.unwrap(), 3);
    }

    #[test]
    fn encode_round() {
        let mut map = BTreeMap::new();
        map.insert("a", 1);
        assert_eq!(encode(&map).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn non_string_keys_fail_to_encode() {
        let mut map = BTreeMap::new();
        map.insert(vec![1u8], 1);
        let err = encode(&map).unwrap_err();
        assert!(err.is(&ENCODING));
        assert!(err.explanation().starts_with("unsupported type='alloc::collections::btree::map::BTreeMap"));
    }

    #[test]
    fn mismatch_parsing() {
        assert_eq!(
            Mismatch::parse("invalid type: integer `3`, expected a string"),
            Mismatch {
                field: "",
                expected: "a string",
                got: "integer `3`"
            }
        );
        assert_eq!(
            Mismatch::parse("unknown field `colour`, expected `color`"),
            Mismatch {
                field: "colour",
                ..Mismatch::default()
            }
        );
        assert_eq!(
            Mismatch::parse("something else"),
            Mismatch {
                got: "something else",
                ..Mismatch::default()
            }
        );
    }

    #[test]
    fn position_suffix_is_stripped() {
        assert_eq!(strip_position("missing field `a` at line 1 column 9"), "missing field `a`");
        assert_eq!(strip_position("no suffix"), "no suffix");
    }

    #[test]
    fn presets_share_reason_but_not_identity() {
        assert_eq!(INVALID.code(), DECODING.code());
        assert_ne!(*INVALID, *DECODING);
        assert_eq!(ENCODING.code(), "CLIENT.RUNTIME.RESOURCE_ENCODING");
        assert_eq!(UNEXPECTED.code(), "DEVELOPER.RUNTIME.UNEXPECTED");
    }
}
