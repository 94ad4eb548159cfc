//! Purpose: Provide the runtime JSON decode entrypoints and parse-failure diagnostics.
//! Exports: `from_str`, `ParseFailureCategory`, `categorize_error`, `hint_for_error`, `decode_error`.
//! Role: Parser boundary so response bodies and CLI input decode through one path.
//! Invariants: Category labels are stable; hints never echo payload content.
//! Notes: Error mapping keeps the caller's context string for diagnostics.
#![allow(clippy::result_large_err)]

use super::convert::MALFORMED_ENCODING;
use crate::core::error::{Error, ErrorKind};
use serde::de::DeserializeOwned;
use serde_json::error::Category;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseFailureCategory {
    Syntax,
    Data,
    Eof,
    Io,
}

impl ParseFailureCategory {
    pub fn label(self) -> &'static str {
        match self {
            ParseFailureCategory::Syntax => "syntax",
            ParseFailureCategory::Data => "data",
            ParseFailureCategory::Eof => "eof",
            ParseFailureCategory::Io => "io",
        }
    }
}

pub fn from_str<T: DeserializeOwned>(input: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(input)
}

pub fn categorize_error(err: &serde_json::Error) -> ParseFailureCategory {
    match err.classify() {
        Category::Syntax => ParseFailureCategory::Syntax,
        Category::Data => ParseFailureCategory::Data,
        Category::Eof => ParseFailureCategory::Eof,
        Category::Io => ParseFailureCategory::Io,
    }
}

pub fn hint_for_error(err: &serde_json::Error, context: &str) -> String {
    format!(
        "parse category: {}; line {} column {}; context: {context}",
        categorize_error(err).label(),
        err.line(),
        err.column()
    )
}

/// Maps a parse failure to `Decode`, or `MalformedEncoding` when a point-list converter rejected it.
pub fn decode_error(err: serde_json::Error, context: &str) -> Error {
    let kind = match categorize_error(&err) {
        ParseFailureCategory::Data if err.to_string().starts_with(MALFORMED_ENCODING) => {
            ErrorKind::MalformedEncoding
        }
        _ => ErrorKind::Decode,
    };
    let hint = hint_for_error(&err, context);
    Error::new(kind)
        .with_message(format!("invalid json in {context}"))
        .with_hint(hint)
        .with_source(err)
}

#[cfg(test)]
mod tests {
    use super::{ParseFailureCategory, categorize_error, decode_error, from_str};
    use crate::core::error::ErrorKind;
    use serde_json::Value;

    #[test]
    fn truncated_input_is_eof() {
        let err = from_str::<Value>(r#"{"a":"#).expect_err("eof");
        assert_eq!(categorize_error(&err), ParseFailureCategory::Eof);
        assert_eq!(decode_error(err, "test").kind(), ErrorKind::Decode);
    }

    #[test]
    fn shape_mismatch_is_data() {
        let err = from_str::<Vec<i64>>(r#"{"a":1}"#).expect_err("data");
        assert_eq!(categorize_error(&err), ParseFailureCategory::Data);
        assert_eq!(decode_error(err, "test").kind(), ErrorKind::Decode);
    }
}
