//! Purpose: Tolerant extraction of typed fields from loosely-typed JSON property bags.
//! Exports: `PropertyBag`, `parse_property_bag`, `extract_*`, `scalar_text`.
//! Role: Isolates callers from dynamically-typed decoded JSON (custom-metric results).
//! Invariants: A missing key is never an error; strict extractors fail with `TypeMismatch`.
//! Invariants: `extract_string` never fails; conversion is explicit per JSON variant.
#![allow(clippy::result_large_err)]

use super::parse;
use crate::core::error::{Error, ErrorKind};
use serde_json::{Map, Value};

/// A decoded JSON object prior to conversion into typed domain values.
pub type PropertyBag = Map<String, Value>;

pub fn parse_property_bag(text: &str) -> Result<PropertyBag, Error> {
    let value: Value =
        parse::from_str(text).map_err(|err| parse::decode_error(err, "property bag"))?;
    match value {
        Value::Object(bag) => Ok(bag),
        other => Err(Error::new(ErrorKind::TypeMismatch).with_message(format!(
            "property bag must be a json object, found {}",
            json_type_name(&other)
        ))),
    }
}

/// Returns `default` when `key` is absent; fails unless the stored value is a JSON boolean.
pub fn extract_boolean(bag: &PropertyBag, key: &str, default: bool) -> Result<bool, Error> {
    match bag.get(key) {
        None => Ok(default),
        Some(Value::Bool(value)) => Ok(*value),
        Some(other) => Err(type_mismatch(key, "boolean", other)),
    }
}

/// Returns `None` when `key` is absent or null, otherwise the value's textual form.
pub fn extract_string(bag: &PropertyBag, key: &str) -> Option<String> {
    bag.get(key).and_then(scalar_text)
}

/// Like [`extract_boolean`], for integers; floats and out-of-range integers are rejected.
pub fn extract_integer(bag: &PropertyBag, key: &str, default: i64) -> Result<i64, Error> {
    match bag.get(key) {
        None => Ok(default),
        Some(value @ Value::Number(number)) => number
            .as_i64()
            .ok_or_else(|| type_mismatch(key, "integer", value)),
        Some(other) => Err(type_mismatch(key, "integer", other)),
    }
}

pub fn extract_number(bag: &PropertyBag, key: &str, default: f64) -> Result<f64, Error> {
    match bag.get(key) {
        None => Ok(default),
        Some(value @ Value::Number(number)) => number
            .as_f64()
            .ok_or_else(|| type_mismatch(key, "number", value)),
        Some(other) => Err(type_mismatch(key, "number", other)),
    }
}

/// Text form of a decoded value; `None` only for null.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::Bool(false) => Some("false".to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) => Some(text.clone()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(number) if number.is_f64() => "float",
        Value::Number(number) if number.as_i64().is_none() => "out-of-range integer",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn type_mismatch(key: &str, expected: &str, found: &Value) -> Error {
    Error::new(ErrorKind::TypeMismatch)
        .with_message(format!(
            "expected {expected}, found {}",
            json_type_name(found)
        ))
        .with_key(key)
}
