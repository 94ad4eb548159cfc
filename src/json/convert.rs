//! Purpose: serde converters for scaled-integer coordinates and point lists.
//! Exports: `coordinate`, `optional_coordinate`, `points` (for `#[serde(with = "...")]`).
//! Role: Hooks the pure codec in `core::scaled` into derive-based (de)serialization.
//! Invariants: Serialized output is bit-exact with the wire format (integers only).
//! Invariants: Rejected wire values surface as serde errors prefixed with `MALFORMED_ENCODING`.

use crate::core::error::Error;
use serde::de;
use serde_json::Value;

/// Prefix of every converter error message; `json::parse::decode_error` keys on it.
pub const MALFORMED_ENCODING: &str = "malformed scaled encoding";

fn malformed<E: de::Error>(err: &Error) -> E {
    let detail = err.message().unwrap_or("unexpected value");
    match err.index() {
        Some(index) => E::custom(format_args!(
            "{MALFORMED_ENCODING}: {detail} (element {index})"
        )),
        None => E::custom(format_args!("{MALFORMED_ENCODING}: {detail}")),
    }
}

fn wire_integer<E: de::Error>(value: &Value) -> Result<i64, E> {
    value.as_i64().ok_or_else(|| {
        E::custom(format_args!(
            "{MALFORMED_ENCODING}: coordinate must be an integer, found {value}"
        ))
    })
}

/// `f64` millimeters ↔ JSON integer.
pub mod coordinate {
    use super::wire_integer;
    use crate::core::scaled::{decode_scalar, encode_scalar};
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(encode_scalar(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        wire_integer(&value).map(decode_scalar)
    }
}

/// `Option<f64>` millimeters ↔ JSON integer or null. Pair with `#[serde(default)]`.
pub mod optional_coordinate {
    use super::wire_integer;
    use crate::core::scaled::{decode_scalar, encode_scalar};
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_some(&encode_scalar(*value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        match Option::<Value>::deserialize(deserializer)? {
            Some(value) => wire_integer(&value).map(|wire| Some(decode_scalar(wire))),
            None => Ok(None),
        }
    }
}

/// `Vec<Point3D>` ↔ JSON array of `[x, y, z]` integer triples.
pub mod points {
    use super::malformed;
    use crate::core::point::Point3D;
    use crate::core::scaled::{decode_points, encode_points};
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(points: &[Point3D], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(encode_points(points))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Point3D>, D::Error> {
        let wire = Vec::<Value>::deserialize(deserializer)?;
        decode_points(&wire).map_err(|err| malformed(&err))
    }
}
