//! Purpose: Convert millimeter values to and from the scaled-integer wire form.
//! Exports: `SCALE`, scalar and point encode/decode functions.
//! Role: Pure codec used by the serde converters in `json::convert`.
//! Invariants: Wire integer == round(value_mm * 1000); decode is exact division.
//! Invariants: A wire point is a JSON array of exactly three integers `[x, y, z]`.
//! Notes: More than three decimals are dropped silently; that is the wire contract.
#![allow(clippy::result_large_err)]

use super::error::{Error, ErrorKind};
use super::point::Point3D;
use crate::json::props::json_type_name;
use serde_json::Value;

/// Wire integers per millimeter.
pub const SCALE: f64 = 1000.0;

pub fn decode_scalar(wire: i64) -> f64 {
    wire as f64 / SCALE
}

/// Rounds half away from zero. Non-finite input saturates (NaN encodes as 0).
pub fn encode_scalar(value: f64) -> i64 {
    (value * SCALE).round() as i64
}

pub fn encode_point(point: Point3D) -> [i64; 3] {
    [
        encode_scalar(point.x),
        encode_scalar(point.y),
        encode_scalar(point.z),
    ]
}

pub fn encode_points(points: &[Point3D]) -> Vec<[i64; 3]> {
    points.iter().copied().map(encode_point).collect()
}

pub fn decode_point(wire: &Value) -> Result<Point3D, Error> {
    let Some(items) = wire.as_array() else {
        return Err(Error::new(ErrorKind::MalformedEncoding)
            .with_message(format!("point must be an array, found {}", json_type_name(wire))));
    };
    if items.len() != 3 {
        return Err(Error::new(ErrorKind::MalformedEncoding).with_message(format!(
            "point must have exactly 3 coordinates, found {}",
            items.len()
        )));
    }
    let mut coords = [0.0; 3];
    for (slot, item) in coords.iter_mut().zip(items) {
        let wire = item.as_i64().ok_or_else(|| {
            Error::new(ErrorKind::MalformedEncoding).with_message(format!(
                "point coordinate must be an integer, found {}",
                json_type_name(item)
            ))
        })?;
        *slot = decode_scalar(wire);
    }
    Ok(Point3D::from(coords))
}

/// Decodes a wire point list, failing on the first element that is not a 3-integer tuple.
pub fn decode_points(wire: &[Value]) -> Result<Vec<Point3D>, Error> {
    wire.iter()
        .enumerate()
        .map(|(index, item)| decode_point(item).map_err(|err| err.with_index(index)))
        .collect()
}
