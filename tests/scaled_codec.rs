//! Purpose: Lock the scaled-integer wire contract for coordinates and point lists.
//! Exports: Integration tests only.
//! Role: Exercise the public codec and serde converters exactly as SDK callers do.
//! Invariants: Literal wire payloads are compared as text, not just as values.
//! Invariants: Float comparisons use a 1e-10 tolerance.

use oncoapi::api::{
    ContourSlice, ErrorKind, Point3D, decode_points, decode_scalar, encode_points, encode_scalar,
};
use serde_json::{Value, json};

const EPSILON: f64 = 1e-10;

fn sample_points() -> Vec<Point3D> {
    vec![
        Point3D::new(12.345, 23.456, 34.567),
        Point3D::new(54.321, 65.432, 76.543),
    ]
}

fn assert_point_close(actual: Point3D, expected: Point3D) {
    assert!(
        (actual.x - expected.x).abs() < EPSILON
            && (actual.y - expected.y).abs() < EPSILON
            && (actual.z - expected.z).abs() < EPSILON,
        "point mismatch: {actual} != {expected}"
    );
}

#[test]
fn scalar_literal_case() {
    assert_eq!(encode_scalar(12.345), 12345);
    assert!((decode_scalar(12345) - 12.345).abs() < EPSILON);
}

#[test]
fn scalar_round_trip_for_three_decimal_values() {
    let mut cases = vec![0.0, 0.001, -0.001, 999.999, -123_456.789, 999_999_999.999];
    // Walk a spread of millimeter values with exactly three decimals.
    let mut wire = -987_654_321_i64;
    while wire < 987_654_321 {
        cases.push(wire as f64 / 1000.0);
        wire += 7_654_321;
    }
    for value in cases {
        let decoded = decode_scalar(encode_scalar(value));
        assert!(
            (decoded - value).abs() < EPSILON,
            "round trip drifted for {value}: {decoded}"
        );
    }
}

#[test]
fn point_list_literal_encodes_bit_exact() {
    let wire = encode_points(&sample_points());
    let text = serde_json::to_string(&wire).expect("serialize");
    assert_eq!(text, "[[12345,23456,34567],[54321,65432,76543]]");
}

#[test]
fn point_list_literal_decodes_back() {
    let wire: Value =
        serde_json::from_str("[[12345,23456,34567],[54321,65432,76543]]").expect("parse");
    let points = decode_points(wire.as_array().expect("array")).expect("decode");
    assert_eq!(points.len(), 2);
    for (actual, expected) in points.into_iter().zip(sample_points()) {
        assert_point_close(actual, expected);
    }
}

#[test]
fn non_three_element_points_are_malformed() {
    let cases = [
        json!([[]]),
        json!([[1]]),
        json!([[1, 2]]),
        json!([[1, 2, 3, 4]]),
        json!([[1, 2, 3], [4, 5, 6, 7, 8]]),
    ];
    for wire in cases {
        let err = decode_points(wire.as_array().expect("array")).expect_err("malformed");
        assert_eq!(err.kind(), ErrorKind::MalformedEncoding, "input: {wire}");
    }
}

#[test]
fn non_integer_coordinates_are_malformed() {
    let cases = [
        json!([[1, 2, "3"]]),
        json!([[1, null, 3]]),
        json!([[1.0, 2, 3]]),
        json!([[true, 2, 3]]),
        json!([7]),
    ];
    for wire in cases {
        let err = decode_points(wire.as_array().expect("array")).expect_err("malformed");
        assert_eq!(err.kind(), ErrorKind::MalformedEncoding, "input: {wire}");
        assert_eq!(err.index(), Some(0));
    }
}

#[test]
fn decode_then_encode_is_identity_on_canonical_wire() {
    let wire = json!([[0, -1, 1], [12345, 23456, 34567], [-987654321, 42, 1000]]);
    let points = decode_points(wire.as_array().expect("array")).expect("decode");
    let again = serde_json::to_value(encode_points(&points)).expect("serialize");
    assert_eq!(again, wire);
}

#[test]
fn converter_rejects_malformed_point_list_in_dto() {
    let err = serde_json::from_str::<ContourSlice>(
        r#"{"structureId":"BODY","points":[[1,2,3],[4,5]]}"#,
    )
    .expect_err("malformed");
    let mapped = oncoapi::json::parse::decode_error(err, "contour");
    assert_eq!(mapped.kind(), ErrorKind::MalformedEncoding);
}

#[test]
fn converter_round_trips_contour_slice() {
    let slice = ContourSlice {
        structure_id: "PTV".to_string(),
        z_mm: Some(34.567),
        points: sample_points(),
    };
    let text = serde_json::to_string(&slice).expect("serialize");
    assert_eq!(
        text,
        r#"{"structureId":"PTV","z":34567,"points":[[12345,23456,34567],[54321,65432,76543]]}"#
    );
    let back: ContourSlice = serde_json::from_str(&text).expect("deserialize");
    assert_eq!(back.structure_id, "PTV");
    assert!((back.z_mm.expect("z") - 34.567).abs() < EPSILON);
    for (actual, expected) in back.points.into_iter().zip(sample_points()) {
        assert_point_close(actual, expected);
    }
}
