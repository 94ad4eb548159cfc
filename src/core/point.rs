//! Purpose: Define the 3D point type exchanged with the remote API.
//! Exports: `Point3D`.
//! Role: Plain value type; the wire encoding lives in `core::scaled` and `json::convert`.
//! Invariants: Coordinates are millimeters in the couch IEC frame.
use std::fmt;

/// A position in the couch IEC coordinate frame, in millimeters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; 3]> for Point3D {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Point3D> for [f64; 3] {
    fn from(point: Point3D) -> Self {
        point.to_array()
    }
}

impl fmt::Display for Point3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
