//! Purpose: Wire DTOs whose coordinate fields use the scaled-integer encoding.
//! Exports: `CouchPosition`, `ContourSlice`, `MetricQuery`.
//! Role: Typed request/response shapes shared by the client, the CLI, and callers.
//! Invariants: Field names match the remote API's camelCase JSON.
//! Invariants: Millimeter fields serialize through `json::convert`, never as floats.

use crate::core::point::Point3D;
use crate::json::convert;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Treatment couch position in the IEC frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CouchPosition {
    #[serde(rename = "vertical", with = "convert::coordinate")]
    pub vertical_mm: f64,
    #[serde(rename = "longitudinal", with = "convert::coordinate")]
    pub longitudinal_mm: f64,
    #[serde(rename = "lateral", with = "convert::coordinate")]
    pub lateral_mm: f64,
    /// Plain decimal degrees; rotation is not scaled on the wire.
    #[serde(rename = "rotation", default, skip_serializing_if = "Option::is_none")]
    pub rotation_deg: Option<f64>,
}

/// One planar contour of a structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContourSlice {
    #[serde(rename = "structureId")]
    pub structure_id: String,
    #[serde(
        rename = "z",
        with = "convert::optional_coordinate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub z_mm: Option<f64>,
    #[serde(with = "convert::points", default)]
    pub points: Vec<Point3D>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricQuery {
    pub metric: String,
    #[serde(rename = "patientId", default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
}

impl MetricQuery {
    pub fn new(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            ..Self::default()
        }
    }

    pub fn with_patient(mut self, patient_id: impl Into<String>) -> Self {
        self.patient_id = Some(patient_id.into());
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{ContourSlice, CouchPosition, MetricQuery};
    use crate::core::point::Point3D;
    use serde_json::json;

    #[test]
    fn couch_position_uses_scaled_integers() {
        let couch = CouchPosition {
            vertical_mm: -12.5,
            longitudinal_mm: 1034.2,
            lateral_mm: 0.0,
            rotation_deg: None,
        };
        let value = serde_json::to_value(&couch).expect("serialize");
        assert_eq!(
            value,
            json!({"vertical": -12500, "longitudinal": 1034200, "lateral": 0})
        );
    }

    #[test]
    fn contour_slice_decodes_wire_points() {
        let slice: ContourSlice = serde_json::from_value(json!({
            "structureId": "PTV",
            "z": -2500,
            "points": [[1000, 2000, -2500], [1500, 2000, -2500]]
        }))
        .expect("deserialize");
        assert_eq!(slice.structure_id, "PTV");
        assert_eq!(slice.z_mm, Some(-2.5));
        assert_eq!(
            slice.points,
            vec![Point3D::new(1.0, 2.0, -2.5), Point3D::new(1.5, 2.0, -2.5)]
        );
    }

    #[test]
    fn metric_query_omits_empty_fields() {
        let query = MetricQuery::new("MeanDose");
        assert_eq!(
            serde_json::to_value(&query).expect("serialize"),
            json!({"metric": "MeanDose"})
        );

        let query = MetricQuery::new("MeanDose")
            .with_patient("P-001")
            .with_parameter("structure", "PTV");
        assert_eq!(
            serde_json::to_value(&query).expect("serialize"),
            json!({"metric": "MeanDose", "patientId": "P-001", "parameters": {"structure": "PTV"}})
        );
    }
}
