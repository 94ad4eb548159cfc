//! Purpose: Define the stable public Rust API boundary for the SDK.
//! Exports: Error model, point type, codec, converters, extractors, DTOs, and the client.
//! Role: Public, additive-only surface; callers should not need `core` or `json` paths.
//! Invariants: Everything re-exported here is pure except `RemoteClient`.

mod dto;
mod remote;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::point::Point3D;
pub use crate::core::scaled::{
    SCALE, decode_point, decode_points, decode_scalar, encode_point, encode_points, encode_scalar,
};
pub use crate::json::convert;
pub use crate::json::props::{
    PropertyBag, extract_boolean, extract_integer, extract_number, extract_string,
    parse_property_bag, scalar_text,
};
pub use dto::{ContourSlice, CouchPosition, MetricQuery};
pub use remote::RemoteClient;
