//! Purpose: JSON boundary: parsing, scaled-coordinate converters, and property extraction.
//! Exports: `parse`, `convert`, and `props` modules.
//! Role: Everything that touches JSON text or `serde_json::Value` goes through here.
//! Invariants: Helper APIs stay small and deterministic (no hidden global state).

pub mod convert;
pub mod parse;
pub mod props;
