//! Purpose: Client SDK for an oncology-informatics web API.
//! Exports: `api` (public surface), `core` (error, point, scaled codec), `json` (parse, converters, extractors).
//! Role: Library backing the `oncoapi` binary and downstream callers.
//! Invariants: Codec and extractor functions are pure and stateless.
//! Invariants: Coordinates cross the wire only as integers equal to millimeters × 1000.
pub mod api;
pub mod core;
pub mod json;
