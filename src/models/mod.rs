//! Data models for persisted key records and the HTTP bodies built from them.

/// License key record and request/response types
pub mod license_key;
/// Millisecond ISO-8601 timestamp encoding
pub mod timestamp;
