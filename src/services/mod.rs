//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They own the key store handle and enforce the key lifecycle rules.

pub mod key_service;
