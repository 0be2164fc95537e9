//! License Key Server
//!
//! Issues, validates, lists and revokes license-style access keys for a client
//! application. Keys are opaque `LIC-XXXX-XXXX-XXXX` tokens kept in a single
//! JSON document on disk.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Storage**: one JSON document, rewritten atomically on every change
//! - **Authentication**: shared admin secret, compared in constant time
//! - **Format**: JSON requests/responses
//!
//! # Layers
//!
//! 1. `handlers` translate HTTP to service calls and back
//! 2. `services::key_service` enforces the key lifecycle rules
//! 3. `store` loads and saves the whole record set

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod server;
pub mod services;
pub mod store;

pub use server::{AppState, build_router, build_state, run};
