//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, admin credential header)
//! 2. Calls the key service
//! 3. Returns HTTP response (JSON, status code)

/// Service health endpoint
pub mod health;
/// License key endpoints
pub mod keys;
