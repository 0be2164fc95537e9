//! Health check endpoint for service monitoring.

use crate::{error::AppError, server::AppState};
use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Health check response.
///
/// Returns service status and key store readability.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Overall service status
    pub status: String,

    /// Key store status
    pub store: String,

    /// Number of stored key records
    pub key_count: usize,

    /// Current server timestamp
    pub timestamp: DateTime<Utc>,
}

/// Health check handler.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "status": "healthy",
///   "store": "readable",
///   "keyCount": 12,
///   "timestamp": "2025-12-21T19:00:00Z"
/// }
/// ```
///
/// # Response (500 Internal Server Error)
///
/// If the store cannot be read (only possible with fail-open disabled),
/// returns the standard error response.
pub async fn health_check(State(service): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    let key_count = service.key_count().await?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        store: "readable".to_string(),
        key_count,
        timestamp: Utc::now(),
    }))
}
