//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::store::StoreError;

/// Application-wide error type.
///
/// Every key lifecycle operation returns `Result<_, AppError>`; nothing is
/// thrown past the operation boundary.
///
/// # Error Categories
///
/// - **Authentication Errors**: wrong admin credential
/// - **Key Errors**: unknown, deactivated or expired key
/// - **Validation Errors**: malformed request data
/// - **Store Errors**: the persisted record set could not be read or written
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Admin credential is missing or does not match.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid admin credential")]
    InvalidCredential,

    /// No record carries the requested token.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Key not found")]
    KeyNotFound,

    /// The key was deactivated by an administrator.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("Key has been deactivated")]
    KeyDeactivated,

    /// The key's expiry time has passed.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("Key has expired")]
    KeyExpired,

    /// Request data is invalid (e.g. a non-numeric duration).
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Persistence read or write failed.
    ///
    /// Returns HTTP 500 and hides the cause from the client.
    #[error("Key store unavailable: {0}")]
    Store(#[from] StoreError),
}

impl AppError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidCredential => "invalid_credential",
            AppError::KeyNotFound => "key_not_found",
            AppError::KeyDeactivated => "key_deactivated",
            AppError::KeyExpired => "key_expired",
            AppError::InvalidArgument(_) => "invalid_argument",
            AppError::Store(_) => "internal_error",
        }
    }

    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredential => StatusCode::UNAUTHORIZED,
            AppError::KeyNotFound => StatusCode::NOT_FOUND,
            AppError::KeyDeactivated | AppError::KeyExpired => StatusCode::FORBIDDEN,
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Store failures are not described.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Store(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }

    /// Short reason reported by the validate endpoint, if this is a validation outcome.
    pub fn validation_reason(&self) -> Option<&'static str> {
        match self {
            AppError::KeyNotFound => Some("not_found"),
            AppError::KeyDeactivated => Some("deactivated"),
            AppError::KeyExpired => Some("expired"),
            _ => None,
        }
    }
}

/// Malformed or missing JSON bodies are reported as `InvalidArgument` so they
/// share the standard error shape instead of axum's plain-text rejection.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidArgument(rejection.body_text())
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `InvalidCredential` → 401 Unauthorized
/// - `KeyNotFound` → 404 Not Found
/// - `KeyDeactivated`, `KeyExpired` → 403 Forbidden
/// - `InvalidArgument` → 400 Bad Request
/// - `Store` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Store(ref err) = self {
            tracing::error!("Key store failure: {}", err);
        }

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.public_message()
            }
        }));

        (self.status(), body).into_response()
    }
}

/// Failure of the validate endpoint.
///
/// Same as [`AppError`] but the body also carries `valid: false` and a short
/// `reason` so client applications can branch without parsing error codes.
/// Failures that are not key outcomes use the error code as the reason:
///
/// ```json
/// {
///   "valid": false,
///   "reason": "expired",
///   "error": { "code": "key_expired", "message": "Key has expired" }
/// }
/// ```
#[derive(Debug)]
pub struct ValidationRejection(pub AppError);

impl From<AppError> for ValidationRejection {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ValidationRejection {
    fn into_response(self) -> Response {
        let err = self.0;
        if let AppError::Store(ref cause) = err {
            tracing::error!("Key store failure: {}", cause);
        }
        let reason = err.validation_reason().unwrap_or(err.code());

        let body = Json(json!({
            "valid": false,
            "reason": reason,
            "error": {
                "code": err.code(),
                "message": err.public_message()
            }
        }));

        (err.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(AppError::InvalidCredential.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::KeyNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::KeyDeactivated.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::KeyExpired.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::InvalidArgument("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        let io = std::io::Error::other("disk gone");
        assert_eq!(
            AppError::from(StoreError::Io(io)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn store_errors_hide_details() {
        let io = std::io::Error::other("/secret/path unreadable");
        let err = AppError::from(StoreError::Io(io));
        assert_eq!(err.public_message(), "An internal error occurred");
        assert!(err.to_string().contains("unreadable"));
    }

    #[tokio::test]
    async fn validation_rejection_always_reports_invalid() {
        let response = ValidationRejection(AppError::InvalidArgument("missing field `key`".into()))
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["reason"], "invalid_argument");
        assert_eq!(json["error"]["code"], "invalid_argument");
    }

    #[test]
    fn only_key_outcomes_have_validation_reasons() {
        assert_eq!(AppError::KeyNotFound.validation_reason(), Some("not_found"));
        assert_eq!(AppError::KeyDeactivated.validation_reason(), Some("deactivated"));
        assert_eq!(AppError::KeyExpired.validation_reason(), Some("expired"));
        assert_eq!(AppError::InvalidCredential.validation_reason(), None);
    }
}
