//! License key HTTP handlers.
//!
//! This module implements the key-related API endpoints:
//! - POST /api/keys/generate - Issue a new key (admin)
//! - POST /api/keys/validate - Check a key from the client application
//! - GET /api/keys - List every key (admin)
//! - POST /api/keys/deactivate - Revoke a key (admin)

use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{
    auth::AdminCredential,
    error::{AppError, ValidationRejection},
    models::license_key::{
        AckResponse, GenerateKeyRequest, GenerateKeyResponse, KeyRequest, ListKeysResponse,
        ValidateKeyResponse,
    },
    server::AppState,
};

/// Issue a new key.
///
/// # Endpoint
///
/// `POST /api/keys/generate`
///
/// # Authentication
///
/// Requires the admin secret in `Authorization: Bearer <secret>` or `X-Admin-Key`.
///
/// # Request Body
///
/// ```json
/// { "durationDays": 30 }  // optional, defaults to 30
/// ```
///
/// The body itself is optional: an empty body (with or without a
/// `Content-Type`) means the default lifetime. The credential is checked
/// before the body, so a wrong secret is a 401 even when the body is malformed.
///
/// # Response
///
/// - **Success (201 Created)**: `{"key": "LIC-9F3A-0B7C-11DE", "expiresAt": "..."}`
/// - **Error (401)**: Invalid admin credential
/// - **Error (400)**: `durationDays` is not a positive integer
/// - **Error (500)**: Key store failure
pub async fn generate_key(
    State(service): State<AppState>,
    AdminCredential(credential): AdminCredential,
    body: Bytes,
) -> Result<(StatusCode, Json<GenerateKeyResponse>), AppError> {
    let request = match parse_generate_body(&body) {
        Ok(request) => request,
        Err(err) => {
            service.authorize(&credential, "generate")?;
            return Err(err);
        }
    };

    let record = service
        .generate(request.duration_days.as_ref(), &credential)
        .await?;

    Ok((StatusCode::CREATED, Json(record.into())))
}

/// Validate a key presented by a client application.
///
/// # Endpoint
///
/// `POST /api/keys/validate`
///
/// # Request Body
///
/// ```json
/// { "key": "LIC-9F3A-0B7C-11DE" }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: `{"valid": true, "expiresAt": "..."}`
/// - **Error (404)**: `{"valid": false, "reason": "not_found", ...}`
/// - **Error (403)**: `{"valid": false, "reason": "deactivated" | "expired", ...}`
///
/// A successful call records the time in the key's `lastUsed`.
pub async fn validate_key(
    State(service): State<AppState>,
    request: Result<Json<KeyRequest>, JsonRejection>,
) -> Result<Json<ValidateKeyResponse>, ValidationRejection> {
    let Json(request) = request.map_err(AppError::from)?;
    let validated = service.validate(&request.key).await?;

    Ok(Json(ValidateKeyResponse {
        valid: true,
        expires_at: validated.expires_at,
    }))
}

/// List every issued key, including deactivated and expired ones.
///
/// # Endpoint
///
/// `GET /api/keys`
///
/// # Response
///
/// - **Success (200 OK)**: `{"keys": [ { "key": ..., "createdAt": ..., ... } ]}` in issuance order
/// - **Error (401)**: Invalid admin credential
pub async fn list_keys(
    State(service): State<AppState>,
    AdminCredential(credential): AdminCredential,
) -> Result<Json<ListKeysResponse>, AppError> {
    let keys = service.list(&credential).await?;

    Ok(Json(ListKeysResponse { keys }))
}

/// Deactivate a key (soft delete).
///
/// # Endpoint
///
/// `POST /api/keys/deactivate`
///
/// # Request Body
///
/// ```json
/// { "key": "LIC-9F3A-0B7C-11DE" }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: `{"success": true}`, also for keys that were already inactive
/// - **Error (401)**: Invalid admin credential
/// - **Error (404)**: Key not found
pub async fn deactivate_key(
    State(service): State<AppState>,
    AdminCredential(credential): AdminCredential,
    request: Result<Json<KeyRequest>, JsonRejection>,
) -> Result<Json<AckResponse>, AppError> {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => {
            service.authorize(&credential, "deactivate")?;
            return Err(rejection.into());
        }
    };
    service.deactivate(&request.key, &credential).await?;

    Ok(Json(AckResponse { success: true }))
}

/// Parse the optional generate body. Empty or whitespace-only means defaults.
fn parse_generate_body(body: &[u8]) -> Result<GenerateKeyRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(GenerateKeyRequest::default());
    }

    serde_json::from_slice(body)
        .map_err(|e| AppError::InvalidArgument(format!("Invalid JSON body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_generate_body_uses_defaults() {
        assert!(parse_generate_body(b"").unwrap().duration_days.is_none());
        assert!(parse_generate_body(b" \n").unwrap().duration_days.is_none());
    }

    #[test]
    fn generate_body_with_duration() {
        let request = parse_generate_body(br#"{"durationDays": 7}"#).unwrap();
        assert_eq!(request.duration_days, Some(serde_json::json!(7)));
    }

    #[test]
    fn malformed_generate_body_is_invalid_argument() {
        assert!(matches!(
            parse_generate_body(b"{durationDays"),
            Err(AppError::InvalidArgument(_))
        ));
    }
}
