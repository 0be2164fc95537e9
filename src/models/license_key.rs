//! License key data models and API request/response types.
//!
//! This module defines:
//! - `KeyRecord`: one issued key as it is persisted and listed
//! - `KeyStoreDocument`: the on-disk shape of the whole record set
//! - Request and response bodies for the key endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::timestamp;

/// Represents one issued license key.
///
/// # Persisted Format
///
/// Fields are serialized in camelCase, in declaration order:
///
/// ```json
/// {
///   "key": "LIC-9F3A-0B7C-11DE",
///   "createdAt": "2025-12-20T10:00:00.000Z",
///   "expiresAt": "2026-01-19T10:00:00.000Z",
///   "isActive": true,
///   "lastUsed": null
/// }
/// ```
///
/// # Lifecycle
///
/// Records are created by generation, touched by validation (`last_used`) and
/// deactivation (`is_active`), and never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRecord {
    /// Opaque token handed to the client application
    pub key: String,

    /// Timestamp when the key was issued
    #[serde(with = "timestamp::millis")]
    pub created_at: DateTime<Utc>,

    /// The key stops validating once this instant has passed
    #[serde(with = "timestamp::millis")]
    pub expires_at: DateTime<Utc>,

    /// Whether this key may still be used
    ///
    /// Once false, it never becomes true again.
    pub is_active: bool,

    /// Timestamp of the most recent successful validation
    #[serde(default, with = "timestamp::option_millis")]
    pub last_used: Option<DateTime<Utc>>,
}

impl KeyRecord {
    /// Create a freshly issued, active, never-used record.
    pub fn issue(key: String, created_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            key,
            created_at,
            expires_at,
            is_active: true,
            last_used: None,
        }
    }

    /// Whether the expiry instant lies strictly before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// The single persisted document holding every record in issuance order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyStoreDocument {
    pub keys: Vec<KeyRecord>,
}

/// Request body for generating a key.
///
/// # JSON Example
///
/// ```json
/// { "durationDays": 30 }
/// ```
///
/// `durationDays` is kept as a raw JSON value so that strings such as `"30"` are
/// accepted and anything non-integral is rejected with a 400 instead of a
/// deserialization failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateKeyRequest {
    #[serde(default)]
    pub duration_days: Option<serde_json::Value>,
}

/// Response body for a newly generated key.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateKeyResponse {
    pub key: String,
    #[serde(with = "timestamp::millis")]
    pub expires_at: DateTime<Utc>,
}

impl From<KeyRecord> for GenerateKeyResponse {
    fn from(record: KeyRecord) -> Self {
        Self {
            key: record.key,
            expires_at: record.expires_at,
        }
    }
}

/// Request body carrying a single key, used by validate and deactivate.
#[derive(Debug, Deserialize)]
pub struct KeyRequest {
    pub key: String,
}

/// Successful validation response.
///
/// ```json
/// { "valid": true, "expiresAt": "2026-01-19T10:00:00.000Z" }
/// ```
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateKeyResponse {
    pub valid: bool,
    #[serde(with = "timestamp::millis")]
    pub expires_at: DateTime<Utc>,
}

/// Response body for listing keys.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListKeysResponse {
    pub keys: Vec<KeyRecord>,
}

/// Acknowledgement returned by deactivation.
#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
}
