//! Key lifecycle service - core business logic for license keys.
//!
//! This service handles:
//! - Key generation with configurable lifetime
//! - Validation (existence, activation state, expiry) and usage tracking
//! - Listing and deactivation for administrators
//!
//! # Consistency Guarantees
//!
//! Every operation re-reads the whole record set from the store. Mutating
//! operations hold the store's write lock across their load → modify → save
//! sequence, so concurrent requests cannot overwrite each other's changes.
//! Listing takes the read lock and may run alongside other listings.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{
    auth::AdminSecret,
    error::AppError,
    models::license_key::KeyRecord,
    store::KeyStore,
};

/// Brand tag every token starts with.
pub const TOKEN_PREFIX: &str = "LIC";

/// Lifetime applied when a generate request does not name one.
pub const DEFAULT_DURATION_DAYS: i64 = 30;

/// Upper bound on a requested lifetime (about a century).
pub const MAX_DURATION_DAYS: i64 = 36_500;

/// Outcome of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedKey {
    pub expires_at: DateTime<Utc>,
}

/// Issues, validates, lists and deactivates keys on top of a [`KeyStore`].
#[derive(Debug)]
pub struct KeyService<S> {
    store: RwLock<S>,
    admin_secret: AdminSecret,
    default_duration_days: i64,
}

impl<S: KeyStore> KeyService<S> {
    pub fn new(store: S, admin_secret: AdminSecret) -> Self {
        Self {
            store: RwLock::new(store),
            admin_secret,
            default_duration_days: DEFAULT_DURATION_DAYS,
        }
    }

    /// Override the lifetime used when a generate request does not name one.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument`: `days` is outside `1..=MAX_DURATION_DAYS`
    pub fn with_default_duration(mut self, days: i64) -> Result<Self, AppError> {
        self.default_duration_days = check_duration_range(days)?;
        Ok(self)
    }

    /// Create the backing store if it does not exist yet. Called once at startup.
    pub async fn initialize(&self) -> Result<(), AppError> {
        self.store.write().await.initialize_if_absent().await?;
        Ok(())
    }

    /// Issue a new key.
    ///
    /// # Process
    ///
    /// 1. Check the admin credential
    /// 2. Resolve the lifetime (default when absent)
    /// 3. Append an active, never-used record and persist the full set
    ///
    /// # Arguments
    ///
    /// * `duration_days` - Requested lifetime as raw JSON: an integer or an integer string
    /// * `credential` - Admin credential presented by the caller
    ///
    /// # Errors
    ///
    /// - `InvalidCredential`: credential does not match (nothing is written)
    /// - `InvalidArgument`: duration is not an integer in `1..=MAX_DURATION_DAYS`
    /// - `Store`: persistence failed
    pub async fn generate(
        &self,
        duration_days: Option<&Value>,
        credential: &str,
    ) -> Result<KeyRecord, AppError> {
        self.authorize(credential, "generate")?;
        let days = parse_duration_days(duration_days, self.default_duration_days)?;

        let store = self.store.write().await;
        let mut records = store.load().await?;

        let created_at = now();
        let expires_at = created_at + Duration::days(days);
        let record = KeyRecord::issue(generate_token(), created_at, expires_at);
        records.push(record.clone());
        store.save(&records).await?;

        tracing::info!(
            key = %redact(&record.key),
            expires_at = %record.expires_at,
            "Key generated"
        );

        Ok(record)
    }

    /// Check a key and record its use.
    ///
    /// Checks run in a fixed order and the first failure wins:
    /// not found → deactivated → expired. A key that is both deactivated and
    /// expired therefore reports `KeyDeactivated`.
    ///
    /// On success `last_used` is set to now and the set is persisted.
    pub async fn validate(&self, token: &str) -> Result<ValidatedKey, AppError> {
        let store = self.store.write().await;
        let mut records = store.load().await?;
        let now = now();

        let outcome = match records.iter_mut().find(|r| r.key == token) {
            None => Err(AppError::KeyNotFound),
            Some(record) if !record.is_active => Err(AppError::KeyDeactivated),
            Some(record) if record.is_expired_at(now) => Err(AppError::KeyExpired),
            Some(record) => {
                record.last_used = Some(now);
                Ok(ValidatedKey {
                    expires_at: record.expires_at,
                })
            }
        };

        match outcome {
            Ok(validated) => {
                store.save(&records).await?;
                Ok(validated)
            }
            Err(err) => {
                tracing::debug!(key = %redact(token), reason = err.code(), "Key rejected");
                Err(err)
            }
        }
    }

    /// Return every record, including inactive and expired ones, in issuance order.
    pub async fn list(&self, credential: &str) -> Result<Vec<KeyRecord>, AppError> {
        self.authorize(credential, "list")?;
        let records = self.store.read().await.load().await?;
        Ok(records)
    }

    /// Permanently deactivate a key.
    ///
    /// Deactivating an already inactive key succeeds again.
    ///
    /// # Errors
    ///
    /// - `InvalidCredential`: credential does not match (nothing is written)
    /// - `KeyNotFound`: no record carries `token`
    /// - `Store`: persistence failed
    pub async fn deactivate(&self, token: &str, credential: &str) -> Result<(), AppError> {
        self.authorize(credential, "deactivate")?;

        let store = self.store.write().await;
        let mut records = store.load().await?;

        let record = records
            .iter_mut()
            .find(|r| r.key == token)
            .ok_or(AppError::KeyNotFound)?;
        record.is_active = false;

        store.save(&records).await?;
        tracing::info!(key = %redact(token), "Key deactivated");

        Ok(())
    }

    /// Number of stored records. Used by the health check.
    pub async fn key_count(&self) -> Result<usize, AppError> {
        Ok(self.store.read().await.load().await?.len())
    }

    /// Check the admin credential for `operation`.
    ///
    /// Handlers call this directly when a request body cannot be parsed, so a
    /// wrong credential is still reported before a malformed body.
    pub fn authorize(&self, credential: &str, operation: &'static str) -> Result<(), AppError> {
        if self.admin_secret.verify(credential) {
            Ok(())
        } else {
            tracing::warn!(operation, "Rejected invalid admin credential");
            Err(AppError::InvalidCredential)
        }
    }
}

/// Current time at the millisecond precision records are stored with.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Generate a token of the form `LIC-XXXX-XXXX-XXXX`.
///
/// # Format
///
/// 8 random bytes are hex-encoded in upper case (16 characters). The first
/// 12 characters form the three groups; the last 4 are discarded so tokens
/// keep the length of previously issued ones.
pub fn generate_token() -> String {
    let bytes: [u8; 8] = rand::random();
    let hex = hex::encode_upper(bytes);
    format!(
        "{}-{}-{}-{}",
        TOKEN_PREFIX,
        &hex[0..4],
        &hex[4..8],
        &hex[8..12]
    )
}

/// Shorten a token for logs: prefix and first group only.
fn redact(token: &str) -> String {
    let visible: String = token.chars().take(TOKEN_PREFIX.len() + 5).collect();
    format!("{}…", visible)
}

/// Resolve a requested lifetime.
///
/// # Rules
///
/// - Absent or `null`: `default`
/// - JSON integer or a string holding one (`30`, `"30"`): that value
/// - Anything else (fractions, words, booleans): `InvalidArgument`
/// - Result must lie in `1..=MAX_DURATION_DAYS`
pub fn parse_duration_days(value: Option<&Value>, default: i64) -> Result<i64, AppError> {
    let days = match value {
        None | Some(Value::Null) => default,
        Some(Value::Number(n)) => n.as_i64().ok_or_else(|| {
            AppError::InvalidArgument(format!("durationDays must be an integer, got {}", n))
        })?,
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| {
            AppError::InvalidArgument(format!("durationDays must be an integer, got {:?}", s))
        })?,
        Some(other) => {
            return Err(AppError::InvalidArgument(format!(
                "durationDays must be an integer, got {}",
                other
            )));
        }
    };

    check_duration_range(days)
}

fn check_duration_range(days: i64) -> Result<i64, AppError> {
    if (1..=MAX_DURATION_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(AppError::InvalidArgument(format!(
            "durationDays must be between 1 and {}, got {}",
            MAX_DURATION_DAYS, days
        )))
    }
}
