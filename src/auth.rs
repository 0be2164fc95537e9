//! Admin credential handling.
//!
//! Generation, listing and deactivation are gated by a single shared secret.
//! This module provides:
//! 1. [`AdminSecret`], which checks a presented credential in constant time
//! 2. [`AdminCredential`], an extractor that pulls the presented credential from the request headers
//!
//! The extractor never rejects a request on its own: a missing header yields an
//! empty credential, and the lifecycle layer decides whether it is acceptable.

use axum::{extract::FromRequestParts, http::request::Parts};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::convert::Infallible;

type HmacSha256 = Hmac<Sha256>;

/// Fixed HMAC key used to turn credentials into comparable tags.
const CREDENTIAL_TAG_KEY: &[u8] = b"license-key-server/admin-credential";

/// Name of the alternate header carrying the admin credential.
pub const ADMIN_KEY_HEADER: &str = "X-Admin-Key";

/// The configured administrative secret.
///
/// Only an HMAC-SHA256 tag of the secret is kept. Checking a candidate computes
/// its tag and compares with `verify_slice`, which runs in constant time, so the
/// comparison does not leak how many leading bytes matched.
#[derive(Clone)]
pub struct AdminSecret {
    tag: Vec<u8>,
}

impl AdminSecret {
    pub fn new(secret: &str) -> Self {
        Self {
            tag: tag_for(secret).finalize().into_bytes().to_vec(),
        }
    }

    /// Whether `candidate` equals the configured secret.
    pub fn verify(&self, candidate: &str) -> bool {
        tag_for(candidate).verify_slice(&self.tag).is_ok()
    }
}

impl std::fmt::Debug for AdminSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AdminSecret(..)")
    }
}

fn tag_for(value: &str) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(CREDENTIAL_TAG_KEY).expect("HMAC key length is valid");
    mac.update(value.as_bytes());
    mac
}

/// Admin credential presented with a request.
///
/// # Headers
///
/// Either of:
/// ```text
/// Authorization: Bearer <secret>
/// X-Admin-Key: <secret>
/// ```
///
/// `Authorization` wins when both are present.
#[derive(Debug, Clone, Default)]
pub struct AdminCredential(pub String);

impl<S> FromRequestParts<S> for AdminCredential
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|h| h.to_str().ok())
                .map(str::to_string)
        };

        let bearer = header("Authorization")
            .and_then(|value| value.strip_prefix("Bearer ").map(str::to_string));

        let credential = bearer.or_else(|| header(ADMIN_KEY_HEADER)).unwrap_or_default();

        Ok(AdminCredential(credential))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[test]
    fn verifies_exact_secret_only() {
        let secret = AdminSecret::new("correct horse");
        assert!(secret.verify("correct horse"));
        assert!(!secret.verify("correct hors"));
        assert!(!secret.verify("correct horse "));
        assert!(!secret.verify("CORRECT HORSE"));
        assert!(!secret.verify(""));
    }

    #[test]
    fn debug_does_not_print_secret() {
        let secret = AdminSecret::new("hunter2");
        assert!(!format!("{:?}", secret).contains("hunter2"));
    }

    async fn extract(request: Request<()>) -> String {
        let (mut parts, _) = request.into_parts();
        let AdminCredential(credential) = AdminCredential::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        credential
    }

    #[tokio::test]
    async fn reads_bearer_token() {
        let request = Request::builder()
            .header("Authorization", "Bearer abc123")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await, "abc123");
    }

    #[tokio::test]
    async fn reads_admin_key_header() {
        let request = Request::builder()
            .header(ADMIN_KEY_HEADER, "abc123")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await, "abc123");
    }

    #[tokio::test]
    async fn missing_header_is_empty_credential() {
        let request = Request::builder().body(()).unwrap();
        assert_eq!(extract(request).await, "");
    }
}
