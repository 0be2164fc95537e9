//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;

/// Admin secret used when `ADMIN_SECRET` is not set. Only suitable for local development.
pub const DEV_ADMIN_SECRET: &str = "change-me-admin-secret";

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `ADMIN_SECRET` (optional): shared secret gating generate/list/deactivate
/// - `SERVER_HOST` (optional): bind address, defaults to 0.0.0.0
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `PORT_FALLBACK_ATTEMPTS` (optional): extra ports to try when the port is taken, defaults to 10
/// - `KEY_STORE_PATH` (optional): JSON document holding the key records, defaults to `keys.json`
/// - `STORE_FAIL_OPEN` (optional): treat a corrupt store as empty, defaults to true
/// - `DEFAULT_DURATION_DAYS` (optional): key lifetime when none is requested, defaults to 30
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub admin_secret: Option<String>,

    #[serde(default = "default_host")]
    pub server_host: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_fallback_attempts")]
    pub port_fallback_attempts: u16,

    #[serde(default = "default_store_path")]
    pub key_store_path: String,

    #[serde(default = "default_fail_open")]
    pub store_fail_open: bool,

    #[serde(default = "default_duration_days")]
    pub default_duration_days: i64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_fallback_attempts() -> u16 {
    10
}

fn default_store_path() -> String {
    "keys.json".to_string()
}

fn default_fail_open() -> bool {
    true
}

fn default_duration_days() -> i64 {
    30
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if environment variable values cannot be parsed into expected types
    /// (e.g. `SERVER_PORT=abc`).
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: key_store_path -> KEY_STORE_PATH
        envy::from_env::<Config>()
    }

    /// Build a configuration from an explicit set of variables instead of the process environment.
    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars)
    }

    /// The configured admin secret, or the development default.
    ///
    /// Empty values count as unset.
    pub fn admin_secret(&self) -> &str {
        match self.admin_secret.as_deref() {
            Some(secret) if !secret.is_empty() => secret,
            _ => DEV_ADMIN_SECRET,
        }
    }

    /// Whether the development default secret is in effect.
    pub fn uses_dev_secret(&self) -> bool {
        self.admin_secret() == DEV_ADMIN_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_vars(vars(&[])).unwrap();

        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.port_fallback_attempts, 10);
        assert_eq!(config.key_store_path, "keys.json");
        assert!(config.store_fail_open);
        assert_eq!(config.default_duration_days, 30);
        assert!(config.uses_dev_secret());
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_vars(vars(&[
            ("ADMIN_SECRET", "s3cret"),
            ("SERVER_PORT", "8081"),
            ("KEY_STORE_PATH", "/var/lib/keys.json"),
            ("STORE_FAIL_OPEN", "false"),
            ("DEFAULT_DURATION_DAYS", "7"),
        ]))
        .unwrap();

        assert_eq!(config.admin_secret(), "s3cret");
        assert!(!config.uses_dev_secret());
        assert_eq!(config.server_port, 8081);
        assert_eq!(config.key_store_path, "/var/lib/keys.json");
        assert!(!config.store_fail_open);
        assert_eq!(config.default_duration_days, 7);
    }

    #[test]
    fn empty_secret_falls_back_to_default() {
        let config = Config::from_vars(vars(&[("ADMIN_SECRET", "")])).unwrap();
        assert_eq!(config.admin_secret(), DEV_ADMIN_SECRET);
    }

    #[test]
    fn rejects_non_numeric_port() {
        assert!(Config::from_vars(vars(&[("SERVER_PORT", "abc")])).is_err());
    }
}
