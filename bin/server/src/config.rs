//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables, e.g.
//! `GITHUB__CLIENT_ID` or `ACCESS__READ_WRITE_TEAMS`.
//!
//! See [`GithubConfig`](teamgate_github::GithubConfig) and
//! [`AccessConfig`](teamgate_access::AccessConfig) for the library parts.

use crate::error::StartupError;
use axum_extra::extract::cookie::Key;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rootcause::prelude::Report;
use serde::Deserialize;
use teamgate_access::AccessConfig;
use teamgate_github::GithubConfig;

/// Required length of each decoded session key.
const SESSION_KEY_LEN: usize = 32;

/// Longest accepted session lifetime: 30 days.
const MAX_SESSION_DURATION_MINUTES: i64 = 30 * 24 * 60;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// GitHub endpoints and OAuth application.
    pub github: GithubConfig,

    /// Session configuration.
    pub session: SessionConfig,

    /// Team rules and webhook secret.
    pub access: AccessConfig,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Base64-encoded 32-byte key authenticating session cookies.
    pub auth_key: String,

    /// Base64-encoded 32-byte key encrypting session cookies.
    pub crypt_key: String,

    /// Session duration in minutes.
    #[serde(default = "default_session_duration_minutes")]
    pub duration_minutes: i64,

    /// Interval between session cleanup runs, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

fn default_session_duration_minutes() -> i64 {
    8 * 60
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

fn default_secure_cookies() -> bool {
    true
}

impl SessionConfig {
    /// Returns how long a session lives after its last save.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSessionSetting` unless `duration_minutes` is between
    /// one minute and 30 days.
    pub fn session_duration(&self) -> Result<chrono::Duration, Report<StartupError>> {
        if !(1..=MAX_SESSION_DURATION_MINUTES).contains(&self.duration_minutes) {
            return Err(StartupError::InvalidSessionSetting {
                name: "duration_minutes",
                details: format!(
                    "expected 1 to {MAX_SESSION_DURATION_MINUTES}, got {}",
                    self.duration_minutes
                ),
            }
            .into());
        }
        Ok(chrono::Duration::minutes(self.duration_minutes))
    }

    /// Returns the period of the expired-session sweep.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSessionSetting` if `cleanup_interval_seconds` is zero.
    pub fn cleanup_interval(&self) -> Result<std::time::Duration, Report<StartupError>> {
        if self.cleanup_interval_seconds == 0 {
            return Err(StartupError::InvalidSessionSetting {
                name: "cleanup_interval_seconds",
                details: "must be at least 1".to_string(),
            }
            .into());
        }
        Ok(std::time::Duration::from_secs(self.cleanup_interval_seconds))
    }

    /// Derives the cookie key from the authentication and encryption keys.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSessionKey` if either key is not base64 or does not
    /// decode to exactly 32 bytes.
    pub fn cookie_key(&self) -> Result<Key, Report<StartupError>> {
        let mut master = decode_key("auth_key", &self.auth_key)?;
        master.extend(decode_key("crypt_key", &self.crypt_key)?);
        Key::try_from(master.as_slice()).map_err(|e| {
            StartupError::InvalidSessionKey {
                name: "auth_key+crypt_key",
                details: e.to_string(),
            }
            .into()
        })
    }
}

fn decode_key(name: &'static str, encoded: &str) -> Result<Vec<u8>, Report<StartupError>> {
    let key = STANDARD
        .decode(encoded.trim())
        .map_err(|e| StartupError::InvalidSessionKey {
            name,
            details: e.to_string(),
        })?;
    if key.len() != SESSION_KEY_LEN {
        return Err(StartupError::InvalidSessionKey {
            name,
            details: format!("expected {SESSION_KEY_LEN} bytes, got {}", key.len()),
        }
        .into());
    }
    Ok(key)
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_config(auth_key: &str, crypt_key: &str) -> SessionConfig {
        serde_json::from_value(serde_json::json!({
            "auth_key": auth_key,
            "crypt_key": crypt_key,
        }))
        .expect("deserialize")
    }

    #[test]
    fn session_config_has_correct_defaults() {
        let config = session_config("", "");
        assert_eq!(config.duration_minutes, 480);
        assert_eq!(config.cleanup_interval_seconds, 300);
        assert!(config.secure_cookies);
    }

    #[test]
    fn zero_cleanup_interval_is_rejected() {
        let mut config = session_config("", "");
        config.cleanup_interval_seconds = 0;
        assert!(config.cleanup_interval().is_err());

        config.cleanup_interval_seconds = 1;
        assert_eq!(
            config.cleanup_interval().expect("interval"),
            std::time::Duration::from_secs(1)
        );
    }

    #[test]
    fn session_duration_must_be_positive_and_bounded() {
        let mut config = session_config("", "");
        assert_eq!(
            config.session_duration().expect("default duration"),
            chrono::Duration::hours(8)
        );

        for minutes in [0, -5, MAX_SESSION_DURATION_MINUTES + 1, i64::MAX] {
            config.duration_minutes = minutes;
            assert!(config.session_duration().is_err(), "{minutes} accepted");
        }

        config.duration_minutes = MAX_SESSION_DURATION_MINUTES;
        assert!(config.session_duration().is_ok());
    }

    #[test]
    fn cookie_key_from_two_32_byte_keys() {
        let auth = STANDARD.encode([1u8; 32]);
        let crypt = STANDARD.encode([2u8; 32]);
        assert!(session_config(&auth, &crypt).cookie_key().is_ok());
    }

    #[test]
    fn cookie_key_rejects_short_or_invalid_keys() {
        let good = STANDARD.encode([1u8; 32]);
        let short = STANDARD.encode([1u8; 16]);
        assert!(session_config(&short, &good).cookie_key().is_err());
        assert!(session_config(&good, "not base64!").cookie_key().is_err());
    }

    #[test]
    fn server_config_from_nested_values() {
        let config: ServerConfig = serde_json::from_value(serde_json::json!({
            "github": {"client_id": "id", "client_secret": "secret"},
            "session": {"auth_key": "a", "crypt_key": "b"},
            "access": {
                "read_write_teams": "acme/infra",
                "default_team_id": "team-1",
                "webhook_secret": "hook"
            }
        }))
        .expect("deserialize");
        assert_eq!(config.listen_addr, "0.0.0.0:8000");
        assert_eq!(config.github.api_url(), "https://api.github.com");
        assert_eq!(config.access.read_write_teams(), vec!["acme/infra"]);
    }
}
