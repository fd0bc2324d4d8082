//! Server configuration for the token pipeline.
//!
//! Configuration is deserializable from TOML/JSON with humane duration
//! strings, e.g.:
//!
//! ```toml
//! issuer = "https://id.example.com"
//! max_assertion_lifetime = "5m"
//!
//! [input_lengths]
//! client_id = 100
//! client_secret = 100
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the token issuance core.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Issuer URI, emitted as the `iss` claim of every token.
    pub issuer: String,

    /// Path of the token endpoint, appended to the issuer. Used as the
    /// expected audience of `private_key_jwt` client assertions.
    pub token_endpoint_path: String,

    /// Maximum accepted lifetime of a client assertion JWT.
    #[serde(with = "humantime_serde")]
    pub max_assertion_lifetime: Duration,

    /// Upper bounds on the size of inbound credential material.
    pub input_lengths: InputLengthRestrictions,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "https://localhost:44333".to_string(),
            token_endpoint_path: "/connect/token".to_string(),
            max_assertion_lifetime: Duration::from_secs(300),
            input_lengths: InputLengthRestrictions::default(),
        }
    }
}

impl AuthConfig {
    /// Creates a configuration with the given issuer and defaults elsewhere.
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            ..Self::default()
        }
    }

    /// The full token endpoint URL.
    #[must_use]
    pub fn token_endpoint(&self) -> String {
        format!(
            "{}{}",
            self.issuer.trim_end_matches('/'),
            self.token_endpoint_path
        )
    }

    /// The audience emitted on access tokens, derived from the issuer.
    #[must_use]
    pub fn access_token_audience(&self) -> String {
        format!("{}/resources", self.issuer.trim_end_matches('/'))
    }
}

/// Maximum lengths for inbound request values.
///
/// Values exceeding these limits are rejected during secret parsing; they
/// never reach a validator.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InputLengthRestrictions {
    /// Maximum length of a `client_id`.
    pub client_id: usize,

    /// Maximum length of a `client_secret`.
    pub client_secret: usize,

    /// Maximum length of the `scope` parameter.
    pub scope: usize,
}

impl Default for InputLengthRestrictions {
    fn default() -> Self {
        Self {
            client_id: 100,
            client_secret: 100,
            scope: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.input_lengths.client_id, 100);
        assert_eq!(config.max_assertion_lifetime, Duration::from_secs(300));
    }

    #[test]
    fn test_token_endpoint_url() {
        let config = AuthConfig::new("https://id.example.com/");
        assert_eq!(
            config.token_endpoint(),
            "https://id.example.com/connect/token"
        );
        assert_eq!(
            config.access_token_audience(),
            "https://id.example.com/resources"
        );
    }

    #[test]
    fn test_deserialize_with_humantime() {
        let json = serde_json::json!({
            "issuer": "https://id.example.com",
            "max_assertion_lifetime": "2m",
            "input_lengths": { "client_secret": 64 },
        });
        let config: AuthConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.issuer, "https://id.example.com");
        assert_eq!(config.max_assertion_lifetime, Duration::from_secs(120));
        assert_eq!(config.input_lengths.client_secret, 64);
        // Untouched fields keep their defaults.
        assert_eq!(config.input_lengths.client_id, 100);
    }
}
