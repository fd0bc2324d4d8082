//! Refresh token entity.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::token::Token;

/// A refresh token wrapping the access token it was issued alongside.
///
/// The wrapped token carries the original claims and client, so a refresh
/// re-issues an equivalent access token without replaying the original grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshToken {
    /// When this refresh token (or its current incarnation) was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// Lifetime in seconds from `created_at`.
    pub lifetime: i64,

    /// The access token issued alongside this refresh token.
    pub access_token: Token,

    /// The original subject identifier.
    pub subject_id: String,

    /// Token schema version.
    pub version: u32,
}

impl RefreshToken {
    /// Client this token belongs to (from the wrapped access token).
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.access_token.client_id
    }

    /// Scope names carried by the wrapped access token.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.access_token.scopes()
    }

    /// When this token expires.
    #[must_use]
    pub fn expires_at(&self) -> OffsetDateTime {
        self.created_at + time::Duration::seconds(self.lifetime)
    }

    /// Returns `true` if this token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() > self.expires_at()
    }

    /// Seconds elapsed since creation, never negative.
    #[must_use]
    pub fn age_seconds(&self) -> i64 {
        (OffsetDateTime::now_utc() - self.created_at)
            .whole_seconds()
            .max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::claims::Claim;
    use crate::types::token::TokenType;
    use time::Duration;

    fn refresh_token(created_at: OffsetDateTime, lifetime: i64) -> RefreshToken {
        RefreshToken {
            created_at,
            lifetime,
            access_token: Token {
                token_type: TokenType::Access,
                audience: "https://id.example.com/resources".to_string(),
                issuer: "https://id.example.com".to_string(),
                created_at,
                lifetime: 3600,
                claims: vec![
                    Claim::string("sub", "alice"),
                    Claim::string("scope", "api1"),
                    Claim::string("scope", "offline_access"),
                ],
                client_id: "roclient".to_string(),
                version: 1,
            },
            subject_id: "alice".to_string(),
            version: 1,
        }
    }

    #[test]
    fn test_accessors() {
        let token = refresh_token(OffsetDateTime::now_utc(), 600);
        assert_eq!(token.client_id(), "roclient");
        assert_eq!(token.scopes(), vec!["api1", "offline_access"]);
        assert!(!token.is_expired());
    }

    #[test]
    fn test_expiry_and_age() {
        let token = refresh_token(OffsetDateTime::now_utc() - Duration::seconds(100), 50);
        assert!(token.is_expired());
        assert!(token.age_seconds() >= 100);
    }
}
