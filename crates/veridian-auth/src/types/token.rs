//! Token entity and the request that produces it.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::claims::{Claim, Subject, claim_types};
use crate::types::client::Client;
use crate::types::scope::Scope;

/// The two kinds of tokens produced by the token service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Access token for a protected resource.
    Access,
    /// OpenID Connect identity token.
    Identity,
}

impl TokenType {
    /// Wire name of the token type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access_token",
            Self::Identity => "id_token",
        }
    }
}

/// A token produced by the token service.
///
/// Either signed into a self-contained JWT or stored under a random handle as
/// a reference token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// Access or identity token.
    pub token_type: TokenType,

    /// `aud` claim value.
    pub audience: String,

    /// `iss` claim value.
    pub issuer: String,

    /// Creation time; `iat`/`nbf` derive from it.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// Lifetime in seconds; `exp` = `created_at` + `lifetime`.
    pub lifetime: i64,

    /// Ordered, de-duplicated claim set.
    pub claims: Vec<Claim>,

    /// Client the token was issued to.
    pub client_id: String,

    /// Token schema version.
    pub version: u32,
}

impl Token {
    /// When this token expires.
    #[must_use]
    pub fn expires_at(&self) -> OffsetDateTime {
        self.created_at + time::Duration::seconds(self.lifetime)
    }

    /// Returns `true` if the token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() > self.expires_at()
    }

    /// The `sub` claim value, if present.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.claims
            .iter()
            .find(|c| c.claim_type == claim_types::SUBJECT)
            .and_then(|c| c.value.as_str())
    }

    /// All `scope` claim values.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.claims
            .iter()
            .filter(|c| c.claim_type == claim_types::SCOPE)
            .filter_map(|c| c.value.as_str())
            .collect()
    }
}

/// Request-scoped aggregate consumed synchronously by the token service.
///
/// Not persisted; built by a response generator from a validated request.
#[derive(Debug, Clone)]
pub struct TokenCreationRequest {
    /// Authenticated end user, absent for machine-to-machine grants.
    pub subject: Option<Subject>,

    /// The client the token is issued to.
    pub client: Client,

    /// Granted scopes.
    pub scopes: Vec<Scope>,

    /// Nonce from the authorization request, mirrored into identity tokens.
    pub nonce: Option<String>,

    /// Session identifier, emitted as `sid` when present.
    pub session_id: Option<String>,

    /// Access token string to bind via `at_hash`.
    pub access_token_to_hash: Option<String>,

    /// Authorization code string to bind via `c_hash`.
    pub authorization_code_to_hash: Option<String>,

    /// PKCE-derived proof key, emitted as a `cnf` claim when present.
    pub proof_key: Option<String>,

    /// Emit all subject claims regardless of scope claim lists.
    pub include_all_identity_claims: bool,
}

impl TokenCreationRequest {
    /// Creates a request for the given client and scopes.
    #[must_use]
    pub fn new(client: Client, scopes: Vec<Scope>) -> Self {
        Self {
            subject: None,
            client,
            scopes,
            nonce: None,
            session_id: None,
            access_token_to_hash: None,
            authorization_code_to_hash: None,
            proof_key: None,
            include_all_identity_claims: false,
        }
    }

    /// Sets the authenticated subject.
    #[must_use]
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Sets the nonce.
    #[must_use]
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Sets the session id.
    #[must_use]
    pub fn with_session_id(mut self, sid: impl Into<String>) -> Self {
        self.session_id = Some(sid.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn token_with(claims: Vec<Claim>, lifetime: i64, created_at: OffsetDateTime) -> Token {
        Token {
            token_type: TokenType::Access,
            audience: "https://id.example.com/resources".to_string(),
            issuer: "https://id.example.com".to_string(),
            created_at,
            lifetime,
            claims,
            client_id: "client".to_string(),
            version: 1,
        }
    }

    #[test]
    fn test_expiration() {
        let now = OffsetDateTime::now_utc();
        let token = token_with(vec![], 60, now);
        assert!(!token.is_expired());

        let token = token_with(vec![], 60, now - Duration::seconds(61));
        assert!(token.is_expired());
    }

    #[test]
    fn test_claim_accessors() {
        let token = token_with(
            vec![
                Claim::string("sub", "alice"),
                Claim::string("scope", "openid"),
                Claim::string("scope", "api1"),
            ],
            60,
            OffsetDateTime::now_utc(),
        );
        assert_eq!(token.subject(), Some("alice"));
        assert_eq!(token.scopes(), vec!["openid", "api1"]);
    }
}
