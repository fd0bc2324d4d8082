//! OAuth client registration.

use serde::{Deserialize, Serialize};

use crate::types::secret::Secret;

/// OAuth 2.0 grant types a client may be allowed to use.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GrantType {
    /// Authorization code flow.
    AuthorizationCode,
    /// Implicit flow.
    Implicit,
    /// Hybrid flow (code + tokens from the authorize endpoint).
    Hybrid,
    /// Client credentials (machine-to-machine).
    ClientCredentials,
    /// Resource owner password credentials.
    Password,
    /// Refresh token grant.
    RefreshToken,
    /// An extension grant identified by its grant-type string.
    Extension(String),
}

impl GrantType {
    /// The wire value of this grant type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::Implicit => "implicit",
            Self::Hybrid => "hybrid",
            Self::ClientCredentials => "client_credentials",
            Self::Password => "password",
            Self::RefreshToken => "refresh_token",
            Self::Extension(s) => s.as_str(),
        }
    }
}

impl From<String> for GrantType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "authorization_code" => Self::AuthorizationCode,
            "implicit" => Self::Implicit,
            "hybrid" => Self::Hybrid,
            "client_credentials" => Self::ClientCredentials,
            "password" => Self::Password,
            "refresh_token" => Self::RefreshToken,
            _ => Self::Extension(s),
        }
    }
}

impl From<GrantType> for String {
    fn from(g: GrantType) -> Self {
        g.as_str().to_string()
    }
}

/// Whether a refresh token handle survives being used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshTokenUsage {
    /// The same handle can be presented repeatedly.
    ReUse,
    /// Each use invalidates the handle and mints a replacement.
    OneTimeOnly,
}

/// How a refresh token's lifetime is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshTokenExpiration {
    /// Fixed expiration from issuance regardless of use.
    Absolute,
    /// Lifetime extends on each use, capped at the absolute maximum.
    Sliding,
}

/// Whether access tokens are self-contained JWTs or opaque references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessTokenType {
    /// Signed, self-contained JWT.
    Jwt,
    /// Opaque handle resolved server-side via the token handle store.
    Reference,
}

/// A registered relying party.
///
/// Immutable for the duration of a request; resolved through the client
/// store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Unique client identifier.
    pub client_id: String,

    /// Human-readable name.
    pub client_name: String,

    /// Disabled clients fail every validation.
    pub enabled: bool,

    /// Registered secrets, each with its own type and expiration.
    pub client_secrets: Vec<Secret>,

    /// Grant types the client may use.
    pub grant_types: Vec<GrantType>,

    /// Registered redirect URIs (exact match).
    pub redirect_uris: Vec<String>,

    /// Registered post-logout redirect URIs (exact match).
    #[serde(default)]
    pub post_logout_redirect_uris: Vec<String>,

    /// When `true`, the scope allow-list is ignored.
    pub allow_access_to_all_scopes: bool,

    /// Scope names the client may request, unless `allow_access_to_all_scopes`.
    pub allowed_scopes: Vec<String>,

    /// Identity token lifetime in seconds.
    pub identity_token_lifetime: i64,

    /// Access token lifetime in seconds.
    pub access_token_lifetime: i64,

    /// Authorization code lifetime in seconds.
    pub authorization_code_lifetime: i64,

    /// Absolute refresh token lifetime cap in seconds.
    pub absolute_refresh_token_lifetime: i64,

    /// Sliding refresh token increment in seconds.
    pub sliding_refresh_token_lifetime: i64,

    /// Refresh token handle rotation policy.
    pub refresh_token_usage: RefreshTokenUsage,

    /// Refresh token expiration policy.
    pub refresh_token_expiration: RefreshTokenExpiration,

    /// Access token representation.
    pub access_token_type: AccessTokenType,

    /// Emit a `jti` claim on access tokens.
    pub include_jwt_id: bool,

    /// Require PKCE on the authorization code grant.
    pub require_pkce: bool,
}

impl Client {
    /// Creates a client with the given id and conservative defaults.
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        let client_id = client_id.into();
        Self {
            client_name: client_id.clone(),
            client_id,
            enabled: true,
            client_secrets: Vec::new(),
            grant_types: vec![GrantType::AuthorizationCode],
            redirect_uris: Vec::new(),
            post_logout_redirect_uris: Vec::new(),
            allow_access_to_all_scopes: false,
            allowed_scopes: Vec::new(),
            identity_token_lifetime: 300,
            access_token_lifetime: 3600,
            authorization_code_lifetime: 300,
            absolute_refresh_token_lifetime: 2_592_000,
            sliding_refresh_token_lifetime: 1_296_000,
            refresh_token_usage: RefreshTokenUsage::OneTimeOnly,
            refresh_token_expiration: RefreshTokenExpiration::Absolute,
            access_token_type: AccessTokenType::Jwt,
            include_jwt_id: false,
            require_pkce: false,
        }
    }

    /// Returns `true` if the client may use the given grant type.
    #[must_use]
    pub fn is_grant_type_allowed(&self, grant_type: &GrantType) -> bool {
        self.grant_types.contains(grant_type)
    }

    /// Returns `true` if the redirect URI is registered (exact match).
    #[must_use]
    pub fn is_redirect_uri_registered(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|u| u == uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_type_round_trip() {
        let g: GrantType = "authorization_code".to_string().into();
        assert_eq!(g, GrantType::AuthorizationCode);
        assert_eq!(g.as_str(), "authorization_code");

        let g: GrantType = "urn:custom:delegation".to_string().into();
        assert_eq!(g, GrantType::Extension("urn:custom:delegation".into()));
        assert_eq!(g.as_str(), "urn:custom:delegation");
    }

    #[test]
    fn test_grant_type_serde() {
        let json = serde_json::to_string(&GrantType::ClientCredentials).unwrap();
        assert_eq!(json, "\"client_credentials\"");
        let g: GrantType = serde_json::from_str("\"urn:custom:x\"").unwrap();
        assert_eq!(g, GrantType::Extension("urn:custom:x".into()));
    }

    #[test]
    fn test_client_defaults() {
        let client = Client::new("app");
        assert!(client.enabled);
        assert_eq!(client.access_token_type, AccessTokenType::Jwt);
        assert_eq!(client.refresh_token_usage, RefreshTokenUsage::OneTimeOnly);
        assert!(client.is_grant_type_allowed(&GrantType::AuthorizationCode));
        assert!(!client.is_grant_type_allowed(&GrantType::ClientCredentials));
    }

    #[test]
    fn test_redirect_uri_exact_match() {
        let mut client = Client::new("app");
        client.redirect_uris = vec!["https://app.example.com/cb".to_string()];
        assert!(client.is_redirect_uri_registered("https://app.example.com/cb"));
        assert!(!client.is_redirect_uri_registered("https://app.example.com/cb/"));
    }
}
