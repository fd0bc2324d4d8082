//! Authorization code artifact.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::oauth::pkce::PkceChallengeMethod;
use crate::types::claims::Subject;

/// A one-time artifact minted at `/authorize` success and redeemed exactly
/// once at the token endpoint.
///
/// Reuse of a consumed code must fail; the store provides at-most-once
/// consumption, the core issues the get/remove calls in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationCode {
    /// Client the code was issued to.
    pub client_id: String,

    /// Authenticated end user.
    pub subject: Subject,

    /// When the code was minted.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// Whether the request carried identity scopes.
    pub is_open_id: bool,

    /// Scope names as requested.
    pub requested_scopes: Vec<String>,

    /// Scope names actually granted (post consent).
    pub granted_scopes: Vec<String>,

    /// Redirect URI the code was bound to (must match at redemption).
    pub redirect_uri: String,

    /// Nonce from the authorization request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// Session identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// PKCE code challenge, when the client supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge: Option<String>,

    /// PKCE challenge method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge_method: Option<PkceChallengeMethod>,
}

impl AuthorizationCode {
    /// Returns `true` if the code is older than `lifetime_seconds`.
    #[must_use]
    pub fn is_expired(&self, lifetime_seconds: i64) -> bool {
        OffsetDateTime::now_utc() > self.created_at + time::Duration::seconds(lifetime_seconds)
    }
}
