//! Token endpoint response generation.
//!
//! Consumes a [`ValidatedTokenRequest`] and produces the wire-level token
//! response: access token, optional refresh token, optional identity token.

use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;

use crate::error::AuthError;
use crate::token::refresh::RefreshTokenService;
use crate::token::service::TokenService;
use crate::types::scope::OFFLINE_ACCESS;
use crate::types::{GrantType, TokenCreationRequest};
use crate::validation::token_request::ValidatedTokenRequest;
use crate::AuthResult;

/// The JSON body returned from the token endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    /// The access token, as a JWT or reference handle.
    pub access_token: String,

    /// Always `Bearer`.
    pub token_type: &'static str,

    /// Access token lifetime in seconds.
    pub expires_in: i64,

    /// Refresh token handle, when `offline_access` was granted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Identity token, for OpenID Connect requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    /// Space-separated granted scope names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Builds token responses from validated requests.
pub struct TokenResponseGenerator {
    tokens: Arc<TokenService>,
    refresh_tokens: Arc<RefreshTokenService>,
}

impl TokenResponseGenerator {
    /// Creates a generator over the given services.
    #[must_use]
    pub fn new(tokens: Arc<TokenService>, refresh_tokens: Arc<RefreshTokenService>) -> Self {
        Self {
            tokens,
            refresh_tokens,
        }
    }

    /// Generates the response for a validated token request.
    ///
    /// # Errors
    ///
    /// Propagates token creation, signing, and storage failures.
    pub async fn generate(&self, validated: ValidatedTokenRequest) -> AuthResult<TokenResponse> {
        match validated.grant_type {
            GrantType::RefreshToken => self.generate_for_refresh(validated).await,
            _ => self.generate_for_new_grant(validated).await,
        }
    }

    async fn generate_for_new_grant(
        &self,
        validated: ValidatedTokenRequest,
    ) -> AuthResult<TokenResponse> {
        let client = validated.client.clone();
        let mut request = TokenCreationRequest::new(client.clone(), validated.scopes.clone());
        request.subject = validated.subject.clone();

        if let Some(code) = &validated.authorization_code {
            request.nonce = code.nonce.clone();
            request.session_id = code.session_id.clone();
        }

        let access_token = self.tokens.create_access_token(&request).await?;
        let expires_in = access_token.lifetime;

        let offline = validated.scopes.iter().any(|s| s.name == OFFLINE_ACCESS);
        let refresh_token = match (&validated.subject, offline) {
            (Some(subject), true) => Some(
                self.refresh_tokens
                    .create(subject.sub.clone(), access_token.clone(), &client)
                    .await?,
            ),
            _ => None,
        };

        let access_token_value = self
            .tokens
            .create_security_token(access_token, &client)
            .await?;

        // Identity token only for OpenID code redemptions.
        let id_token = match &validated.authorization_code {
            Some(code) if code.is_open_id => {
                request.access_token_to_hash = Some(access_token_value.clone());
                let identity_token = self.tokens.create_identity_token(&request).await?;
                Some(
                    self.tokens
                        .create_security_token(identity_token, &client)
                        .await?,
                )
            }
            _ => None,
        };

        Ok(TokenResponse {
            access_token: access_token_value,
            token_type: "Bearer",
            expires_in,
            refresh_token,
            id_token,
            scope: Some(scope_names(&validated)),
        })
    }

    /// Re-issues the stored access token with a fresh creation time and
    /// applies the refresh token rotation policy.
    async fn generate_for_refresh(
        &self,
        validated: ValidatedTokenRequest,
    ) -> AuthResult<TokenResponse> {
        let client = validated.client.clone();
        let (handle, refresh_token) = validated
            .refresh_token
            .clone()
            .ok_or_else(|| AuthError::internal("refresh grant without a refresh token"))?;

        let mut access_token = refresh_token.access_token.clone();
        access_token.created_at = OffsetDateTime::now_utc();
        access_token.lifetime = client.access_token_lifetime;
        let expires_in = access_token.lifetime;

        let access_token_value = self
            .tokens
            .create_security_token(access_token, &client)
            .await?;
        let new_handle = self
            .refresh_tokens
            .update(&handle, refresh_token, &client)
            .await?;

        Ok(TokenResponse {
            access_token: access_token_value,
            token_type: "Bearer",
            expires_in,
            refresh_token: Some(new_handle),
            id_token: None,
            scope: Some(scope_names(&validated)),
        })
    }
}

fn scope_names(validated: &ValidatedTokenRequest) -> String {
    validated
        .scopes
        .iter()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
