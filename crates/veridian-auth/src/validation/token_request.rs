//! Token request validation.
//!
//! Runs after client authentication. Each grant type has its own branch;
//! all of them end in a [`ValidatedTokenRequest`] that the response
//! generator consumes. Authorization codes are consumed here, so a retried
//! code fails with `invalid_grant`.

use std::sync::Arc;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::events::{Event, EventSink};
use crate::oauth::pkce;
use crate::request::RequestContext;
use crate::scopes::{parse_scopes_string, ScopeValidator};
use crate::storage::{AuthorizationCodeStore, RefreshTokenStore, ScopeStore, UserService};
use crate::types::scope::OFFLINE_ACCESS;
use crate::types::{AuthorizationCode, Client, GrantType, RefreshToken, Scope, Subject};
use crate::validation::custom_grant::CustomGrantRegistry;
use crate::AuthResult;

/// Raw parameters of a token endpoint request.
#[derive(Debug, Clone, Default)]
pub struct TokenRequest {
    /// `grant_type` parameter.
    pub grant_type: Option<String>,
    /// `code` parameter (authorization code grant).
    pub code: Option<String>,
    /// `redirect_uri` parameter (authorization code grant).
    pub redirect_uri: Option<String>,
    /// `code_verifier` parameter (PKCE).
    pub code_verifier: Option<String>,
    /// `refresh_token` parameter (refresh grant).
    pub refresh_token: Option<String>,
    /// `scope` parameter.
    pub scope: Option<String>,
    /// `username` parameter (password grant).
    pub username: Option<String>,
    /// `password` parameter (password grant).
    pub password: Option<String>,
}

impl TokenRequest {
    /// Extracts the known parameters from the request form body.
    #[must_use]
    pub fn from_context(context: &RequestContext) -> Self {
        let value = |name: &str| context.form_value(name).map(str::to_string);
        Self {
            grant_type: value("grant_type"),
            code: value("code"),
            redirect_uri: value("redirect_uri"),
            code_verifier: value("code_verifier"),
            refresh_token: value("refresh_token"),
            scope: value("scope"),
            username: value("username"),
            password: value("password"),
        }
    }
}

/// A token request that passed validation, ready for token issuance.
#[derive(Debug, Clone)]
pub struct ValidatedTokenRequest {
    /// The authenticated client.
    pub client: Client,
    /// The validated grant type.
    pub grant_type: GrantType,
    /// Scopes granted to this request.
    pub scopes: Vec<Scope>,
    /// Authenticated end user, absent for machine grants.
    pub subject: Option<Subject>,
    /// The redeemed code, for the authorization code grant.
    pub authorization_code: Option<AuthorizationCode>,
    /// The presented handle and token, for the refresh grant.
    pub refresh_token: Option<(String, RefreshToken)>,
}

/// Validates token endpoint requests for an authenticated client.
pub struct TokenRequestValidator {
    codes: Arc<dyn AuthorizationCodeStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    scopes: Arc<dyn ScopeStore>,
    users: Arc<dyn UserService>,
    custom_grants: CustomGrantRegistry,
    events: Arc<dyn EventSink>,
    config: Arc<AuthConfig>,
}

impl TokenRequestValidator {
    /// Creates a validator over the given collaborators.
    #[must_use]
    pub fn new(
        codes: Arc<dyn AuthorizationCodeStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        scopes: Arc<dyn ScopeStore>,
        users: Arc<dyn UserService>,
        custom_grants: CustomGrantRegistry,
        events: Arc<dyn EventSink>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            codes,
            refresh_tokens,
            scopes,
            users,
            custom_grants,
            events,
            config,
        }
    }

    /// Validates a token request for the already-authenticated client.
    ///
    /// # Errors
    ///
    /// Returns the protocol error matching the failure: `invalid_request`
    /// for missing parameters, `unauthorized_client` for disallowed grant
    /// types, `invalid_grant` for bad grant material, `invalid_scope` for
    /// scope violations.
    pub async fn validate(
        &self,
        context: &RequestContext,
        client: &Client,
    ) -> AuthResult<ValidatedTokenRequest> {
        let request = TokenRequest::from_context(context);

        let Some(grant_type_raw) = request.grant_type.clone() else {
            return Err(AuthError::invalid_request("grant_type is missing"));
        };
        let grant_type = GrantType::from(grant_type_raw.clone());

        if !client.is_grant_type_allowed(&grant_type) {
            tracing::warn!(client_id = %client.client_id, grant_type = %grant_type_raw, "grant type not allowed for client");
            return Err(AuthError::unauthorized("grant type not allowed for client"));
        }

        match &grant_type {
            GrantType::AuthorizationCode => {
                self.validate_authorization_code_grant(&request, client, grant_type).await
            }
            GrantType::RefreshToken => {
                self.validate_refresh_token_grant(&request, client, grant_type).await
            }
            GrantType::ClientCredentials => {
                self.validate_client_credentials_grant(&request, client, grant_type).await
            }
            GrantType::Password => {
                self.validate_password_grant(&request, client, grant_type).await
            }
            GrantType::Extension(name) => {
                self.validate_extension_grant(context, &request, client, name.clone()).await
            }
            GrantType::Implicit | GrantType::Hybrid => {
                Err(AuthError::unsupported_grant_type(grant_type_raw))
            }
        }
    }

    async fn validate_authorization_code_grant(
        &self,
        request: &TokenRequest,
        client: &Client,
        grant_type: GrantType,
    ) -> AuthResult<ValidatedTokenRequest> {
        let Some(handle) = &request.code else {
            return Err(AuthError::invalid_grant("authorization code is missing"));
        };

        let Some(code) = self.codes.get(handle).await? else {
            tracing::warn!(client_id = %client.client_id, "unknown or already redeemed authorization code");
            return Err(AuthError::invalid_grant("invalid authorization code"));
        };

        if code.client_id != client.client_id {
            tracing::warn!(
                client_id = %client.client_id,
                code_client = %code.client_id,
                "authorization code was issued to another client"
            );
            return Err(AuthError::invalid_grant("invalid authorization code"));
        }
        if code.is_expired(client.authorization_code_lifetime) {
            self.codes.remove(handle).await?;
            return Err(AuthError::invalid_grant("authorization code has expired"));
        }

        let Some(redirect_uri) = &request.redirect_uri else {
            return Err(AuthError::invalid_grant("redirect_uri is missing"));
        };
        // Exact byte comparison against the URI the code was bound to.
        if redirect_uri != &code.redirect_uri {
            tracing::warn!(client_id = %client.client_id, "redirect_uri does not match authorization request");
            return Err(AuthError::invalid_grant("invalid redirect_uri"));
        }

        self.verify_proof_key(request, client, &code)?;

        // Consume; a concurrent retry of the same code loses from here on.
        self.codes.remove(handle).await?;
        self.events
            .raise(Event::AuthorizationCodeRedeemed {
                client_id: client.client_id.clone(),
            })
            .await;

        let scopes = self.resolve_scopes(&code.granted_scopes).await?;
        Ok(ValidatedTokenRequest {
            client: client.clone(),
            grant_type,
            scopes,
            subject: Some(code.subject.clone()),
            authorization_code: Some(code),
            refresh_token: None,
        })
    }

    fn verify_proof_key(
        &self,
        request: &TokenRequest,
        client: &Client,
        code: &AuthorizationCode,
    ) -> AuthResult<()> {
        let challenge = match (&code.code_challenge, client.require_pkce) {
            (Some(challenge), _) => challenge,
            (None, false) => return Ok(()),
            (None, true) => {
                tracing::warn!(client_id = %client.client_id, "client requires PKCE but code carries no challenge");
                return Err(AuthError::PkceVerificationFailed);
            }
        };

        let Some(verifier) = &request.code_verifier else {
            tracing::warn!(client_id = %client.client_id, "code_verifier is missing");
            return Err(AuthError::PkceVerificationFailed);
        };
        let method = code.code_challenge_method.unwrap_or_default();
        if let Err(e) = pkce::verify_challenge(challenge, method, verifier) {
            tracing::warn!(client_id = %client.client_id, error = %e, "PKCE verification failed");
            return Err(AuthError::PkceVerificationFailed);
        }
        Ok(())
    }

    async fn validate_refresh_token_grant(
        &self,
        request: &TokenRequest,
        client: &Client,
        grant_type: GrantType,
    ) -> AuthResult<ValidatedTokenRequest> {
        let Some(handle) = &request.refresh_token else {
            return Err(AuthError::invalid_grant("refresh_token is missing"));
        };

        let Some(token) = self.refresh_tokens.get(handle).await? else {
            tracing::warn!(client_id = %client.client_id, "unknown refresh token");
            return Err(AuthError::invalid_grant("invalid refresh token"));
        };
        if token.is_expired() {
            self.refresh_tokens.remove(handle).await?;
            return Err(AuthError::invalid_grant("refresh token has expired"));
        }
        if token.client_id() != client.client_id {
            tracing::warn!(client_id = %client.client_id, "refresh token belongs to another client");
            return Err(AuthError::invalid_grant("invalid refresh token"));
        }

        if !self.users.is_active(&token.subject_id).await? {
            tracing::warn!(subject = %token.subject_id, "refresh token subject is no longer active");
            return Err(AuthError::invalid_grant("invalid refresh token"));
        }

        let scope_names: Vec<String> = token
            .scopes()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let scopes = self.resolve_scopes(&scope_names).await?;
        let subject = Subject::new(token.subject_id.clone());

        Ok(ValidatedTokenRequest {
            client: client.clone(),
            grant_type,
            scopes,
            subject: Some(subject),
            authorization_code: None,
            refresh_token: Some((handle.clone(), token)),
        })
    }

    async fn validate_client_credentials_grant(
        &self,
        request: &TokenRequest,
        client: &Client,
        grant_type: GrantType,
    ) -> AuthResult<ValidatedTokenRequest> {
        let scopes = self.validate_requested_scopes(request, client).await?;

        // Machine grants get resource scopes only.
        if scopes.iter().any(|s| s.name == OFFLINE_ACCESS) {
            return Err(AuthError::invalid_scope(
                "offline_access is not allowed for client_credentials",
            ));
        }
        if scopes
            .iter()
            .any(|s| s.scope_type == crate::types::ScopeType::Identity)
        {
            return Err(AuthError::invalid_scope(
                "identity scopes are not allowed for client_credentials",
            ));
        }

        Ok(ValidatedTokenRequest {
            client: client.clone(),
            grant_type,
            scopes,
            subject: None,
            authorization_code: None,
            refresh_token: None,
        })
    }

    async fn validate_password_grant(
        &self,
        request: &TokenRequest,
        client: &Client,
        grant_type: GrantType,
    ) -> AuthResult<ValidatedTokenRequest> {
        let scopes = self.validate_requested_scopes(request, client).await?;

        let (Some(username), Some(password)) = (&request.username, &request.password) else {
            return Err(AuthError::invalid_grant("username or password is missing"));
        };
        let Some(subject) = self.users.authenticate_local(username, password).await? else {
            tracing::warn!(client_id = %client.client_id, "resource owner authentication failed");
            return Err(AuthError::invalid_grant("invalid username or password"));
        };

        Ok(ValidatedTokenRequest {
            client: client.clone(),
            grant_type,
            scopes,
            subject: Some(subject),
            authorization_code: None,
            refresh_token: None,
        })
    }

    async fn validate_extension_grant(
        &self,
        context: &RequestContext,
        request: &TokenRequest,
        client: &Client,
        name: String,
    ) -> AuthResult<ValidatedTokenRequest> {
        let Some(validator) = self.custom_grants.get(&name) else {
            return Err(AuthError::unsupported_grant_type(name));
        };

        let scopes = self.validate_requested_scopes(request, client).await?;

        // Custom grant failures collapse to a generic message; the detail
        // stays in the log.
        let result = match validator.validate(context, client).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(grant_type = %name, error = %e, "custom grant validation failed");
                return Err(AuthError::invalid_grant("Grant validation error"));
            }
        };

        Ok(ValidatedTokenRequest {
            client: client.clone(),
            grant_type: GrantType::Extension(name),
            scopes,
            subject: result.subject,
            authorization_code: None,
            refresh_token: None,
        })
    }

    /// Parses and validates the `scope` parameter against the store and the
    /// client's allow-list.
    async fn validate_requested_scopes(
        &self,
        request: &TokenRequest,
        client: &Client,
    ) -> AuthResult<Vec<Scope>> {
        let raw = request.scope.as_deref().unwrap_or_default();
        if raw.len() > self.config.input_lengths.scope {
            return Err(AuthError::invalid_scope("scope parameter is too long"));
        }
        let Some(names) = parse_scopes_string(raw) else {
            return Err(AuthError::invalid_scope("scope is missing"));
        };

        let mut validator = ScopeValidator::new(self.scopes.clone());
        if !validator.are_scopes_valid(&names).await? {
            return Err(AuthError::invalid_scope("invalid scope"));
        }
        if !validator.are_scopes_allowed(client, &names) {
            return Err(AuthError::invalid_scope("scope not allowed for client"));
        }
        Ok(validator.requested_scopes().to_vec())
    }

    /// Resolves previously granted scope names for reissuance. A scope that
    /// has since been removed or disabled invalidates the grant rather than
    /// silently narrowing the reissued token.
    async fn resolve_scopes(&self, names: &[String]) -> AuthResult<Vec<Scope>> {
        let scopes = self.scopes.find_scopes_by_name(names).await?;
        for name in names {
            match scopes.iter().find(|s| &s.name == name) {
                Some(scope) if scope.enabled => {}
                _ => {
                    tracing::warn!(scope = %name, "granted scope no longer available");
                    return Err(AuthError::invalid_scope("invalid scope"));
                }
            }
        }
        Ok(scopes)
    }
}
