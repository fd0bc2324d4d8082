//! Claims assembly for outgoing tokens.
//!
//! The [`ClaimsProvider`] decides which user and client claims land in a
//! token, driven by the scopes granted to the request. Replace the default
//! implementation to customize claim sourcing.

use std::sync::Arc;

use async_trait::async_trait;

use crate::storage::UserService;
use crate::types::claims::claim_types;
use crate::types::{Claim, Client, Scope, ScopeType, Subject};
use crate::AuthResult;

/// Sources the claims for identity and access tokens.
#[async_trait]
pub trait ClaimsProvider: Send + Sync {
    /// Claims for an identity token issued to `subject` via `client`.
    ///
    /// # Errors
    ///
    /// Propagates user service failures.
    async fn claims_for_identity_token(
        &self,
        subject: &Subject,
        client: &Client,
        scopes: &[Scope],
        include_all_claims: bool,
    ) -> AuthResult<Vec<Claim>>;

    /// Claims for an access token. `subject` is absent for machine-to-machine
    /// grants.
    ///
    /// # Errors
    ///
    /// Propagates user service failures.
    async fn claims_for_access_token(
        &self,
        subject: Option<&Subject>,
        client: &Client,
        scopes: &[Scope],
    ) -> AuthResult<Vec<Claim>>;
}

/// Default provider backed by a [`UserService`].
pub struct DefaultClaimsProvider {
    users: Arc<dyn UserService>,
}

impl DefaultClaimsProvider {
    /// Creates a provider over the given user service.
    #[must_use]
    pub fn new(users: Arc<dyn UserService>) -> Self {
        Self { users }
    }

    fn subject_base_claims(subject: &Subject) -> Vec<Claim> {
        let mut claims = vec![Claim::string(claim_types::SUBJECT, &subject.sub)];
        if let Some(auth_time) = subject.auth_time {
            claims.push(Claim::integer(claim_types::AUTH_TIME, auth_time));
        }
        if let Some(idp) = &subject.identity_provider {
            claims.push(Claim::string(claim_types::IDENTITY_PROVIDER, idp));
        }
        claims
    }

    /// Fetches user claims filtered by the claim names the scopes declare,
    /// or all claims when a scope asks for everything.
    async fn user_claims_for_scopes(
        &self,
        subject: &Subject,
        scopes: &[Scope],
        include_all: bool,
    ) -> AuthResult<Vec<Claim>> {
        let include_all = include_all || scopes.iter().any(|s| s.include_all_claims_for_user);
        if include_all {
            return self.users.claims_for_subject(subject, None).await;
        }

        let mut requested: Vec<String> = scopes
            .iter()
            .flat_map(|s| s.claims.iter().map(|c| c.name.clone()))
            .collect();
        requested.sort();
        requested.dedup();
        if requested.is_empty() {
            return Ok(Vec::new());
        }
        self.users.claims_for_subject(subject, Some(&requested)).await
    }
}

#[async_trait]
impl ClaimsProvider for DefaultClaimsProvider {
    async fn claims_for_identity_token(
        &self,
        subject: &Subject,
        _client: &Client,
        scopes: &[Scope],
        include_all_claims: bool,
    ) -> AuthResult<Vec<Claim>> {
        let mut claims = Self::subject_base_claims(subject);

        let identity_scopes: Vec<Scope> = scopes
            .iter()
            .filter(|s| s.scope_type == ScopeType::Identity)
            .cloned()
            .collect();
        claims.extend(
            self.user_claims_for_scopes(subject, &identity_scopes, include_all_claims)
                .await?,
        );
        Ok(claims)
    }

    async fn claims_for_access_token(
        &self,
        subject: Option<&Subject>,
        client: &Client,
        scopes: &[Scope],
    ) -> AuthResult<Vec<Claim>> {
        let mut claims = vec![Claim::string(claim_types::CLIENT_ID, &client.client_id)];
        for scope in scopes {
            claims.push(Claim::string(claim_types::SCOPE, &scope.name));
        }

        if let Some(subject) = subject {
            claims.extend(Self::subject_base_claims(subject));

            let resource_scopes: Vec<Scope> = scopes
                .iter()
                .filter(|s| s.scope_type == ScopeType::Resource)
                .cloned()
                .collect();
            claims.extend(
                self.user_claims_for_scopes(subject, &resource_scopes, false)
                    .await?,
            );
        }
        Ok(claims)
    }
}
