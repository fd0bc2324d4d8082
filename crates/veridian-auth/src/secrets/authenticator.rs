//! Client and scope authentication.
//!
//! An authenticator ties the parser chain and validator chain together with
//! a store lookup. Every call raises exactly one success or failure event,
//! and failures surface as a uniform [`AuthError::InvalidClient`] so callers
//! cannot tell which part of the credential was wrong.

use std::sync::Arc;

use crate::error::AuthError;
use crate::events::{Event, EventSink};
use crate::request::RequestContext;
use crate::secrets::parsing::SecretParserChain;
use crate::secrets::validation::SecretValidatorChain;
use crate::storage::{ClientStore, ScopeStore};
use crate::types::{Client, Scope};
use crate::AuthResult;

/// Authenticates an OAuth client from an inbound request.
pub struct ClientSecretAuthenticator {
    clients: Arc<dyn ClientStore>,
    parsers: SecretParserChain,
    validators: SecretValidatorChain,
    events: Arc<dyn EventSink>,
}

impl ClientSecretAuthenticator {
    /// Creates an authenticator over the given store and chains.
    #[must_use]
    pub fn new(
        clients: Arc<dyn ClientStore>,
        parsers: SecretParserChain,
        validators: SecretValidatorChain,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            clients,
            parsers,
            validators,
            events,
        }
    }

    /// Authenticates the request's client credential.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidClient`] with a uniform message for any
    /// credential problem, so callers never leak which check failed.
    pub async fn authenticate(&self, context: &RequestContext) -> AuthResult<Client> {
        match self.try_authenticate(context).await {
            Ok(client) => {
                self.events
                    .raise(Event::ClientAuthenticationSuccess {
                        client_id: client.client_id.clone(),
                    })
                    .await;
                Ok(client)
            }
            Err(failure) => {
                tracing::warn!(client_id = %failure.client_id, reason = %failure.reason, "client authentication failed");
                self.events
                    .raise(Event::ClientAuthenticationFailure {
                        client_id: failure.client_id,
                        message: failure.reason,
                    })
                    .await;
                Err(AuthError::invalid_client("invalid client credentials"))
            }
        }
    }

    async fn try_authenticate(&self, context: &RequestContext) -> Result<Client, Failure> {
        let parsed = self
            .parsers
            .parse(context)
            .await
            .map_err(|e| Failure::unknown(format!("parsing error: {e}")))?
            .ok_or_else(|| Failure::unknown("no client credential found"))?;

        let client = self
            .clients
            .find_client_by_id(&parsed.id)
            .await
            .map_err(|e| Failure::new(&parsed.id, format!("store error: {e}")))?
            .ok_or_else(|| Failure::new(&parsed.id, "unknown client"))?;

        if !client.enabled {
            return Err(Failure::new(&parsed.id, "client is disabled"));
        }

        let valid = self
            .validators
            .validate(&client.client_secrets, &parsed)
            .await
            .map_err(|e| Failure::new(&parsed.id, format!("validation error: {e}")))?;
        if !valid {
            return Err(Failure::new(&parsed.id, "secret validation failed"));
        }
        Ok(client)
    }
}

/// Authenticates a scope (API resource) from an inbound request, e.g. for
/// token introspection.
pub struct ScopeSecretAuthenticator {
    scopes: Arc<dyn ScopeStore>,
    parsers: SecretParserChain,
    validators: SecretValidatorChain,
    events: Arc<dyn EventSink>,
}

impl ScopeSecretAuthenticator {
    /// Creates an authenticator over the given store and chains.
    #[must_use]
    pub fn new(
        scopes: Arc<dyn ScopeStore>,
        parsers: SecretParserChain,
        validators: SecretValidatorChain,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            scopes,
            parsers,
            validators,
            events,
        }
    }

    /// Authenticates the request's scope credential.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidClient`] with a uniform message for any
    /// credential problem.
    pub async fn authenticate(&self, context: &RequestContext) -> AuthResult<Scope> {
        match self.try_authenticate(context).await {
            Ok(scope) => {
                self.events
                    .raise(Event::ScopeAuthenticationSuccess {
                        scope: scope.name.clone(),
                    })
                    .await;
                Ok(scope)
            }
            Err(failure) => {
                tracing::warn!(scope = %failure.client_id, reason = %failure.reason, "scope authentication failed");
                self.events
                    .raise(Event::ScopeAuthenticationFailure {
                        scope: failure.client_id,
                        message: failure.reason,
                    })
                    .await;
                Err(AuthError::invalid_client("invalid scope credentials"))
            }
        }
    }

    async fn try_authenticate(&self, context: &RequestContext) -> Result<Scope, Failure> {
        let parsed = self
            .parsers
            .parse(context)
            .await
            .map_err(|e| Failure::unknown(format!("parsing error: {e}")))?
            .ok_or_else(|| Failure::unknown("no scope credential found"))?;

        let scopes = self
            .scopes
            .find_scopes_by_name(&[parsed.id.clone()])
            .await
            .map_err(|e| Failure::new(&parsed.id, format!("store error: {e}")))?;
        let scope = scopes
            .into_iter()
            .next()
            .ok_or_else(|| Failure::new(&parsed.id, "unknown scope"))?;

        if !scope.enabled {
            return Err(Failure::new(&parsed.id, "scope is disabled"));
        }

        let valid = self
            .validators
            .validate(&scope.scope_secrets, &parsed)
            .await
            .map_err(|e| Failure::new(&parsed.id, format!("validation error: {e}")))?;
        if !valid {
            return Err(Failure::new(&parsed.id, "secret validation failed"));
        }
        Ok(scope)
    }
}

struct Failure {
    client_id: String,
    reason: String,
}

impl Failure {
    fn new(id: &str, reason: impl Into<String>) -> Self {
        Self {
            client_id: id.to_string(),
            reason: reason.into(),
        }
    }

    fn unknown(reason: impl Into<String>) -> Self {
        Self {
            client_id: "unknown".to_string(),
            reason: reason.into(),
        }
    }
}
