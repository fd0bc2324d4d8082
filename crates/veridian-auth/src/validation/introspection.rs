//! Token introspection (RFC 7662).
//!
//! Callers are scopes (API resources) authenticated via
//! [`crate::secrets::ScopeSecretAuthenticator`]. Any validation failure,
//! including a token that does not carry the caller's scope, degrades to
//! `active: false` rather than an error.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::AuthError;
use crate::request::RequestContext;
use crate::token::validator::TokenValidator;
use crate::types::Scope;
use crate::AuthResult;

/// RFC 7662 introspection response.
#[derive(Debug, Clone, Serialize)]
pub struct IntrospectionResponse {
    /// Whether the token is live and visible to the caller.
    pub active: bool,

    /// The token's claims, present only for active tokens.
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}

impl IntrospectionResponse {
    fn inactive() -> Self {
        Self {
            active: false,
            claims: Map::new(),
        }
    }
}

/// Validates introspection requests on behalf of an authenticated scope.
pub struct IntrospectionRequestValidator {
    tokens: Arc<TokenValidator>,
}

impl IntrospectionRequestValidator {
    /// Creates a validator over the given token validator.
    #[must_use]
    pub fn new(tokens: Arc<TokenValidator>) -> Self {
        Self { tokens }
    }

    /// Introspects the `token` parameter for the calling scope.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidRequest`] only when the `token` parameter
    /// is missing; invalid tokens yield an inactive response.
    pub async fn validate(
        &self,
        context: &RequestContext,
        caller: &Scope,
    ) -> AuthResult<IntrospectionResponse> {
        let Some(token) = context.form_value("token") else {
            return Err(AuthError::invalid_request("token parameter is missing"));
        };

        let validated = match self.tokens.validate_access_token(token).await {
            Ok(validated) => validated,
            Err(e) => {
                tracing::debug!(scope = %caller.name, error = %e, "introspected token is invalid");
                return Ok(IntrospectionResponse::inactive());
            }
        };

        // A scope may only see tokens issued for it.
        if !validated.scopes().iter().any(|s| *s == caller.name) {
            tracing::warn!(scope = %caller.name, "introspected token was not issued for caller");
            return Ok(IntrospectionResponse::inactive());
        }

        let mut claims = Map::new();
        for claim in &validated.claims {
            let value = claim.value.to_json();
            match claims.get_mut(&claim.claim_type) {
                None => {
                    claims.insert(claim.claim_type.clone(), value);
                }
                Some(Value::Array(existing)) => existing.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
            }
        }

        Ok(IntrospectionResponse {
            active: true,
            claims,
        })
    }
}
