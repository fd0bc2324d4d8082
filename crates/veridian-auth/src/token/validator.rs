//! Access and identity token validation.
//!
//! JWT tokens (anything containing a `.`) are verified against the signing
//! keys; opaque strings are resolved through the reference token store.
//! Both paths end with a liveness re-check of the subject and client.

use std::sync::Arc;

use jsonwebtoken::{decode, Validation};
use serde_json::{Map, Value};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::storage::TokenHandleStore;
use crate::token::signing::SigningKeyService;
use crate::types::claims::claim_types;
use crate::types::Claim;
use crate::validation::liveness::TokenLivenessValidator;
use crate::AuthResult;

/// The claim set of a successfully validated token.
#[derive(Debug, Clone)]
pub struct ValidatedToken {
    /// All claims carried by the token.
    pub claims: Vec<Claim>,
}

impl ValidatedToken {
    /// The `sub` claim, if present.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.claim_value(claim_types::SUBJECT)
    }

    /// The `client_id` claim, if present.
    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        self.claim_value(claim_types::CLIENT_ID)
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

    fn claim_value(&self, claim_type: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|c| c.claim_type == claim_type)
            .and_then(|c| c.value.as_str())
    }
}

/// Validates issued tokens, both self-contained and reference.
pub struct TokenValidator {
    keys: Arc<dyn SigningKeyService>,
    handles: Arc<dyn TokenHandleStore>,
    liveness: TokenLivenessValidator,
    config: Arc<AuthConfig>,
}

impl TokenValidator {
    /// Creates a validator over the given collaborators.
    #[must_use]
    pub fn new(
        keys: Arc<dyn SigningKeyService>,
        handles: Arc<dyn TokenHandleStore>,
        liveness: TokenLivenessValidator,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            keys,
            handles,
            liveness,
            config,
        }
    }

    /// Validates an access token string.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::TokenExpired`] for expired tokens and
    /// [`AuthError::InvalidToken`] for everything else that fails.
    pub async fn validate_access_token(&self, token: &str) -> AuthResult<ValidatedToken> {
        let validated = if token.contains('.') {
            self.validate_jwt(token, &self.config.access_token_audience())?
        } else {
            self.validate_reference_token(token).await?
        };

        self.liveness
            .check(validated.subject(), validated.client_id())
            .await?;
        Ok(validated)
    }

    /// Validates an identity token issued to the given client.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] when the token is not a valid JWT
    /// for this client.
    pub async fn validate_identity_token(
        &self,
        token: &str,
        client_id: &str,
    ) -> AuthResult<ValidatedToken> {
        if !token.contains('.') {
            return Err(AuthError::invalid_token("identity token is not a JWT"));
        }
        let validated = self.validate_jwt(token, client_id)?;
        self.liveness.check(validated.subject(), None).await?;
        Ok(validated)
    }

    fn validate_jwt(&self, token: &str, audience: &str) -> AuthResult<ValidatedToken> {
        let mut expired = false;
        for key in self.keys.validation_keys()? {
            let mut validation = Validation::new(key.algorithm);
            validation.set_issuer(&[&self.config.issuer]);
            validation.set_audience(&[audience]);

            match decode::<Map<String, Value>>(token, &key.decoding, &validation) {
                Ok(data) => {
                    return Ok(ValidatedToken {
                        claims: claims_from_payload(data.claims),
                    });
                }
                Err(e) => {
                    if matches!(
                        e.kind(),
                        jsonwebtoken::errors::ErrorKind::ExpiredSignature
                    ) {
                        expired = true;
                    }
                    tracing::debug!(kid = %key.kid, error = %e, "token rejected by key");
                }
            }
        }
        if expired {
            return Err(AuthError::TokenExpired);
        }
        Err(AuthError::invalid_token("signature validation failed"))
    }

    async fn validate_reference_token(&self, handle: &str) -> AuthResult<ValidatedToken> {
        let Some(token) = self.handles.get(handle).await? else {
            return Err(AuthError::invalid_token("unknown reference token"));
        };
        if token.is_expired() {
            // Expired reference tokens are reaped on sight.
            self.handles.remove(handle).await?;
            return Err(AuthError::TokenExpired);
        }
        Ok(ValidatedToken {
            claims: token.claims,
        })
    }
}

/// Flattens a decoded JWT payload into the claim list, expanding arrays
/// into one claim per element.
fn claims_from_payload(payload: Map<String, Value>) -> Vec<Claim> {
    let mut claims = Vec::with_capacity(payload.len());
    for (claim_type, value) in payload {
        match value {
            Value::Array(values) => {
                for v in values {
                    claims.push(claim_from_value(&claim_type, v));
                }
            }
            other => claims.push(claim_from_value(&claim_type, other)),
        }
    }
    claims
}

fn claim_from_value(claim_type: &str, value: Value) -> Claim {
    match value {
        Value::String(s) => Claim::string(claim_type, s),
        Value::Number(n) if n.is_i64() => {
            Claim::integer(claim_type, n.as_i64().unwrap_or_default())
        }
        Value::Bool(b) => Claim::boolean(claim_type, b),
        other => Claim::json(claim_type, other),
    }
}
