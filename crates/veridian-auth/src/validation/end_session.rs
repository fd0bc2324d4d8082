//! End session request validation.
//!
//! Validates the `id_token_hint` and pins `post_logout_redirect_uri` to the
//! URIs registered on the client the hint was issued to. Without a valid
//! hint no redirect URI is honored.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::error::AuthError;
use crate::request::RequestContext;
use crate::storage::ClientStore;
use crate::token::validator::TokenValidator;
use crate::AuthResult;

/// A validated end session request.
#[derive(Debug, Clone, Default)]
pub struct ValidatedEndSessionRequest {
    /// Client the identity token hint was issued to.
    pub client_id: Option<String>,

    /// Subject named by the hint.
    pub subject: Option<String>,

    /// Where the user agent may be sent after sign-out.
    pub post_logout_redirect_uri: Option<String>,
}

/// Validates end session requests.
pub struct EndSessionRequestValidator {
    tokens: Arc<TokenValidator>,
    clients: Arc<dyn ClientStore>,
}

impl EndSessionRequestValidator {
    /// Creates a validator over the given collaborators.
    #[must_use]
    pub fn new(tokens: Arc<TokenValidator>, clients: Arc<dyn ClientStore>) -> Self {
        Self { tokens, clients }
    }

    /// Validates the request parameters.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] for a bad hint and
    /// [`AuthError::InvalidRequest`] for an unregistered or unanchored
    /// `post_logout_redirect_uri`.
    pub async fn validate(
        &self,
        context: &RequestContext,
    ) -> AuthResult<ValidatedEndSessionRequest> {
        let mut validated = ValidatedEndSessionRequest::default();

        if let Some(hint) = context.form_value("id_token_hint") {
            // The audience names the client; read it unverified, then verify
            // the token against that audience.
            let Some(audience) = extract_audience_unverified(hint) else {
                return Err(AuthError::invalid_token("id_token_hint has no audience"));
            };
            let token = self.tokens.validate_identity_token(hint, &audience).await?;

            validated.subject = token.subject().map(str::to_string);
            validated.client_id = Some(audience);
        }

        if let Some(uri) = context.form_value("post_logout_redirect_uri") {
            let Some(client_id) = &validated.client_id else {
                tracing::warn!("post_logout_redirect_uri without a valid id_token_hint");
                return Err(AuthError::invalid_request(
                    "post_logout_redirect_uri requires id_token_hint",
                ));
            };
            let client = self
                .clients
                .find_client_by_id(client_id)
                .await?
                .ok_or_else(|| AuthError::invalid_token("hint client is unknown"))?;
            if !client.post_logout_redirect_uris.iter().any(|u| u == uri) {
                tracing::warn!(client_id = %client.client_id, uri, "post_logout_redirect_uri is not registered");
                return Err(AuthError::invalid_request(
                    "post_logout_redirect_uri is not registered",
                ));
            }
            validated.post_logout_redirect_uri = Some(uri.to_string());
        }

        Ok(validated)
    }
}

/// Reads the `aud` claim of a JWT without verifying the signature.
fn extract_audience_unverified(jwt: &str) -> Option<String> {
    let payload = jwt.split('.').nth(1)?;
    let decoded = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let json: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
    match json.get("aud")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(values) => values.first()?.as_str().map(str::to_string),
        _ => None,
    }
}
