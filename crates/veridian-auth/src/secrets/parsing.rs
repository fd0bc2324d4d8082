//! Secret parsers.
//!
//! Each parser inspects one location of the inbound request and extracts a
//! [`ParsedSecret`] when its credential shape is present. A parser never
//! judges the credential; that is the validators' job. Absence is `None`,
//! not an error.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};

use crate::AuthResult;
use crate::config::InputLengthRestrictions;
use crate::request::RequestContext;
use crate::types::ParsedSecret;

/// `client_assertion_type` value for JWT bearer assertions (RFC 7523).
pub const JWT_BEARER_CLIENT_ASSERTION_TYPE: &str =
    "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Extracts a credential claim from one location of an inbound request.
#[async_trait]
pub trait SecretParser: Send + Sync {
    /// Parser name for logging.
    fn name(&self) -> &'static str;

    /// Returns the parsed secret if this parser's credential shape is
    /// present, `None` otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error only on storage/infrastructure failures, never on a
    /// merely absent or malformed credential.
    async fn parse(&self, context: &RequestContext) -> AuthResult<Option<ParsedSecret>>;
}

/// Tries each parser in registration order; first match wins.
pub struct SecretParserChain {
    parsers: Vec<Box<dyn SecretParser>>,
}

impl SecretParserChain {
    /// Creates a chain over the given parsers.
    #[must_use]
    pub fn new(parsers: Vec<Box<dyn SecretParser>>) -> Self {
        Self { parsers }
    }

    /// The default chain: Basic auth, then post body, then JWT assertion,
    /// then TLS peer certificate.
    #[must_use]
    pub fn default_chain(input_lengths: InputLengthRestrictions) -> Self {
        Self::new(vec![
            Box::new(BasicAuthenticationSecretParser::new(input_lengths.clone())),
            Box::new(PostBodySecretParser::new(input_lengths)),
            Box::new(ClientAssertionSecretParser),
            Box::new(PeerCertificateSecretParser),
        ])
    }

    /// Runs the chain, returning the first parsed secret.
    ///
    /// # Errors
    ///
    /// Propagates the first parser error.
    pub async fn parse(&self, context: &RequestContext) -> AuthResult<Option<ParsedSecret>> {
        for parser in &self.parsers {
            if let Some(secret) = parser.parse(context).await? {
                tracing::debug!(parser = parser.name(), "credential found");
                return Ok(Some(secret));
            }
        }
        tracing::debug!("no credential found in request");
        Ok(None)
    }
}

/// Parses `Authorization: Basic ...` headers.
pub struct BasicAuthenticationSecretParser {
    input_lengths: InputLengthRestrictions,
}

impl BasicAuthenticationSecretParser {
    /// Creates a parser enforcing the given length limits.
    #[must_use]
    pub fn new(input_lengths: InputLengthRestrictions) -> Self {
        Self { input_lengths }
    }
}

#[async_trait]
impl SecretParser for BasicAuthenticationSecretParser {
    fn name(&self) -> &'static str {
        "basic_authentication"
    }

    async fn parse(&self, context: &RequestContext) -> AuthResult<Option<ParsedSecret>> {
        let Some(header) = context.header("authorization") else {
            return Ok(None);
        };
        let header = header.trim();

        // Scheme is case-insensitive per RFC 7617. Slice on checked
        // boundaries; the header is attacker-controlled and may contain
        // multi-byte characters.
        let scheme_matches = header
            .get(..6)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("basic "));
        let Some(payload) = header.get(6..).filter(|_| scheme_matches) else {
            return Ok(None);
        };

        let Ok(decoded) = STANDARD.decode(payload.trim()) else {
            tracing::debug!("malformed base64 in basic authentication header");
            return Ok(None);
        };
        let Ok(pair) = String::from_utf8(decoded) else {
            return Ok(None);
        };

        // Split on the first colon only; the secret may contain colons.
        let Some((id, secret)) = pair.split_once(':') else {
            tracing::debug!("malformed basic authentication credential");
            return Ok(None);
        };
        if id.is_empty() || secret.is_empty() {
            return Ok(None);
        }
        if id.len() > self.input_lengths.client_id
            || secret.len() > self.input_lengths.client_secret
        {
            tracing::warn!("credential exceeds length restrictions");
            return Ok(None);
        }

        Ok(Some(ParsedSecret::shared(id, secret)))
    }
}

/// Parses `client_id` / `client_secret` from the form body.
pub struct PostBodySecretParser {
    input_lengths: InputLengthRestrictions,
}

impl PostBodySecretParser {
    /// Creates a parser enforcing the given length limits.
    #[must_use]
    pub fn new(input_lengths: InputLengthRestrictions) -> Self {
        Self { input_lengths }
    }
}

#[async_trait]
impl SecretParser for PostBodySecretParser {
    fn name(&self) -> &'static str {
        "post_body"
    }

    async fn parse(&self, context: &RequestContext) -> AuthResult<Option<ParsedSecret>> {
        let Some(id) = context.form_value("client_id") else {
            return Ok(None);
        };
        if id.is_empty() || id.len() > self.input_lengths.client_id {
            return Ok(None);
        }

        match context.form_value("client_secret") {
            Some(secret) if !secret.is_empty() => {
                if secret.len() > self.input_lengths.client_secret {
                    tracing::warn!("client secret exceeds length restrictions");
                    return Ok(None);
                }
                Ok(Some(ParsedSecret::shared(id, secret)))
            }
            // client_id without a secret identifies a public client.
            _ => Ok(Some(ParsedSecret::public(id))),
        }
    }
}

/// Parses a `client_assertion` JWT from the form body.
pub struct ClientAssertionSecretParser;

#[async_trait]
impl SecretParser for ClientAssertionSecretParser {
    fn name(&self) -> &'static str {
        "client_assertion"
    }

    async fn parse(&self, context: &RequestContext) -> AuthResult<Option<ParsedSecret>> {
        let assertion_type = context.form_value("client_assertion_type");
        if assertion_type != Some(JWT_BEARER_CLIENT_ASSERTION_TYPE) {
            return Ok(None);
        }
        let Some(assertion) = context.form_value("client_assertion") else {
            return Ok(None);
        };
        // The claimed id comes from the unverified `iss`; the validator
        // re-checks it against the verified claims.
        let Some(issuer) = extract_issuer_unverified(assertion) else {
            tracing::debug!("client assertion has no parseable issuer");
            return Ok(None);
        };
        Ok(Some(ParsedSecret::jwt_bearer(issuer, assertion)))
    }
}

/// Parses the TLS peer certificate for mutual-TLS client authentication.
pub struct PeerCertificateSecretParser;

#[async_trait]
impl SecretParser for PeerCertificateSecretParser {
    fn name(&self) -> &'static str {
        "peer_certificate"
    }

    async fn parse(&self, context: &RequestContext) -> AuthResult<Option<ParsedSecret>> {
        let Some(der) = context.peer_certificate() else {
            return Ok(None);
        };
        // The claimed id still travels in the body; the certificate is the
        // credential.
        let Some(id) = context.form_value("client_id") else {
            tracing::debug!("peer certificate present but no client_id claimed");
            return Ok(None);
        };
        if id.is_empty() {
            return Ok(None);
        }
        Ok(Some(ParsedSecret::certificate(id, der.to_vec())))
    }
}

/// Reads the `iss` claim of a JWT without verifying the signature.
fn extract_issuer_unverified(jwt: &str) -> Option<String> {
    let mut parts = jwt.split('.');
    let _header = parts.next()?;
    let payload = parts.next()?;
    let decoded = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let json: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
    json.get("iss")?.as_str().map(str::to_string)
}
