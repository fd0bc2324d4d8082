//! Secret validators.
//!
//! A validator checks one kind of parsed credential against the stored
//! secrets of its owner. Validators are chained; the first one that both
//! handles the credential shape and matches a stored secret wins. Expired
//! stored secrets are filtered out before any validator runs.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;
use time::OffsetDateTime;
use x509_parser::prelude::{FromDer, X509Certificate};

use crate::config::AuthConfig;
use crate::crypto;
use crate::error::AuthError;
use crate::types::{Credential, ParsedSecret, Secret, SecretType};
use crate::AuthResult;

/// Checks one credential shape against stored secrets.
#[async_trait]
pub trait SecretValidator: Send + Sync {
    /// Validator name for logging.
    fn name(&self) -> &'static str;

    /// Whether this validator understands the parsed credential's shape.
    fn handles(&self, parsed: &ParsedSecret) -> bool;

    /// Returns `true` when the credential matches one of the stored secrets.
    ///
    /// # Errors
    ///
    /// Returns an error only on infrastructure failures; a non-matching
    /// credential is `Ok(false)`.
    async fn validate(&self, secrets: &[Secret], parsed: &ParsedSecret) -> AuthResult<bool>;
}

/// Runs every applicable validator until one accepts the credential.
pub struct SecretValidatorChain {
    validators: Vec<Box<dyn SecretValidator>>,
}

impl SecretValidatorChain {
    /// Creates a chain over the given validators.
    #[must_use]
    pub fn new(validators: Vec<Box<dyn SecretValidator>>) -> Self {
        Self { validators }
    }

    /// The default chain: hashed shared secrets, certificates, private key
    /// JWT assertions, and secret-less public clients.
    #[must_use]
    pub fn default_chain(config: Arc<AuthConfig>) -> Self {
        Self::new(vec![
            Box::new(HashedSharedSecretValidator),
            Box::new(X509CertificateSecretValidator),
            Box::new(PrivateKeyJwtSecretValidator::new(config)),
            Box::new(NoSecretValidator),
        ])
    }

    /// Validates the parsed credential against the owner's stored secrets.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] when the parsed secret is malformed
    /// (an empty id), otherwise propagates validator errors.
    pub async fn validate(&self, secrets: &[Secret], parsed: &ParsedSecret) -> AuthResult<bool> {
        if parsed.id.is_empty() {
            return Err(AuthError::internal("parsed secret has an empty id"));
        }

        let live: Vec<Secret> = secrets
            .iter()
            .filter(|s| !s.is_expired())
            .cloned()
            .collect();
        if live.len() < secrets.len() {
            tracing::debug!(
                expired = secrets.len() - live.len(),
                "ignoring expired secrets"
            );
        }

        for validator in &self.validators {
            if !validator.handles(parsed) {
                continue;
            }
            if validator.validate(&live, parsed).await? {
                tracing::debug!(validator = validator.name(), "secret accepted");
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Validates a shared secret against SHA-256/SHA-512 hashed stored values.
pub struct HashedSharedSecretValidator;

#[async_trait]
impl SecretValidator for HashedSharedSecretValidator {
    fn name(&self) -> &'static str {
        "hashed_shared_secret"
    }

    fn handles(&self, parsed: &ParsedSecret) -> bool {
        matches!(parsed.credential, Credential::Shared(_))
    }

    async fn validate(&self, secrets: &[Secret], parsed: &ParsedSecret) -> AuthResult<bool> {
        let Credential::Shared(credential) = &parsed.credential else {
            return Ok(false);
        };
        if credential.is_empty() {
            return Err(AuthError::internal("shared credential is empty"));
        }

        for secret in secrets
            .iter()
            .filter(|s| s.secret_type == SecretType::SharedSecretHash)
        {
            let Ok(stored) = STANDARD.decode(&secret.value) else {
                tracing::warn!("stored secret hash is not valid base64, skipping");
                continue;
            };
            // Hash length selects the digest.
            let matches = match stored.len() {
                32 => crypto::constant_time_eq(&stored, &crypto::sha256(credential.as_bytes())),
                64 => crypto::constant_time_eq(&stored, &crypto::sha512(credential.as_bytes())),
                other => {
                    tracing::warn!(length = other, "stored secret hash has unexpected length");
                    false
                }
            };
            if matches {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Validates a plain-text shared secret. Only suitable for tests and
/// development stores.
pub struct PlainTextSharedSecretValidator;

#[async_trait]
impl SecretValidator for PlainTextSharedSecretValidator {
    fn name(&self) -> &'static str {
        "plain_text_shared_secret"
    }

    fn handles(&self, parsed: &ParsedSecret) -> bool {
        matches!(parsed.credential, Credential::Shared(_))
    }

    async fn validate(&self, secrets: &[Secret], parsed: &ParsedSecret) -> AuthResult<bool> {
        let Credential::Shared(credential) = &parsed.credential else {
            return Ok(false);
        };
        if credential.is_empty() {
            return Err(AuthError::internal("shared credential is empty"));
        }
        Ok(secrets
            .iter()
            .filter(|s| s.secret_type == SecretType::SharedSecret)
            .any(|s| crypto::constant_time_eq_str(&s.value, credential)))
    }
}

/// Validates a TLS client certificate against stored thumbprints or stored
/// full certificates.
pub struct X509CertificateSecretValidator;

#[async_trait]
impl SecretValidator for X509CertificateSecretValidator {
    fn name(&self) -> &'static str {
        "x509_certificate"
    }

    fn handles(&self, parsed: &ParsedSecret) -> bool {
        matches!(parsed.credential, Credential::Certificate(_))
    }

    async fn validate(&self, secrets: &[Secret], parsed: &ParsedSecret) -> AuthResult<bool> {
        let Credential::Certificate(der) = &parsed.credential else {
            return Ok(false);
        };
        if der.is_empty() {
            return Err(AuthError::internal("certificate credential is empty"));
        }

        let thumbprint = crypto::sha256_thumbprint(der);
        for secret in secrets {
            let matches = match secret.secret_type {
                SecretType::X509Thumbprint => {
                    crypto::constant_time_eq_str(&secret.value.to_ascii_lowercase(), &thumbprint)
                }
                SecretType::X509CertificateBase64 => match STANDARD.decode(&secret.value) {
                    Ok(stored) => crypto::constant_time_eq(&stored, der),
                    Err(_) => {
                        tracing::warn!("stored certificate is not valid base64, skipping");
                        false
                    }
                },
                _ => false,
            };
            if matches {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[derive(Debug, Deserialize)]
struct AssertionClaims {
    iss: String,
    sub: String,
    #[serde(default)]
    iat: Option<i64>,
    #[serde(default)]
    jti: Option<String>,
}

/// Validates an RFC 7523 `private_key_jwt` client assertion.
///
/// Trusted keys come from stored base64 certificates, or from the
/// assertion's own `x5c` header when the owner only stores thumbprints.
pub struct PrivateKeyJwtSecretValidator {
    config: Arc<AuthConfig>,
}

impl PrivateKeyJwtSecretValidator {
    /// Creates a validator bound to the issuer configuration.
    #[must_use]
    pub fn new(config: Arc<AuthConfig>) -> Self {
        Self { config }
    }

    /// Collects the DER certificates the assertion may be verified against.
    fn trusted_certificates(
        &self,
        secrets: &[Secret],
        assertion: &str,
    ) -> AuthResult<Vec<Vec<u8>>> {
        let mut certs = Vec::new();
        for secret in secrets
            .iter()
            .filter(|s| s.secret_type == SecretType::X509CertificateBase64)
        {
            match STANDARD.decode(&secret.value) {
                Ok(der) => certs.push(der),
                Err(_) => tracing::warn!("stored certificate is not valid base64, skipping"),
            }
        }

        // Thumbprint-only registration: the assertion must carry its own
        // certificate chain, pinned by thumbprint.
        let thumbprints: Vec<String> = secrets
            .iter()
            .filter(|s| s.secret_type == SecretType::X509Thumbprint)
            .map(|s| s.value.to_ascii_lowercase())
            .collect();
        if !thumbprints.is_empty() {
            let header = decode_header(assertion)
                .map_err(|e| AuthError::invalid_client(format!("malformed assertion: {e}")))?;
            if let Some(chain) = header.x5c {
                if let Some(leaf) = chain.first() {
                    if let Ok(der) = STANDARD.decode(leaf) {
                        let thumbprint = crypto::sha256_thumbprint(&der);
                        if thumbprints
                            .iter()
                            .any(|t| crypto::constant_time_eq_str(t, &thumbprint))
                        {
                            certs.push(der);
                        } else {
                            tracing::warn!("x5c certificate does not match any stored thumbprint");
                        }
                    }
                }
            }
        }
        Ok(certs)
    }

    fn decoding_key(der: &[u8]) -> Option<DecodingKey> {
        let (_, cert) = X509Certificate::from_der(der).ok()?;
        let spki = cert.public_key();
        // The BIT STRING payload is the PKCS#1 RSA public key.
        Some(DecodingKey::from_rsa_der(spki.subject_public_key.data.as_ref()))
    }
}

#[async_trait]
impl SecretValidator for PrivateKeyJwtSecretValidator {
    fn name(&self) -> &'static str {
        "private_key_jwt"
    }

    fn handles(&self, parsed: &ParsedSecret) -> bool {
        matches!(parsed.credential, Credential::JwtBearer(_))
    }

    async fn validate(&self, secrets: &[Secret], parsed: &ParsedSecret) -> AuthResult<bool> {
        let Credential::JwtBearer(assertion) = &parsed.credential else {
            return Ok(false);
        };
        if assertion.is_empty() {
            return Err(AuthError::internal("jwt bearer credential is empty"));
        }

        let certs = self.trusted_certificates(secrets, assertion)?;
        if certs.is_empty() {
            tracing::debug!(client_id = %parsed.id, "no trusted keys for client assertion");
            return Ok(false);
        }

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.config.token_endpoint()]);
        validation.set_required_spec_claims(&["exp", "aud", "iss", "sub"]);

        for der in &certs {
            let Some(key) = Self::decoding_key(der) else {
                tracing::warn!("trusted certificate does not carry a usable RSA key");
                continue;
            };
            let Ok(data) = decode::<AssertionClaims>(assertion, &key, &validation) else {
                continue;
            };
            let claims = data.claims;

            // Issuer and subject must both be the claimed client id.
            if claims.iss != parsed.id || claims.sub != parsed.id {
                tracing::warn!(client_id = %parsed.id, "assertion iss/sub mismatch");
                return Ok(false);
            }
            if claims.jti.is_none() {
                tracing::warn!(client_id = %parsed.id, "assertion is missing jti");
                return Ok(false);
            }
            if let Some(iat) = claims.iat {
                let age = OffsetDateTime::now_utc().unix_timestamp() - iat;
                if age > self.config.max_assertion_lifetime.as_secs() as i64 {
                    tracing::warn!(client_id = %parsed.id, age, "assertion issued too long ago");
                    return Ok(false);
                }
            }
            return Ok(true);
        }
        Ok(false)
    }
}

/// Accepts public clients that register [`SecretType::NoSecret`].
pub struct NoSecretValidator;

#[async_trait]
impl SecretValidator for NoSecretValidator {
    fn name(&self) -> &'static str {
        "no_secret"
    }

    fn handles(&self, parsed: &ParsedSecret) -> bool {
        matches!(parsed.credential, Credential::None)
    }

    async fn validate(&self, secrets: &[Secret], parsed: &ParsedSecret) -> AuthResult<bool> {
        if !matches!(parsed.credential, Credential::None) {
            return Ok(false);
        }
        Ok(secrets
            .iter()
            .any(|s| s.secret_type == SecretType::NoSecret))
    }
}
