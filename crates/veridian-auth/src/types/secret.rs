//! Stored secrets and credentials parsed from inbound requests.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// How a stored secret value is interpreted during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretType {
    /// Plaintext shared secret (compared directly, constant time).
    SharedSecret,

    /// Base64-encoded SHA-256 or SHA-512 digest of a shared secret.
    /// The digest length selects the hash algorithm at validation time.
    SharedSecretHash,

    /// Lowercase hex SHA-256 thumbprint of a client certificate.
    X509Thumbprint,

    /// Base64-encoded DER of a client certificate.
    X509CertificateBase64,

    /// No credential required; registers a public client.
    NoSecret,
}

/// A secret registered on a client or scope.
///
/// Expired secrets are excluded from validation attempts but are never
/// deleted by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Secret {
    /// The stored value, interpreted per `secret_type`.
    pub value: String,

    /// How `value` is interpreted.
    pub secret_type: SecretType,

    /// When this secret stops being usable (None = never).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub expiration: Option<OffsetDateTime>,

    /// Operator-facing description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Secret {
    /// Creates a plaintext shared secret.
    #[must_use]
    pub fn shared(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            secret_type: SecretType::SharedSecret,
            expiration: None,
            description: None,
        }
    }

    /// Creates a hashed shared secret from a base64 digest.
    #[must_use]
    pub fn shared_hash(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            secret_type: SecretType::SharedSecretHash,
            expiration: None,
            description: None,
        }
    }

    /// Creates a certificate thumbprint secret.
    #[must_use]
    pub fn thumbprint(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            secret_type: SecretType::X509Thumbprint,
            expiration: None,
            description: None,
        }
    }

    /// Creates a base64-DER certificate secret.
    #[must_use]
    pub fn certificate_base64(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            secret_type: SecretType::X509CertificateBase64,
            expiration: None,
            description: None,
        }
    }

    /// Creates a marker secret for a public client.
    #[must_use]
    pub fn none() -> Self {
        Self {
            value: String::new(),
            secret_type: SecretType::NoSecret,
            expiration: None,
            description: None,
        }
    }

    /// Sets the expiration.
    #[must_use]
    pub fn with_expiration(mut self, expiration: OffsetDateTime) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// Returns `true` if this secret has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expiration
            .map(|exp| OffsetDateTime::now_utc() > exp)
            .unwrap_or(false)
    }
}

/// A credential extracted from an inbound request.
///
/// Transient: produced by a secret parser, consumed once by a validator,
/// never persisted.
#[derive(Debug, Clone)]
pub struct ParsedSecret {
    /// The claimed client or scope identifier.
    pub id: String,

    /// The presented credential material.
    pub credential: Credential,
}

/// Credential material carried by a [`ParsedSecret`].
#[derive(Debug, Clone)]
pub enum Credential {
    /// A shared secret string (Basic auth or form body).
    Shared(String),

    /// A signed JWT client assertion.
    JwtBearer(String),

    /// A DER-encoded peer certificate.
    Certificate(Vec<u8>),

    /// No credential presented (public client).
    None,
}

impl ParsedSecret {
    /// Creates a shared-secret credential.
    #[must_use]
    pub fn shared(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            credential: Credential::Shared(secret.into()),
        }
    }

    /// Creates a JWT bearer assertion credential.
    #[must_use]
    pub fn jwt_bearer(id: impl Into<String>, assertion: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            credential: Credential::JwtBearer(assertion.into()),
        }
    }

    /// Creates a certificate credential from DER bytes.
    #[must_use]
    pub fn certificate(id: impl Into<String>, der: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            credential: Credential::Certificate(der),
        }
    }

    /// Creates a credential-less secret for a public client.
    #[must_use]
    pub fn public(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            credential: Credential::None,
        }
    }
}
