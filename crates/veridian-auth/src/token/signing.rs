//! Signing key management and JWT creation.
//!
//! A [`SigningKeyService`] owns the key material; [`TokenSigningService`]
//! turns a [`Token`] entity into a signed compact JWT. Claims with the same
//! type collapse into JSON arrays, matching how multiple `scope` claims are
//! serialized.

use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, encode};
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde_json::{Map, Value};

use crate::error::AuthError;
use crate::types::Token;
use crate::AuthResult;

/// One signing key with both halves of its material.
pub struct SigningKeyMaterial {
    /// `kid` header value.
    pub kid: String,
    /// Private half, used for signing.
    pub encoding: EncodingKey,
    /// Public half, used for validation.
    pub decoding: DecodingKey,
    /// Signature algorithm.
    pub algorithm: Algorithm,
}

/// Provides the active signing key and the keys accepted for validation.
pub trait SigningKeyService: Send + Sync {
    /// The key new tokens are signed with.
    ///
    /// # Errors
    ///
    /// Returns an error when no signing key is available.
    fn active_key(&self) -> AuthResult<Arc<SigningKeyMaterial>>;

    /// All keys inbound tokens may be verified against, active key first.
    ///
    /// # Errors
    ///
    /// Returns an error when no keys are available.
    fn validation_keys(&self) -> AuthResult<Vec<Arc<SigningKeyMaterial>>>;
}

/// Key service holding a single generated RSA key pair.
///
/// Suitable for tests and single-node deployments; keys do not survive a
/// restart.
pub struct InMemorySigningKeyService {
    key: Arc<SigningKeyMaterial>,
}

impl InMemorySigningKeyService {
    /// Generates a fresh RSA-2048 key pair.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] when key generation or encoding fails.
    pub fn generate() -> AuthResult<Self> {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, 2048)
            .map_err(|e| AuthError::internal(format!("RSA key generation failed: {e}")))?;
        let public = RsaPublicKey::from(&private);

        let private_pem = private
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| AuthError::internal(format!("private key encoding failed: {e}")))?;
        let public_pem = public
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| AuthError::internal(format!("public key encoding failed: {e}")))?;

        let encoding = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| AuthError::internal(format!("unusable private key: {e}")))?;
        let decoding = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| AuthError::internal(format!("unusable public key: {e}")))?;

        Ok(Self {
            key: Arc::new(SigningKeyMaterial {
                kid: uuid::Uuid::new_v4().to_string(),
                encoding,
                decoding,
                algorithm: Algorithm::RS256,
            }),
        })
    }
}

impl SigningKeyService for InMemorySigningKeyService {
    fn active_key(&self) -> AuthResult<Arc<SigningKeyMaterial>> {
        Ok(self.key.clone())
    }

    fn validation_keys(&self) -> AuthResult<Vec<Arc<SigningKeyMaterial>>> {
        Ok(vec![self.key.clone()])
    }
}

/// Signs token entities into compact JWTs.
pub struct TokenSigningService {
    keys: Arc<dyn SigningKeyService>,
}

impl TokenSigningService {
    /// Creates a signing service over the given keys.
    #[must_use]
    pub fn new(keys: Arc<dyn SigningKeyService>) -> Self {
        Self { keys }
    }

    /// Signs the token into a compact JWT.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] when the key is unavailable or
    /// encoding fails.
    pub fn sign(&self, token: &Token) -> AuthResult<String> {
        let key = self.keys.active_key()?;

        let mut header = Header::new(key.algorithm);
        header.kid = Some(key.kid.clone());
        header.typ = Some("JWT".to_string());

        let payload = Self::build_payload(token);
        encode(&header, &payload, &key.encoding)
            .map_err(|e| AuthError::internal(format!("token signing failed: {e}")))
    }

    fn build_payload(token: &Token) -> Map<String, Value> {
        let iat = token.created_at.unix_timestamp();
        let mut payload = Map::new();
        payload.insert("iss".to_string(), Value::from(token.issuer.clone()));
        payload.insert("aud".to_string(), Value::from(token.audience.clone()));
        payload.insert("nbf".to_string(), Value::from(iat));
        payload.insert("iat".to_string(), Value::from(iat));
        payload.insert("exp".to_string(), Value::from(iat + token.lifetime));

        for claim in &token.claims {
            let value = claim.value.to_json();
            match payload.get_mut(&claim.claim_type) {
                None => {
                    payload.insert(claim.claim_type.clone(), value);
                }
                Some(Value::Array(existing)) => {
                    if !existing.contains(&value) {
                        existing.push(value);
                    }
                }
                Some(existing) => {
                    // Repeated claim types become arrays; exact duplicates
                    // are dropped.
                    if *existing != value {
                        let first = existing.take();
                        *existing = Value::Array(vec![first, value]);
                    }
                }
            }
        }
        payload
    }
}
