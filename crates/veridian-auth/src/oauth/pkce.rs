//! PKCE (Proof Key for Code Exchange), RFC 7636.
//!
//! Binds an authorization code's redemption to the party that initiated the
//! authorization request. Both `S256` and `plain` are supported; clients
//! should use `S256` and servers may reject `plain` by policy at the
//! authorize endpoint.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

use crate::crypto;

/// Errors that can occur during PKCE operations.
#[derive(Debug, thiserror::Error)]
pub enum PkceError {
    /// Verifier length is outside the valid range (43-128 characters).
    #[error("Invalid verifier length: must be 43-128 characters, got {0}")]
    InvalidVerifierLength(usize),

    /// Verifier contains invalid characters.
    #[error("Invalid verifier characters: must be unreserved ([A-Za-z0-9-._~])")]
    InvalidVerifierCharacters,

    /// Unsupported challenge method.
    #[error("Unsupported challenge method: {0}")]
    UnsupportedMethod(String),

    /// Verifier does not match the stored challenge.
    #[error("PKCE verification failed: verifier does not match challenge")]
    VerificationFailed,
}

/// PKCE challenge method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PkceChallengeMethod {
    /// The challenge is the verifier itself.
    Plain,
    /// The challenge is base64url(SHA-256(verifier)).
    S256,
}

impl PkceChallengeMethod {
    /// Parses a `code_challenge_method` parameter value.
    ///
    /// # Errors
    ///
    /// Returns `PkceError::UnsupportedMethod` for anything other than
    /// `plain` or `S256`.
    pub fn parse(method: &str) -> Result<Self, PkceError> {
        match method {
            "plain" => Ok(Self::Plain),
            "S256" => Ok(Self::S256),
            other => Err(PkceError::UnsupportedMethod(other.to_string())),
        }
    }

    /// The wire value of this method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::S256 => "S256",
        }
    }
}

impl Default for PkceChallengeMethod {
    fn default() -> Self {
        Self::S256
    }
}

impl std::fmt::Display for PkceChallengeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validates a `code_verifier` per RFC 7636 section 4.1.
///
/// # Errors
///
/// Returns an error when the verifier is too short, too long, or contains a
/// character outside the unreserved set.
pub fn validate_verifier(verifier: &str) -> Result<(), PkceError> {
    if verifier.len() < 43 || verifier.len() > 128 {
        return Err(PkceError::InvalidVerifierLength(verifier.len()));
    }
    let valid = verifier
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~'));
    if !valid {
        return Err(PkceError::InvalidVerifierCharacters);
    }
    Ok(())
}

/// Derives the challenge a verifier should produce under `method`.
#[must_use]
pub fn derive_challenge(verifier: &str, method: PkceChallengeMethod) -> String {
    match method {
        PkceChallengeMethod::Plain => verifier.to_string(),
        PkceChallengeMethod::S256 => URL_SAFE_NO_PAD.encode(crypto::sha256(verifier.as_bytes())),
    }
}

/// Verifies a presented `code_verifier` against the stored challenge.
///
/// The comparison is constant time for both methods.
///
/// # Errors
///
/// Returns an error when the verifier is malformed or does not match.
pub fn verify_challenge(
    challenge: &str,
    method: PkceChallengeMethod,
    verifier: &str,
) -> Result<(), PkceError> {
    validate_verifier(verifier)?;
    let derived = derive_challenge(verifier, method);
    if crypto::constant_time_eq_str(&derived, challenge) {
        Ok(())
    } else {
        Err(PkceError::VerificationFailed)
    }
}
