//! Cryptographic helpers shared by the secret and token pipeline.
//!
//! Security-sensitive comparisons in this crate go through
//! [`constant_time_eq`], which evaluates every byte regardless of where the
//! first mismatch occurs.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256, Sha512};

/// Compares two byte slices in constant time.
///
/// Length is folded into the result rather than short-circuiting; every index
/// of the common prefix is visited even after a mismatch is found.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let mut visited = 0;
    constant_time_eq_counted(a, b, &mut visited)
}

/// Constant-time comparison over strings.
#[must_use]
pub fn constant_time_eq_str(a: &str, b: &str) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}

/// Instrumented variant of [`constant_time_eq`].
///
/// `visited` is incremented once per index compared, which lets unit tests
/// assert that the full length is always traversed.
pub(crate) fn constant_time_eq_counted(a: &[u8], b: &[u8], visited: &mut usize) -> bool {
    let mut diff = a.len() ^ b.len();
    let common = a.len().min(b.len());
    for i in 0..common {
        *visited += 1;
        diff |= usize::from(a[i] ^ b[i]);
    }
    diff == 0
}

/// SHA-256 digest of `data`.
#[must_use]
pub fn sha256(data: &[u8]) -> Vec<u8> {
    Sha256::digest(data).to_vec()
}

/// SHA-512 digest of `data`.
#[must_use]
pub fn sha512(data: &[u8]) -> Vec<u8> {
    Sha512::digest(data).to_vec()
}

/// Lowercase hex SHA-256 fingerprint, as used for certificate thumbprints.
#[must_use]
pub fn sha256_thumbprint(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Computes the OIDC `at_hash` / `c_hash` value for a token or code string.
///
/// Left-most 128 bits of the SHA-256 digest, base64url encoded without
/// padding. Byte-for-byte reproducibility matters here: conformant relying
/// parties recompute this value to bind an identity token to its sibling
/// access token or authorization code.
#[must_use]
pub fn oidc_token_hash(value: &str) -> String {
    let digest = sha256(value.as_bytes());
    URL_SAFE_NO_PAD.encode(&digest[..16])
}

/// Generates a cryptographically random opaque handle.
///
/// 256 bits encoded as unpadded base64url (43 characters). Used for reference
/// tokens, authorization codes, and refresh token handles.
#[must_use]
pub fn generate_handle() -> String {
    let mut bytes = [0u8; 32];
    rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
