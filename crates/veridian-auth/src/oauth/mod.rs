//! OAuth 2.0 protocol pieces: PKCE and authorization code issuance.

pub mod authorize;
pub mod pkce;

pub use authorize::AuthorizationCodeIssuer;
pub use pkce::{PkceChallengeMethod, PkceError, derive_challenge, verify_challenge};
