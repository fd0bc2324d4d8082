//! Credential parsing, validation, and authentication.
//!
//! Inbound credentials move through three stages: a [`SecretParserChain`]
//! extracts a [`crate::types::ParsedSecret`] from the request, a
//! [`SecretValidatorChain`] checks it against the owner's stored secrets,
//! and an authenticator wires both to a store lookup and the audit trail.

pub mod authenticator;
pub mod parsing;
pub mod validation;

pub use authenticator::{ClientSecretAuthenticator, ScopeSecretAuthenticator};
pub use parsing::{
    BasicAuthenticationSecretParser, ClientAssertionSecretParser, PeerCertificateSecretParser,
    PostBodySecretParser, SecretParser, SecretParserChain, JWT_BEARER_CLIENT_ASSERTION_TYPE,
};
pub use validation::{
    HashedSharedSecretValidator, NoSecretValidator, PlainTextSharedSecretValidator,
    PrivateKeyJwtSecretValidator, SecretValidator, SecretValidatorChain,
    X509CertificateSecretValidator,
};
