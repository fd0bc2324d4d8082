//! Domain entities flowing through the token pipeline.

pub mod authorization_code;
pub mod claims;
pub mod client;
pub mod refresh_token;
pub mod scope;
pub mod secret;
pub mod token;

pub use authorization_code::AuthorizationCode;
pub use claims::{Claim, ClaimValue, Subject, claim_types, dedup_claims};
pub use client::{
    AccessTokenType, Client, GrantType, RefreshTokenExpiration, RefreshTokenUsage,
};
pub use refresh_token::RefreshToken;
pub use scope::{OFFLINE_ACCESS, Scope, ScopeClaim, ScopeType};
pub use secret::{Credential, ParsedSecret, Secret, SecretType};
pub use token::{Token, TokenCreationRequest, TokenType};
