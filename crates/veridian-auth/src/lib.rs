//! Token issuance and validation core for an OAuth 2.0 / OpenID Connect
//! authorization server.
//!
//! The crate covers the security-critical inner pipeline of a token
//! service: credential parsing and validation, client and scope
//! authentication, scope validation, authorization code and refresh token
//! lifecycle, token creation and signing, and validation of issued tokens.
//! HTTP transport, session management, and user interface concerns live
//! outside this crate; requests enter through [`request::RequestContext`]
//! and persistence is abstracted behind the [`storage`] traits.
//!
//! # Architecture
//!
//! - [`secrets`] — parse credentials out of a request and validate them
//!   against stored secrets; client and scope authenticators.
//! - [`scopes`] — scope parsing, store lookup, and client allow-lists.
//! - [`validation`] — per-grant token request validation, introspection,
//!   end session, extension grants, and liveness re-checks.
//! - [`token`] — token creation, JWT signing, refresh token rotation,
//!   validation of issued tokens, and response generation.
//! - [`storage`] — async traits for clients, scopes, grants, and users,
//!   plus caching decorators.
//! - [`events`] — audit events raised on every authentication and
//!   issuance outcome.

pub mod claims;
pub mod config;
pub mod crypto;
pub mod error;
pub mod events;
pub mod oauth;
pub mod request;
pub mod scopes;
pub mod secrets;
pub mod storage;
pub mod token;
pub mod types;
pub mod validation;

pub use error::AuthError;

/// Result alias used throughout the crate.
pub type AuthResult<T> = Result<T, AuthError>;

/// Common imports for consumers of the crate.
pub mod prelude {
    pub use crate::claims::{ClaimsProvider, DefaultClaimsProvider};
    pub use crate::config::AuthConfig;
    pub use crate::error::AuthError;
    pub use crate::events::{Event, EventSink, TracingEventSink};
    pub use crate::oauth::authorize::AuthorizationCodeIssuer;
    pub use crate::oauth::pkce::PkceChallengeMethod;
    pub use crate::request::RequestContext;
    pub use crate::scopes::ScopeValidator;
    pub use crate::secrets::{
        ClientSecretAuthenticator, ScopeSecretAuthenticator, SecretParserChain,
        SecretValidatorChain,
    };
    pub use crate::storage::{
        AuthorizationCodeStore, ClientStore, RefreshTokenStore, ScopeStore, TokenHandleStore,
        UserService,
    };
    pub use crate::token::{
        InMemorySigningKeyService, RefreshTokenService, TokenResponseGenerator, TokenService,
        TokenSigningService, TokenValidator,
    };
    pub use crate::types::{
        AccessTokenType, AuthorizationCode, Claim, Client, GrantType, RefreshToken,
        RefreshTokenExpiration, RefreshTokenUsage, Scope, ScopeType, Secret, Subject, Token,
        TokenCreationRequest, TokenType,
    };
    pub use crate::validation::{
        CustomGrantRegistry, EndSessionRequestValidator, IntrospectionRequestValidator,
        TokenLivenessValidator, TokenRequestValidator,
    };
    pub use crate::AuthResult;
}
