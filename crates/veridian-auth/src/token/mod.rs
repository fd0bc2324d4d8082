//! Token creation, signing, refresh, validation, and response generation.

pub mod refresh;
pub mod response;
pub mod service;
pub mod signing;
pub mod validator;

pub use refresh::RefreshTokenService;
pub use response::{TokenResponse, TokenResponseGenerator};
pub use service::TokenService;
pub use signing::{
    InMemorySigningKeyService, SigningKeyMaterial, SigningKeyService, TokenSigningService,
};
pub use validator::{TokenValidator, ValidatedToken};
