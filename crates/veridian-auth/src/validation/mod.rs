//! Request validators for the token and session endpoints.

pub mod custom_grant;
pub mod end_session;
pub mod introspection;
pub mod liveness;
pub mod token_request;

pub use custom_grant::{CustomGrantRegistry, CustomGrantResult, CustomGrantValidator};
pub use end_session::{EndSessionRequestValidator, ValidatedEndSessionRequest};
pub use introspection::{IntrospectionRequestValidator, IntrospectionResponse};
pub use liveness::TokenLivenessValidator;
pub use token_request::{TokenRequest, TokenRequestValidator, ValidatedTokenRequest};
