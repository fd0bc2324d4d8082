//! Error types for the token issuance and validation pipeline.
//!
//! Protocol failures (bad credentials, unknown scopes, consumed codes) are
//! surfaced as OAuth 2.0 error codes. Contract breaches (a caller handing a
//! half-built request to a service) are `Internal` errors and are expected to
//! propagate, not to be rendered to a client.

use std::fmt;

/// Errors that can occur during token issuance and validation.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The client credentials are invalid or the client is not registered.
    #[error("Invalid client: {message}")]
    InvalidClient {
        /// Description of why the client is invalid.
        message: String,
    },

    /// The authorization grant or refresh token is invalid, expired, or consumed.
    #[error("Invalid grant: {message}")]
    InvalidGrant {
        /// Description of why the grant is invalid.
        message: String,
    },

    /// The requested scope is invalid, unknown, or not allowed for the client.
    #[error("Invalid scope: {message}")]
    InvalidScope {
        /// Description of why the scope is invalid.
        message: String,
    },

    /// The token is invalid, malformed, or failed validation.
    #[error("Invalid token: {message}")]
    InvalidToken {
        /// Description of why the token is invalid.
        message: String,
    },

    /// The request lacks valid authentication credentials.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Description of why the request is unauthorized.
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// PKCE code verifier does not match the code challenge.
    #[error("PKCE verification failed")]
    PkceVerificationFailed,

    /// The request is invalid or malformed.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// The redirect URI is missing, malformed, or not registered.
    ///
    /// Distinct from [`AuthError::InvalidRequest`] because the server must
    /// never redirect to an unvalidated URI; the presentation layer has to
    /// show an error page instead.
    #[error("Invalid redirect URI: {message}")]
    InvalidRedirectUri {
        /// Description of why the redirect URI is invalid.
        message: String,
    },

    /// The authorization server does not support the requested response type.
    #[error("Unsupported response type: {response_type}")]
    UnsupportedResponseType {
        /// The unsupported response type.
        response_type: String,
    },

    /// The authorization server does not support the requested grant type.
    #[error("Unsupported grant type: {grant_type}")]
    UnsupportedGrantType {
        /// The unsupported grant type.
        grant_type: String,
    },

    /// An error occurred while storing or retrieving data.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// A caller-side contract breach or unexpected internal failure.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `InvalidClient` error.
    #[must_use]
    pub fn invalid_client(message: impl Into<String>) -> Self {
        Self::InvalidClient {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidGrant` error.
    #[must_use]
    pub fn invalid_grant(message: impl Into<String>) -> Self {
        Self::InvalidGrant {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidScope` error.
    #[must_use]
    pub fn invalid_scope(message: impl Into<String>) -> Self {
        Self::InvalidScope {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidToken` error.
    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    /// Creates a new `Unauthorized` error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRedirectUri` error.
    #[must_use]
    pub fn invalid_redirect_uri(message: impl Into<String>) -> Self {
        Self::InvalidRedirectUri {
            message: message.into(),
        }
    }

    /// Creates a new `UnsupportedResponseType` error.
    #[must_use]
    pub fn unsupported_response_type(response_type: impl Into<String>) -> Self {
        Self::UnsupportedResponseType {
            response_type: response_type.into(),
        }
    }

    /// Creates a new `UnsupportedGrantType` error.
    #[must_use]
    pub fn unsupported_grant_type(grant_type: impl Into<String>) -> Self {
        Self::UnsupportedGrantType {
            grant_type: grant_type.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this error is safe to surface in a protocol response.
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        !matches!(
            self,
            Self::Storage { .. } | Self::Configuration { .. } | Self::Internal { .. }
        )
    }

    /// Returns `true` if this is an authentication failure.
    #[must_use]
    pub fn is_authentication_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidClient { .. }
                | Self::InvalidGrant { .. }
                | Self::InvalidToken { .. }
                | Self::Unauthorized { .. }
                | Self::TokenExpired
                | Self::PkceVerificationFailed
        )
    }

    /// Returns the OAuth 2.0 error code for this error.
    #[must_use]
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            Self::InvalidClient { .. } => "invalid_client",
            Self::InvalidGrant { .. } => "invalid_grant",
            Self::InvalidScope { .. } => "invalid_scope",
            Self::InvalidToken { .. } => "invalid_token",
            Self::Unauthorized { .. } => "unauthorized_client",
            Self::TokenExpired => "invalid_token",
            Self::PkceVerificationFailed => "invalid_grant",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::InvalidRedirectUri { .. } => "invalid_request",
            Self::UnsupportedResponseType { .. } => "unsupported_response_type",
            Self::UnsupportedGrantType { .. } => "unsupported_grant_type",
            Self::Storage { .. } => "server_error",
            Self::Configuration { .. } => "server_error",
            Self::Internal { .. } => "server_error",
        }
    }

    /// Returns where the presentation layer must surface this error.
    ///
    /// [`ErrorTarget::Client`] errors may be redirected back to the relying
    /// party with `error=...` parameters. [`ErrorTarget::User`] errors must be
    /// rendered on an error page because no trustworthy redirect URI exists.
    #[must_use]
    pub fn error_target(&self) -> ErrorTarget {
        match self {
            Self::InvalidRedirectUri { .. } => ErrorTarget::User,
            Self::Storage { .. } | Self::Configuration { .. } | Self::Internal { .. } => {
                ErrorTarget::User
            }
            _ => ErrorTarget::Client,
        }
    }
}

/// Who an error is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorTarget {
    /// Safe to redirect back to the client application.
    Client,
    /// Must be shown to the end user on an error page.
    User,
}

impl fmt::Display for ErrorTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client => write!(f, "client"),
            Self::User => write!(f, "user"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::invalid_client("client not found");
        assert_eq!(err.to_string(), "Invalid client: client not found");

        let err = AuthError::invalid_grant("expired authorization code");
        assert_eq!(err.to_string(), "Invalid grant: expired authorization code");

        let err = AuthError::TokenExpired;
        assert_eq!(err.to_string(), "Token expired");
    }

    #[test]
    fn test_oauth_error_code() {
        assert_eq!(
            AuthError::invalid_client("test").oauth_error_code(),
            "invalid_client"
        );
        assert_eq!(
            AuthError::invalid_grant("test").oauth_error_code(),
            "invalid_grant"
        );
        assert_eq!(AuthError::TokenExpired.oauth_error_code(), "invalid_token");
        assert_eq!(
            AuthError::PkceVerificationFailed.oauth_error_code(),
            "invalid_grant"
        );
        assert_eq!(
            AuthError::unsupported_grant_type("test").oauth_error_code(),
            "unsupported_grant_type"
        );
    }

    #[test]
    fn test_error_target() {
        assert_eq!(
            AuthError::invalid_scope("test").error_target(),
            ErrorTarget::Client
        );
        assert_eq!(
            AuthError::invalid_redirect_uri("not registered").error_target(),
            ErrorTarget::User
        );
        assert_eq!(
            AuthError::internal("bug").error_target(),
            ErrorTarget::User
        );
    }

    #[test]
    fn test_protocol_error_predicate() {
        assert!(AuthError::invalid_grant("test").is_protocol_error());
        assert!(!AuthError::internal("test").is_protocol_error());
        assert!(!AuthError::storage("down").is_protocol_error());
    }
}
