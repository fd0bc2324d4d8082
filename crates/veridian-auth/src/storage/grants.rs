//! Stores for grant artifacts: authorization codes, refresh tokens, and
//! reference token handles.
//!
//! All three share the same shape: opaque random handle in, entity out.
//! Consume-then-replace sequences (delete old handle, store new handle) are
//! issued by the core in documented order; at-most-once consumption of a
//! handle is the store's responsibility (e.g. atomic delete-if-exists). A
//! concurrent second request presenting the same one-time handle must lose
//! the race.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::{AuthorizationCode, RefreshToken, Token};

/// Store of pending authorization codes, keyed by handle.
#[async_trait]
pub trait AuthorizationCodeStore: Send + Sync {
    /// Stores a code under its handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn store(&self, handle: &str, code: AuthorizationCode) -> AuthResult<()>;

    /// Retrieves a code by handle. `None` when absent or already consumed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get(&self, handle: &str) -> AuthResult<Option<AuthorizationCode>>;

    /// Removes a code. Removing an absent handle is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn remove(&self, handle: &str) -> AuthResult<()>;
}

/// Store of live refresh tokens, keyed by handle.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Stores a refresh token under its handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn store(&self, handle: &str, token: RefreshToken) -> AuthResult<()>;

    /// Retrieves a refresh token by handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get(&self, handle: &str) -> AuthResult<Option<RefreshToken>>;

    /// Removes a refresh token. Removing an absent handle is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn remove(&self, handle: &str) -> AuthResult<()>;
}

/// Store of reference tokens, keyed by handle.
#[async_trait]
pub trait TokenHandleStore: Send + Sync {
    /// Stores a token under its reference handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn store(&self, handle: &str, token: Token) -> AuthResult<()>;

    /// Resolves a reference handle to its token.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get(&self, handle: &str) -> AuthResult<Option<Token>>;

    /// Removes a reference token (revocation).
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn remove(&self, handle: &str) -> AuthResult<()>;
}
