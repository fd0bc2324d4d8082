//! Scope store trait.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::Scope;

/// Store of registered scopes.
#[async_trait]
pub trait ScopeStore: Send + Sync {
    /// Resolves scope names to registered scopes.
    ///
    /// Unknown names are simply absent from the result; callers decide
    /// whether that is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_scopes_by_name(&self, names: &[String]) -> AuthResult<Vec<Scope>>;
}
