//! Client store trait.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::Client;

/// Store of registered clients.
///
/// The core only ever reads; registration management belongs to the hosting
/// layer. Implementations own their concurrency control.
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// Finds a client by its unique identifier.
    ///
    /// Returns `None` when the client is not registered. Resolution of
    /// disabled clients is left to the caller so that authentication failures
    /// can be audited with the right client id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_client_by_id(&self, client_id: &str) -> AuthResult<Option<Client>>;
}
