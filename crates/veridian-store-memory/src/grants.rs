//! Grant artifact stores: authorization codes, refresh tokens, reference
//! token handles.
//!
//! All three wrap the same handle-keyed map. Removal under the write lock
//! gives the at-most-once consumption the core relies on: of two
//! concurrent redeemers of the same handle, only one observes the value.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use veridian_auth::storage::{AuthorizationCodeStore, RefreshTokenStore, TokenHandleStore};
use veridian_auth::types::{AuthorizationCode, RefreshToken, Token};
use veridian_auth::AuthResult;

struct HandleMap<T> {
    entries: RwLock<HashMap<String, T>>,
}

impl<T: Clone> HandleMap<T> {
    fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    async fn store(&self, handle: &str, value: T) {
        self.entries.write().await.insert(handle.to_string(), value);
    }

    async fn get(&self, handle: &str) -> Option<T> {
        self.entries.read().await.get(handle).cloned()
    }

    async fn remove(&self, handle: &str) {
        self.entries.write().await.remove(handle);
    }

    /// Removes and returns the value in one critical section.
    async fn take(&self, handle: &str) -> Option<T> {
        self.entries.write().await.remove(handle)
    }
}

/// Authorization code store held in memory.
pub struct InMemoryAuthorizationCodeStore {
    codes: HandleMap<AuthorizationCode>,
}

impl InMemoryAuthorizationCodeStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            codes: HandleMap::new(),
        }
    }
}

impl Default for InMemoryAuthorizationCodeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthorizationCodeStore for InMemoryAuthorizationCodeStore {
    async fn store(&self, handle: &str, code: AuthorizationCode) -> AuthResult<()> {
        self.codes.store(handle, code).await;
        Ok(())
    }

    async fn get(&self, handle: &str) -> AuthResult<Option<AuthorizationCode>> {
        Ok(self.codes.get(handle).await)
    }

    async fn remove(&self, handle: &str) -> AuthResult<()> {
        self.codes.remove(handle).await;
        Ok(())
    }
}

/// Refresh token store held in memory.
pub struct InMemoryRefreshTokenStore {
    tokens: HandleMap<RefreshToken>,
}

impl InMemoryRefreshTokenStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tokens: HandleMap::new(),
        }
    }

    /// Removes and returns a token atomically; used by rotation tests.
    pub async fn take(&self, handle: &str) -> Option<RefreshToken> {
        self.tokens.take(handle).await
    }
}

impl Default for InMemoryRefreshTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn store(&self, handle: &str, token: RefreshToken) -> AuthResult<()> {
        self.tokens.store(handle, token).await;
        Ok(())
    }

    async fn get(&self, handle: &str) -> AuthResult<Option<RefreshToken>> {
        Ok(self.tokens.get(handle).await)
    }

    async fn remove(&self, handle: &str) -> AuthResult<()> {
        self.tokens.remove(handle).await;
        Ok(())
    }
}

/// Reference token store held in memory.
pub struct InMemoryTokenHandleStore {
    tokens: HandleMap<Token>,
}

impl InMemoryTokenHandleStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tokens: HandleMap::new(),
        }
    }
}

impl Default for InMemoryTokenHandleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenHandleStore for InMemoryTokenHandleStore {
    async fn store(&self, handle: &str, token: Token) -> AuthResult<()> {
        self.tokens.store(handle, token).await;
        Ok(())
    }

    async fn get(&self, handle: &str) -> AuthResult<Option<Token>> {
        Ok(self.tokens.get(handle).await)
    }

    async fn remove(&self, handle: &str) -> AuthResult<()> {
        self.tokens.remove(handle).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use veridian_auth::types::Subject;

    fn code() -> AuthorizationCode {
        AuthorizationCode {
            client_id: "app".to_string(),
            subject: Subject::new("alice"),
            created_at: OffsetDateTime::now_utc(),
            is_open_id: false,
            requested_scopes: vec![],
            granted_scopes: vec![],
            redirect_uri: "https://app.example.com/cb".to_string(),
            nonce: None,
            session_id: None,
            code_challenge: None,
            code_challenge_method: None,
        }
    }

    #[tokio::test]
    async fn test_store_get_remove() {
        let store = InMemoryAuthorizationCodeStore::new();
        store.store("c1", code()).await.unwrap();
        assert!(store.get("c1").await.unwrap().is_some());

        store.remove("c1").await.unwrap();
        assert!(store.get("c1").await.unwrap().is_none());
        // Removing again is a no-op.
        store.remove("c1").await.unwrap();
    }
}
