//! Client and scope stores.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use veridian_auth::storage::{ClientStore, ScopeStore};
use veridian_auth::types::{Client, Scope};
use veridian_auth::AuthResult;

/// Client registry held in memory.
#[derive(Default)]
pub struct InMemoryClientStore {
    clients: RwLock<HashMap<String, Client>>,
}

impl InMemoryClientStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with the given clients.
    #[must_use]
    pub fn with_clients(clients: impl IntoIterator<Item = Client>) -> Self {
        let clients = clients
            .into_iter()
            .map(|c| (c.client_id.clone(), c))
            .collect();
        Self {
            clients: RwLock::new(clients),
        }
    }

    /// Adds or replaces a client.
    pub async fn upsert(&self, client: Client) {
        self.clients
            .write()
            .await
            .insert(client.client_id.clone(), client);
    }
}

#[async_trait]
impl ClientStore for InMemoryClientStore {
    async fn find_client_by_id(&self, client_id: &str) -> AuthResult<Option<Client>> {
        Ok(self.clients.read().await.get(client_id).cloned())
    }
}

/// Scope registry held in memory.
#[derive(Default)]
pub struct InMemoryScopeStore {
    scopes: RwLock<HashMap<String, Scope>>,
}

impl InMemoryScopeStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with the given scopes.
    #[must_use]
    pub fn with_scopes(scopes: impl IntoIterator<Item = Scope>) -> Self {
        let scopes = scopes.into_iter().map(|s| (s.name.clone(), s)).collect();
        Self {
            scopes: RwLock::new(scopes),
        }
    }

    /// Adds or replaces a scope.
    pub async fn upsert(&self, scope: Scope) {
        self.scopes.write().await.insert(scope.name.clone(), scope);
    }
}

#[async_trait]
impl ScopeStore for InMemoryScopeStore {
    async fn find_scopes_by_name(&self, names: &[String]) -> AuthResult<Vec<Scope>> {
        let scopes = self.scopes.read().await;
        // Preserve the caller's requested order.
        Ok(names
            .iter()
            .filter_map(|n| scopes.get(n).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_store_round_trip() {
        let store = InMemoryClientStore::with_clients([Client::new("app")]);
        assert!(store.find_client_by_id("app").await.unwrap().is_some());
        assert!(store.find_client_by_id("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_scope_store_preserves_requested_order() {
        let store = InMemoryScopeStore::with_scopes([
            Scope::resource("api1"),
            Scope::open_id(),
        ]);
        let found = store
            .find_scopes_by_name(&["api1".to_string(), "openid".to_string()])
            .await
            .unwrap();
        let names: Vec<&str> = found.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["api1", "openid"]);
    }
}
