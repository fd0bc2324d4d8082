//! Caching decorators for the read-mostly stores.
//!
//! Decoration is explicit composition: a wrapper holding the inner store and
//! a cache collaborator, implementing the same store trait. Wire the wrapper
//! at construction; nothing here is implicit.

use std::sync::Arc;

use async_trait::async_trait;

use crate::AuthResult;
use crate::storage::{ClientStore, ScopeStore};
use crate::types::{Client, Scope};

/// A read-through cache collaborator.
///
/// Implementations must be safe for concurrent reads; eviction policy (TTL or
/// otherwise) is theirs to define.
#[async_trait]
pub trait Cache<T: Clone + Send + Sync + 'static>: Send + Sync {
    /// Returns the cached value for `key`, if present and fresh.
    async fn get(&self, key: &str) -> Option<T>;

    /// Caches `value` under `key`.
    async fn set(&self, key: &str, value: T);
}

/// Client store decorator that caches found clients.
///
/// Misses are not cached: an unknown client id stays a lookup so that a
/// freshly registered client is visible immediately.
pub struct CachingClientStore {
    inner: Arc<dyn ClientStore>,
    cache: Arc<dyn Cache<Client>>,
}

impl CachingClientStore {
    /// Wraps `inner` with `cache`.
    #[must_use]
    pub fn new(inner: Arc<dyn ClientStore>, cache: Arc<dyn Cache<Client>>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl ClientStore for CachingClientStore {
    async fn find_client_by_id(&self, client_id: &str) -> AuthResult<Option<Client>> {
        if let Some(client) = self.cache.get(client_id).await {
            return Ok(Some(client));
        }
        let found = self.inner.find_client_by_id(client_id).await?;
        if let Some(ref client) = found {
            self.cache.set(client_id, client.clone()).await;
        }
        Ok(found)
    }
}

/// Scope store decorator that caches resolved scope sets.
///
/// The cache key is the sorted, space-joined name list, so the same request
/// shape hits the same entry regardless of caller ordering.
pub struct CachingScopeStore {
    inner: Arc<dyn ScopeStore>,
    cache: Arc<dyn Cache<Vec<Scope>>>,
}

impl CachingScopeStore {
    /// Wraps `inner` with `cache`.
    #[must_use]
    pub fn new(inner: Arc<dyn ScopeStore>, cache: Arc<dyn Cache<Vec<Scope>>>) -> Self {
        Self { inner, cache }
    }

    fn cache_key(names: &[String]) -> String {
        let mut sorted: Vec<&str> = names.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted.join(" ")
    }
}

#[async_trait]
impl ScopeStore for CachingScopeStore {
    async fn find_scopes_by_name(&self, names: &[String]) -> AuthResult<Vec<Scope>> {
        let key = Self::cache_key(names);
        if let Some(scopes) = self.cache.get(&key).await {
            return Ok(scopes);
        }
        let scopes = self.inner.find_scopes_by_name(names).await?;
        self.cache.set(&key, scopes.clone()).await;
        Ok(scopes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::RwLock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingClientStore {
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl ClientStore for CountingClientStore {
        async fn find_client_by_id(&self, client_id: &str) -> AuthResult<Option<Client>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if client_id == "known" {
                Ok(Some(Client::new("known")))
            } else {
                Ok(None)
            }
        }
    }

    struct MapCache<T> {
        entries: RwLock<HashMap<String, T>>,
    }

    // Derived Default would require T: Default.
    impl<T> Default for MapCache<T> {
        fn default() -> Self {
            Self {
                entries: RwLock::new(HashMap::new()),
            }
        }
    }

    #[async_trait]
    impl<T: Clone + Send + Sync + 'static> Cache<T> for MapCache<T> {
        async fn get(&self, key: &str) -> Option<T> {
            self.entries.read().unwrap().get(key).cloned()
        }

        async fn set(&self, key: &str, value: T) {
            self.entries.write().unwrap().insert(key.to_string(), value);
        }
    }

    #[tokio::test]
    async fn test_hits_skip_inner_store() {
        let inner = Arc::new(CountingClientStore {
            lookups: AtomicUsize::new(0),
        });
        let store = CachingClientStore::new(inner.clone(), Arc::new(MapCache::default()));

        assert!(store.find_client_by_id("known").await.unwrap().is_some());
        assert!(store.find_client_by_id("known").await.unwrap().is_some());
        assert_eq!(inner.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_misses_are_not_cached() {
        let inner = Arc::new(CountingClientStore {
            lookups: AtomicUsize::new(0),
        });
        let store = CachingClientStore::new(inner.clone(), Arc::new(MapCache::default()));

        assert!(store.find_client_by_id("absent").await.unwrap().is_none());
        assert!(store.find_client_by_id("absent").await.unwrap().is_none());
        assert_eq!(inner.lookups.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_scope_cache_key_is_order_independent() {
        let a = CachingScopeStore::cache_key(&["b".to_string(), "a".to_string()]);
        let b = CachingScopeStore::cache_key(&["a".to_string(), "b".to_string()]);
        assert_eq!(a, b);
    }
}
