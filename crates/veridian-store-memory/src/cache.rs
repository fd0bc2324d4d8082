//! TTL cache for the read-mostly store decorators.

use std::collections::HashMap;

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;
use veridian_auth::storage::Cache;

/// Cache whose entries expire a fixed duration after insertion.
pub struct TtlCache<T> {
    ttl: Duration,
    entries: RwLock<HashMap<String, (OffsetDateTime, T)>>,
}

impl<T> TtlCache<T> {
    /// A cache expiring entries `ttl` after they are set.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Cache<T> for TtlCache<T> {
    async fn get(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().await;
        let (expires_at, value) = entries.get(key)?;
        if OffsetDateTime::now_utc() > *expires_at {
            // Stale entries are overwritten by the next set.
            return None;
        }
        Some(value.clone())
    }

    async fn set(&self, key: &str, value: T) {
        let expires_at = OffsetDateTime::now_utc() + self.ttl;
        self.entries
            .write()
            .await
            .insert(key.to_string(), (expires_at, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fresh_entries_hit() {
        let cache = TtlCache::new(Duration::minutes(5));
        cache.set("k", 42u32).await;
        assert_eq!(cache.get("k").await, Some(42));
        assert_eq!(cache.get("absent").await, None);
    }

    #[tokio::test]
    async fn test_expired_entries_miss() {
        let cache = TtlCache::new(Duration::seconds(-1));
        cache.set("k", 42u32).await;
        assert_eq!(cache.get("k").await, None);
    }
}
