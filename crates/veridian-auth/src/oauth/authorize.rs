//! Authorization code issuance.
//!
//! The authorize endpoint's success path ends here: a validated request is
//! frozen into an [`AuthorizationCode`] and stored under a random one-time
//! handle that is sent back to the client as the `code` parameter.

use std::sync::Arc;

use crate::AuthResult;
use crate::crypto;
use crate::events::{Event, EventSink};
use crate::storage::AuthorizationCodeStore;
use crate::types::AuthorizationCode;

/// Mints and stores authorization codes.
pub struct AuthorizationCodeIssuer {
    store: Arc<dyn AuthorizationCodeStore>,
    events: Arc<dyn EventSink>,
}

impl AuthorizationCodeIssuer {
    /// Creates an issuer over the given code store.
    #[must_use]
    pub fn new(store: Arc<dyn AuthorizationCodeStore>, events: Arc<dyn EventSink>) -> Self {
        Self { store, events }
    }

    /// Stores `code` under a fresh random handle and returns the handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn issue(&self, code: AuthorizationCode) -> AuthResult<String> {
        let handle = crypto::generate_handle();
        let client_id = code.client_id.clone();
        self.store.store(&handle, code).await?;
        self.events
            .raise(Event::AuthorizationCodeIssued { client_id })
            .await;
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Subject;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::RwLock;

    #[derive(Default)]
    struct MockCodeStore {
        codes: RwLock<HashMap<String, AuthorizationCode>>,
    }

    #[async_trait]
    impl AuthorizationCodeStore for MockCodeStore {
        async fn store(&self, handle: &str, code: AuthorizationCode) -> AuthResult<()> {
            self.codes
                .write()
                .unwrap()
                .insert(handle.to_string(), code);
            Ok(())
        }

        async fn get(&self, handle: &str) -> AuthResult<Option<AuthorizationCode>> {
            Ok(self.codes.read().unwrap().get(handle).cloned())
        }

        async fn remove(&self, handle: &str) -> AuthResult<()> {
            self.codes.write().unwrap().remove(handle);
            Ok(())
        }
    }

    #[derive(Default)]
    struct NullSink;

    #[async_trait]
    impl EventSink for NullSink {
        async fn raise(&self, _event: Event) {}
    }

    #[tokio::test]
    async fn test_issue_returns_resolvable_handle() {
        let store = Arc::new(MockCodeStore::default());
        let issuer = AuthorizationCodeIssuer::new(store.clone(), Arc::new(NullSink));

        let code = AuthorizationCode {
            client_id: "codeclient".to_string(),
            subject: Subject::new("alice"),
            created_at: time::OffsetDateTime::now_utc(),
            is_open_id: true,
            requested_scopes: vec!["openid".to_string()],
            granted_scopes: vec!["openid".to_string()],
            redirect_uri: "https://app.example.com/cb".to_string(),
            nonce: None,
            session_id: None,
            code_challenge: None,
            code_challenge_method: None,
        };

        let handle = issuer.issue(code).await.unwrap();
        assert_eq!(handle.len(), 43);
        let stored = store.get(&handle).await.unwrap().unwrap();
        assert_eq!(stored.client_id, "codeclient");
        assert!(stored.is_open_id);
    }
}
