//! Post-issuance liveness checks.
//!
//! A structurally valid token is still rejected when its subject has been
//! deactivated or its client disabled since issuance.

use std::sync::Arc;

use crate::error::AuthError;
use crate::storage::{ClientStore, UserService};
use crate::AuthResult;

/// Re-checks subject and client liveness for an already-validated token.
pub struct TokenLivenessValidator {
    users: Arc<dyn UserService>,
    clients: Arc<dyn ClientStore>,
}

impl TokenLivenessValidator {
    /// Creates a validator over the given collaborators.
    #[must_use]
    pub fn new(users: Arc<dyn UserService>, clients: Arc<dyn ClientStore>) -> Self {
        Self { users, clients }
    }

    /// Fails with [`AuthError::InvalidToken`] when the subject is inactive
    /// or the client is unknown or disabled.
    ///
    /// # Errors
    ///
    /// Propagates store failures; liveness violations surface as
    /// `InvalidToken`.
    pub async fn check(
        &self,
        subject_id: Option<&str>,
        client_id: Option<&str>,
    ) -> AuthResult<()> {
        if let Some(sub) = subject_id {
            if !self.users.is_active(sub).await? {
                tracing::warn!(subject = %sub, "token subject is no longer active");
                return Err(AuthError::invalid_token("subject is no longer active"));
            }
        }
        if let Some(client_id) = client_id {
            match self.clients.find_client_by_id(client_id).await? {
                Some(client) if client.enabled => {}
                _ => {
                    tracing::warn!(client_id = %client_id, "token client is unknown or disabled");
                    return Err(AuthError::invalid_token("client is no longer valid"));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Claim, Client, Subject};
    use async_trait::async_trait;

    struct MockUserService {
        active: bool,
    }

    #[async_trait]
    impl UserService for MockUserService {
        async fn claims_for_subject(
            &self,
            _subject: &Subject,
            _requested: Option<&[String]>,
        ) -> AuthResult<Vec<Claim>> {
            Ok(vec![])
        }

        async fn is_active(&self, _subject_id: &str) -> AuthResult<bool> {
            Ok(self.active)
        }

        async fn authenticate_local(
            &self,
            _username: &str,
            _password: &str,
        ) -> AuthResult<Option<Subject>> {
            Ok(None)
        }
    }

    struct MockClientStore {
        client: Option<Client>,
    }

    #[async_trait]
    impl ClientStore for MockClientStore {
        async fn find_client_by_id(&self, _client_id: &str) -> AuthResult<Option<Client>> {
            Ok(self.client.clone())
        }
    }

    fn validator(active: bool, client: Option<Client>) -> TokenLivenessValidator {
        TokenLivenessValidator::new(
            Arc::new(MockUserService { active }),
            Arc::new(MockClientStore { client }),
        )
    }

    #[tokio::test]
    async fn test_active_subject_and_enabled_client_pass() {
        let v = validator(true, Some(Client::new("app")));
        assert!(v.check(Some("123"), Some("app")).await.is_ok());
    }

    #[tokio::test]
    async fn test_inactive_subject_fails() {
        let v = validator(false, Some(Client::new("app")));
        let err = v.check(Some("123"), Some("app")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken { .. }));
    }

    #[tokio::test]
    async fn test_disabled_or_missing_client_fails() {
        let mut disabled = Client::new("app");
        disabled.enabled = false;
        let v = validator(true, Some(disabled));
        assert!(v.check(None, Some("app")).await.is_err());

        let v = validator(true, None);
        assert!(v.check(None, Some("app")).await.is_err());
    }

    #[tokio::test]
    async fn test_machine_token_without_subject_skips_user_check() {
        let v = validator(false, Some(Client::new("app")));
        assert!(v.check(None, Some("app")).await.is_ok());
    }
}
