//! Fixture-backed user service.

use async_trait::async_trait;
use tokio::sync::RwLock;
use veridian_auth::storage::UserService;
use veridian_auth::types::{Claim, Subject};
use veridian_auth::AuthResult;

/// A user record for tests and examples.
#[derive(Debug, Clone)]
pub struct TestUser {
    /// Stable subject identifier.
    pub subject_id: String,
    /// Login name for the password grant.
    pub username: String,
    /// Plain-text password, fixture only.
    pub password: String,
    /// Profile claims.
    pub claims: Vec<Claim>,
    /// Liveness flag.
    pub active: bool,
}

impl TestUser {
    /// An active user with no claims.
    #[must_use]
    pub fn new(
        subject_id: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            username: username.into(),
            password: password.into(),
            claims: Vec::new(),
            active: true,
        }
    }

    /// Adds profile claims.
    #[must_use]
    pub fn with_claims(mut self, claims: Vec<Claim>) -> Self {
        self.claims = claims;
        self
    }
}

/// User service over a fixed set of [`TestUser`]s.
#[derive(Default)]
pub struct InMemoryUserService {
    users: RwLock<Vec<TestUser>>,
}

impl InMemoryUserService {
    /// A service pre-populated with the given users.
    #[must_use]
    pub fn with_users(users: impl IntoIterator<Item = TestUser>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().collect()),
        }
    }

    /// Deactivates a user, making issued tokens fail liveness checks.
    pub async fn deactivate(&self, subject_id: &str) {
        for user in self.users.write().await.iter_mut() {
            if user.subject_id == subject_id {
                user.active = false;
            }
        }
    }
}

#[async_trait]
impl UserService for InMemoryUserService {
    async fn claims_for_subject(
        &self,
        subject: &Subject,
        requested_claim_types: Option<&[String]>,
    ) -> AuthResult<Vec<Claim>> {
        let users = self.users.read().await;
        let Some(user) = users.iter().find(|u| u.subject_id == subject.sub) else {
            return Ok(Vec::new());
        };
        Ok(match requested_claim_types {
            None => user.claims.clone(),
            Some(names) => user
                .claims
                .iter()
                .filter(|c| names.iter().any(|n| n == &c.claim_type))
                .cloned()
                .collect(),
        })
    }

    async fn is_active(&self, subject_id: &str) -> AuthResult<bool> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|u| u.subject_id == subject_id)
            .is_some_and(|u| u.active))
    }

    async fn authenticate_local(
        &self,
        username: &str,
        password: &str,
    ) -> AuthResult<Option<Subject>> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|u| u.username == username && u.password == password && u.active)
            .map(|u| Subject::new(u.subject_id.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> InMemoryUserService {
        InMemoryUserService::with_users([TestUser::new("123", "alice", "pass")
            .with_claims(vec![Claim::string("email", "alice@example.com")])])
    }

    #[tokio::test]
    async fn test_authenticate_local() {
        let users = service();
        let subject = users.authenticate_local("alice", "pass").await.unwrap();
        assert_eq!(subject.unwrap().sub, "123");
        assert!(users
            .authenticate_local("alice", "wrong")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_deactivation() {
        let users = service();
        assert!(users.is_active("123").await.unwrap());
        users.deactivate("123").await;
        assert!(!users.is_active("123").await.unwrap());
        assert!(users
            .authenticate_local("alice", "pass")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_claim_filtering() {
        let users = service();
        let filtered = users
            .claims_for_subject(&Subject::new("123"), Some(&["phone".to_string()]))
            .await
            .unwrap();
        assert!(filtered.is_empty());
    }
}
