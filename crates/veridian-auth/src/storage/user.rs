//! User service collaborator.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::{Claim, Subject};

/// External user store the core consults for subject claims and liveness.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Returns the subject's profile claims.
    ///
    /// When `requested_claim_types` is `Some`, only claims whose type appears
    /// in the list are returned; `None` means all claims.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn claims_for_subject(
        &self,
        subject: &Subject,
        requested_claim_types: Option<&[String]>,
    ) -> AuthResult<Vec<Claim>>;

    /// Returns `true` if the subject is still active (not deactivated,
    /// locked, or deleted). Consulted when re-validating issued tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn is_active(&self, subject_id: &str) -> AuthResult<bool>;

    /// Authenticates a resource-owner username and password.
    ///
    /// Returns the authenticated subject, or `None` when the credentials do
    /// not match. Used by the password grant.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn authenticate_local(
        &self,
        username: &str,
        password: &str,
    ) -> AuthResult<Option<Subject>>;
}
