//! Refresh token lifecycle.
//!
//! Creation picks the initial lifetime from the client's expiration policy.
//! On use, one-time-only tokens rotate to a new handle and sliding tokens
//! extend their lifetime, capped by the absolute maximum.

use std::sync::Arc;

use time::OffsetDateTime;

use crate::crypto;
use crate::events::{Event, EventSink};
use crate::storage::RefreshTokenStore;
use crate::types::{
    Client, RefreshToken, RefreshTokenExpiration, RefreshTokenUsage, Token,
};
use crate::AuthResult;

/// Refresh token schema version stamped into new tokens.
const REFRESH_TOKEN_VERSION: u32 = 3;

/// Creates and rotates refresh tokens.
pub struct RefreshTokenService {
    store: Arc<dyn RefreshTokenStore>,
    events: Arc<dyn EventSink>,
}

impl RefreshTokenService {
    /// Creates a service over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn RefreshTokenStore>, events: Arc<dyn EventSink>) -> Self {
        Self { store, events }
    }

    /// Issues a new refresh token wrapping the access token entity.
    ///
    /// Returns the opaque handle.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub async fn create(
        &self,
        subject_id: impl Into<String>,
        access_token: Token,
        client: &Client,
    ) -> AuthResult<String> {
        let lifetime = match client.refresh_token_expiration {
            RefreshTokenExpiration::Absolute => client.absolute_refresh_token_lifetime,
            RefreshTokenExpiration::Sliding => client.sliding_refresh_token_lifetime,
        };

        let token = RefreshToken {
            created_at: OffsetDateTime::now_utc(),
            lifetime,
            access_token,
            subject_id: subject_id.into(),
            version: REFRESH_TOKEN_VERSION,
        };

        let handle = crypto::generate_handle();
        self.store.store(&handle, token).await?;
        self.events
            .raise(Event::RefreshTokenIssued {
                client_id: client.client_id.clone(),
            })
            .await;
        tracing::debug!(client_id = %client.client_id, "refresh token created");
        Ok(handle)
    }

    /// Applies the client's usage and expiration policy after a successful
    /// refresh, returning the handle the caller must hand back.
    ///
    /// One-time-only usage rotates the handle; sliding expiration extends
    /// the lifetime to `age + sliding_lifetime`, never beyond the absolute
    /// maximum. The store is only written when something changed.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub async fn update(
        &self,
        handle: &str,
        mut token: RefreshToken,
        client: &Client,
    ) -> AuthResult<String> {
        let mut needs_store = false;
        let mut current_handle = handle.to_string();

        if client.refresh_token_usage == RefreshTokenUsage::OneTimeOnly {
            let new_handle = crypto::generate_handle();
            self.store.remove(&current_handle).await?;
            current_handle = new_handle;
            needs_store = true;
        }

        if client.refresh_token_expiration == RefreshTokenExpiration::Sliding {
            let extended = token
                .age_seconds()
                .saturating_add(client.sliding_refresh_token_lifetime);
            let new_lifetime = extended.min(client.absolute_refresh_token_lifetime);
            if new_lifetime != token.lifetime {
                token.lifetime = new_lifetime;
                needs_store = true;
            }
        }

        if needs_store {
            self.store.store(&current_handle, token).await?;
        }
        // Every successful refresh is audited, rotation or not.
        self.events
            .raise(Event::RefreshTokenRefreshed {
                old_handle: handle.to_string(),
                new_handle: current_handle.clone(),
            })
            .await;
        Ok(current_handle)
    }
}
