//! Scope parsing and validation.
//!
//! Validates requested scope names against the scope store and against a
//! client's allow-list, and tracks what kinds of scopes a request contains
//! so the authorize flow can check response-type compatibility.

use std::sync::Arc;

use crate::storage::ScopeStore;
use crate::types::scope::OFFLINE_ACCESS;
use crate::types::{Client, Scope, ScopeType};
use crate::AuthResult;

/// Splits a raw `scope` parameter into sorted, de-duplicated names.
///
/// Returns `None` when the parameter contains no names at all.
#[must_use]
pub fn parse_scopes_string(scopes: &str) -> Option<Vec<String>> {
    let mut names: Vec<String> = scopes
        .split(' ')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if names.is_empty() {
        return None;
    }
    names.sort();
    names.dedup();
    Some(names)
}

/// Stateful validator for one request's scopes.
///
/// The `contains_*` flags describe the most recently validated set and feed
/// response-type checks and token issuance decisions.
pub struct ScopeValidator {
    store: Arc<dyn ScopeStore>,
    requested: Vec<Scope>,
    granted: Vec<Scope>,
    contains_open_id_scopes: bool,
    contains_resource_scopes: bool,
    contains_offline_access_scope: bool,
}

impl ScopeValidator {
    /// Creates a validator over the given scope store.
    #[must_use]
    pub fn new(store: Arc<dyn ScopeStore>) -> Self {
        Self {
            store,
            requested: Vec::new(),
            granted: Vec::new(),
            contains_open_id_scopes: false,
            contains_resource_scopes: false,
            contains_offline_access_scope: false,
        }
    }

    /// Whether the validated set contains identity scopes.
    #[must_use]
    pub fn contains_open_id_scopes(&self) -> bool {
        self.contains_open_id_scopes
    }

    /// Whether the validated set contains resource scopes.
    #[must_use]
    pub fn contains_resource_scopes(&self) -> bool {
        self.contains_resource_scopes
    }

    /// Whether the validated set contains `offline_access`.
    #[must_use]
    pub fn contains_offline_access_scope(&self) -> bool {
        self.contains_offline_access_scope
    }

    /// The scopes accepted by the last successful validation.
    #[must_use]
    pub fn requested_scopes(&self) -> &[Scope] {
        &self.requested
    }

    /// The scopes remaining after consent filtering.
    #[must_use]
    pub fn granted_scopes(&self) -> &[Scope] {
        &self.granted
    }

    /// Checks that every requested name resolves to an enabled stored scope.
    ///
    /// On success the validator retains the resolved scopes and recomputes
    /// the `contains_*` flags.
    ///
    /// # Errors
    ///
    /// Propagates scope store failures.
    pub async fn are_scopes_valid(&mut self, requested: &[String]) -> AuthResult<bool> {
        let found = self.store.find_scopes_by_name(requested).await?;

        let mut resolved = Vec::with_capacity(requested.len());
        for name in requested {
            match found.iter().find(|s| &s.name == name) {
                Some(scope) if scope.enabled => resolved.push(scope.clone()),
                Some(_) => {
                    tracing::warn!(scope = %name, "requested scope is disabled");
                    return Ok(false);
                }
                None => {
                    tracing::warn!(scope = %name, "requested scope is unknown");
                    return Ok(false);
                }
            }
        }

        self.requested = resolved;
        self.granted = self.requested.clone();
        self.recompute_flags();
        Ok(true)
    }

    /// Checks the requested names against the client's allow-list.
    #[must_use]
    pub fn are_scopes_allowed(&self, client: &Client, requested: &[String]) -> bool {
        if client.allow_access_to_all_scopes {
            return true;
        }
        for name in requested {
            if !client.allowed_scopes.iter().any(|s| s == name) {
                tracing::warn!(client_id = %client.client_id, scope = %name, "scope not allowed for client");
                return false;
            }
        }
        true
    }

    /// Checks that the response type is compatible with the validated set.
    ///
    /// `token` requires resource-only scopes, `id_token` identity-only
    /// scopes, and any combination involving `id_token` requires at least
    /// one identity scope. A bare `code` has no constraint.
    #[must_use]
    pub fn is_response_type_valid(&self, response_type: &str) -> bool {
        match response_type {
            "code" => true,
            "token" => {
                if self.contains_open_id_scopes {
                    tracing::warn!("identity scopes requested with response_type token");
                    return false;
                }
                true
            }
            "id_token" => {
                if self.contains_resource_scopes {
                    tracing::warn!("resource scopes requested with response_type id_token");
                    return false;
                }
                if !self.contains_open_id_scopes {
                    tracing::warn!("no identity scopes requested with response_type id_token");
                    return false;
                }
                true
            }
            "id_token token" | "code id_token" | "code token" | "code id_token token" => {
                if !self.contains_open_id_scopes {
                    tracing::warn!(response_type, "no identity scopes requested");
                    return false;
                }
                true
            }
            other => {
                tracing::warn!(response_type = other, "unsupported response type");
                false
            }
        }
    }

    /// Reduces the granted set to required scopes plus the user's consent.
    ///
    /// Required scopes survive regardless of consent. The flags are
    /// recomputed from the reduced set.
    pub fn set_consented_scopes(&mut self, consented: &[String]) {
        self.granted = self
            .requested
            .iter()
            .filter(|s| s.required || consented.iter().any(|c| c == &s.name))
            .cloned()
            .collect();
        self.recompute_flags();
    }

    fn recompute_flags(&mut self) {
        self.contains_open_id_scopes = self
            .granted
            .iter()
            .any(|s| s.scope_type == ScopeType::Identity);
        self.contains_resource_scopes = self
            .granted
            .iter()
            .any(|s| s.scope_type == ScopeType::Resource && s.name != OFFLINE_ACCESS);
        self.contains_offline_access_scope = self.granted.iter().any(|s| s.name == OFFLINE_ACCESS);
    }
}
