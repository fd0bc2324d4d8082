//! Scope registration.

use serde::{Deserialize, Serialize};

use crate::types::secret::Secret;

/// Whether a scope names identity data or a protected resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeType {
    /// Identity scope: selects subject claims for identity tokens.
    Identity,
    /// Resource scope: grants access to an API.
    Resource,
}

/// A claim emitted for a scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeClaim {
    /// Claim type name.
    pub name: String,
}

impl ScopeClaim {
    /// Creates a scope claim.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A named permission unit.
///
/// Every requested scope name must resolve to exactly one enabled scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    /// Unique name, used in the `scope` request parameter.
    pub name: String,

    /// Display name for consent screens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Identity or resource scope.
    pub scope_type: ScopeType,

    /// Disabled scopes fail every validation.
    pub enabled: bool,

    /// Required scopes cannot be de-selected at consent.
    pub required: bool,

    /// When `true`, all subject claims are emitted regardless of `claims`.
    pub include_all_claims_for_user: bool,

    /// Claims emitted when this scope is granted.
    pub claims: Vec<ScopeClaim>,

    /// Secrets for scope (resource) authentication, e.g. at introspection.
    pub scope_secrets: Vec<Secret>,
}

impl Scope {
    /// Creates an enabled identity scope.
    #[must_use]
    pub fn identity(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            scope_type: ScopeType::Identity,
            enabled: true,
            required: false,
            include_all_claims_for_user: false,
            claims: Vec::new(),
            scope_secrets: Vec::new(),
        }
    }

    /// Creates an enabled resource scope.
    #[must_use]
    pub fn resource(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            scope_type: ScopeType::Resource,
            enabled: true,
            required: false,
            include_all_claims_for_user: false,
            claims: Vec::new(),
            scope_secrets: Vec::new(),
        }
    }

    /// The standard `openid` scope (required, emits `sub`).
    #[must_use]
    pub fn open_id() -> Self {
        let mut scope = Self::identity("openid");
        scope.required = true;
        scope.claims = vec![ScopeClaim::new("sub")];
        scope
    }

    /// The standard `offline_access` scope.
    #[must_use]
    pub fn offline_access() -> Self {
        Self::resource(OFFLINE_ACCESS)
    }

    /// Marks the scope as required.
    #[must_use]
    pub fn require(mut self) -> Self {
        self.required = true;
        self
    }

    /// Adds emitted claims by name.
    #[must_use]
    pub fn with_claims<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.claims = names.into_iter().map(ScopeClaim::new).collect();
        self
    }
}

/// Name of the refresh-token-requesting scope.
pub const OFFLINE_ACCESS: &str = "offline_access";
