//! Extension grant validators.
//!
//! Non-standard grant types plug into the token request pipeline through
//! [`CustomGrantValidator`]. Validation failures are logged in detail and
//! surfaced to clients as a generic `invalid_grant`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::request::RequestContext;
use crate::types::{Client, Subject};
use crate::AuthResult;

/// Outcome of a successful extension grant validation.
#[derive(Debug, Clone, Default)]
pub struct CustomGrantResult {
    /// Subject authenticated by the custom grant, absent for
    /// machine-to-machine grants.
    pub subject: Option<Subject>,
}

impl CustomGrantResult {
    /// A result for a grant that authenticated the given subject.
    #[must_use]
    pub fn for_subject(subject: Subject) -> Self {
        Self {
            subject: Some(subject),
        }
    }
}

/// Validates one extension grant type.
#[async_trait]
pub trait CustomGrantValidator: Send + Sync {
    /// The `grant_type` value this validator handles.
    fn grant_type(&self) -> &str;

    /// Validates the grant material in the request.
    ///
    /// # Errors
    ///
    /// Any error fails the token request; the detail is logged but not
    /// returned to the client.
    async fn validate(
        &self,
        context: &RequestContext,
        client: &Client,
    ) -> AuthResult<CustomGrantResult>;
}

/// Registry of extension grant validators, keyed by grant type.
#[derive(Default)]
pub struct CustomGrantRegistry {
    validators: HashMap<String, Arc<dyn CustomGrantValidator>>,
}

impl CustomGrantRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a validator. A later registration for the same grant type
    /// replaces the earlier one.
    pub fn register(&mut self, validator: Arc<dyn CustomGrantValidator>) {
        self.validators
            .insert(validator.grant_type().to_string(), validator);
    }

    /// Looks up the validator for a grant type.
    #[must_use]
    pub fn get(&self, grant_type: &str) -> Option<Arc<dyn CustomGrantValidator>> {
        self.validators.get(grant_type).cloned()
    }

    /// All registered grant types.
    #[must_use]
    pub fn grant_types(&self) -> Vec<&str> {
        self.validators.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DelegationGrant;

    #[async_trait]
    impl CustomGrantValidator for DelegationGrant {
        fn grant_type(&self) -> &str {
            "delegation"
        }

        async fn validate(
            &self,
            _context: &RequestContext,
            _client: &Client,
        ) -> AuthResult<CustomGrantResult> {
            Ok(CustomGrantResult::for_subject(Subject::new("delegated")))
        }
    }

    #[tokio::test]
    async fn test_registry_lookup() {
        let mut registry = CustomGrantRegistry::new();
        registry.register(Arc::new(DelegationGrant));

        assert!(registry.get("delegation").is_some());
        assert!(registry.get("unknown").is_none());
        assert_eq!(registry.grant_types(), vec!["delegation"]);

        let result = registry
            .get("delegation")
            .unwrap()
            .validate(&RequestContext::new(), &Client::new("app"))
            .await
            .unwrap();
        assert_eq!(result.subject.unwrap().sub, "delegated");
    }
}
