//! Claims and authenticated subjects.
//!
//! A token's claim set is an ordered sequence of typed claims, not a loosely
//! typed object graph: each claim carries an explicit value type so that JSON
//! serialization of a payload preserves it (integer claims serialize as JSON
//! numbers, not strings).

use serde::{Deserialize, Serialize};

/// Well-known claim type names.
pub mod claim_types {
    /// Subject identifier.
    pub const SUBJECT: &str = "sub";
    /// Nonce mirrored from the authorization request.
    pub const NONCE: &str = "nonce";
    /// Issued-at, epoch seconds.
    pub const ISSUED_AT: &str = "iat";
    /// Access token hash.
    pub const ACCESS_TOKEN_HASH: &str = "at_hash";
    /// Authorization code hash.
    pub const AUTHORIZATION_CODE_HASH: &str = "c_hash";
    /// Session identifier.
    pub const SESSION_ID: &str = "sid";
    /// Authentication time, epoch seconds.
    pub const AUTH_TIME: &str = "auth_time";
    /// Identity provider used for authentication.
    pub const IDENTITY_PROVIDER: &str = "idp";
    /// OAuth client identifier.
    pub const CLIENT_ID: &str = "client_id";
    /// Granted scope name.
    pub const SCOPE: &str = "scope";
    /// Unique token identifier.
    pub const JWT_ID: &str = "jti";
    /// Proof-of-possession confirmation.
    pub const CONFIRMATION: &str = "cnf";
}

/// A claim value with an explicit type tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimValue {
    /// String value.
    String(String),
    /// Integer value, serialized as a JSON number.
    Integer(i64),
    /// Boolean value.
    Boolean(bool),
    /// Structured JSON value.
    Json(serde_json::Value),
}

impl ClaimValue {
    /// Converts to a `serde_json::Value`, preserving the declared type.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Integer(i) => serde_json::Value::Number((*i).into()),
            Self::Boolean(b) => serde_json::Value::Bool(*b),
            Self::Json(v) => v.clone(),
        }
    }

    /// Returns the string content if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// A single (type, value) claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Claim type name, e.g. `sub` or `scope`.
    #[serde(rename = "type")]
    pub claim_type: String,

    /// Claim value with its type tag.
    pub value: ClaimValue,
}

impl Claim {
    /// Creates a string claim.
    #[must_use]
    pub fn string(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: ClaimValue::String(value.into()),
        }
    }

    /// Creates an integer claim.
    #[must_use]
    pub fn integer(claim_type: impl Into<String>, value: i64) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: ClaimValue::Integer(value),
        }
    }

    /// Creates a boolean claim.
    #[must_use]
    pub fn boolean(claim_type: impl Into<String>, value: bool) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: ClaimValue::Boolean(value),
        }
    }

    /// Creates a JSON-valued claim.
    #[must_use]
    pub fn json(claim_type: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: ClaimValue::Json(value),
        }
    }
}

/// Removes duplicate claims, comparing the full (type, value, value-type)
/// triple and preserving first-seen order.
#[must_use]
pub fn dedup_claims(claims: Vec<Claim>) -> Vec<Claim> {
    let mut result: Vec<Claim> = Vec::with_capacity(claims.len());
    for claim in claims {
        if !result.contains(&claim) {
            result.push(claim);
        }
    }
    result
}

/// An authenticated end-user principal flowing through token creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    /// Stable subject identifier.
    pub sub: String,

    /// When the subject authenticated, epoch seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_time: Option<i64>,

    /// Identity provider that authenticated the subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_provider: Option<String>,
}

impl Subject {
    /// Creates a subject with just an identifier.
    #[must_use]
    pub fn new(sub: impl Into<String>) -> Self {
        Self {
            sub: sub.into(),
            auth_time: None,
            identity_provider: None,
        }
    }

    /// Sets the authentication time.
    #[must_use]
    pub fn with_auth_time(mut self, auth_time: i64) -> Self {
        self.auth_time = Some(auth_time);
        self
    }

    /// Sets the identity provider.
    #[must_use]
    pub fn with_identity_provider(mut self, idp: impl Into<String>) -> Self {
        self.identity_provider = Some(idp.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_distinguishes_duplicates() {
        // "5" as a string and 5 as an integer are different claims.
        let claims = vec![
            Claim::string("level", "5"),
            Claim::integer("level", 5),
            Claim::string("level", "5"),
        ];
        let deduped = dedup_claims(claims);
        assert_eq!(deduped.len(), 2);
    }

    #[test]
    fn test_dedup_preserves_order() {
        let claims = vec![
            Claim::string("scope", "openid"),
            Claim::string("scope", "email"),
            Claim::string("scope", "openid"),
            Claim::string("sub", "123"),
        ];
        let deduped = dedup_claims(claims);
        assert_eq!(deduped.len(), 3);
        assert_eq!(deduped[0].value.as_str(), Some("openid"));
        assert_eq!(deduped[1].value.as_str(), Some("email"));
        assert_eq!(deduped[2].claim_type, "sub");
    }

    #[test]
    fn test_integer_claims_serialize_as_numbers() {
        let claim = Claim::integer(claim_types::ISSUED_AT, 1_700_000_000);
        let json = serde_json::to_value(&claim).unwrap();
        assert_eq!(json["value"], serde_json::json!(1_700_000_000));
        assert!(json["value"].is_i64());
    }
}
