//! Request-context value object.
//!
//! The hosting layer is out of scope; the core consumes inbound requests
//! through this explicit value object instead of a stringly-typed property
//! bag. It carries the three things the pipeline needs: headers, the form
//! body (parsed once, cached for the request's lifetime), and the TLS peer
//! certificate.

use std::collections::HashMap;
use std::sync::OnceLock;

/// An abstracted inbound request.
#[derive(Debug, Default)]
pub struct RequestContext {
    headers: HashMap<String, String>,
    body: Option<String>,
    form: OnceLock<HashMap<String, String>>,
    peer_certificate: Option<Vec<u8>>,
}

impl RequestContext {
    /// Creates an empty request context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header (names are case-insensitive).
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_lowercase(), value.into());
        self
    }

    /// Sets the raw `application/x-www-form-urlencoded` body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the DER-encoded TLS peer certificate.
    #[must_use]
    pub fn with_peer_certificate(mut self, der: Vec<u8>) -> Self {
        self.peer_certificate = Some(der);
        self
    }

    /// Looks up a header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    /// The parsed form body. Parsed on first access and cached.
    pub fn form(&self) -> &HashMap<String, String> {
        self.form.get_or_init(|| {
            let Some(body) = self.body.as_deref() else {
                return HashMap::new();
            };
            url::form_urlencoded::parse(body.as_bytes())
                .into_owned()
                .collect()
        })
    }

    /// Looks up a single form value.
    #[must_use]
    pub fn form_value(&self, key: &str) -> Option<&str> {
        self.form().get(key).map(String::as_str)
    }

    /// The DER-encoded TLS peer certificate, when mutual TLS was used.
    #[must_use]
    pub fn peer_certificate(&self) -> Option<&[u8]> {
        self.peer_certificate.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let ctx = RequestContext::new().with_header("Authorization", "Basic abc");
        assert_eq!(ctx.header("authorization"), Some("Basic abc"));
        assert_eq!(ctx.header("AUTHORIZATION"), Some("Basic abc"));
        assert_eq!(ctx.header("x-other"), None);
    }

    #[test]
    fn test_form_parsing() {
        let ctx = RequestContext::new().with_body("grant_type=authorization_code&code=abc%20def");
        assert_eq!(ctx.form_value("grant_type"), Some("authorization_code"));
        assert_eq!(ctx.form_value("code"), Some("abc def"));
        assert_eq!(ctx.form_value("missing"), None);
    }

    #[test]
    fn test_empty_body_yields_empty_form() {
        let ctx = RequestContext::new();
        assert!(ctx.form().is_empty());
    }
}
