//! Audit events for security-relevant operations.
//!
//! The event sink is fire-and-forget: the pipeline raises events as an
//! observable side effect and never blocks on or fails because of the sink.
//! Orchestrators that authenticate credentials raise exactly one event
//! (success or failure) per call.

use async_trait::async_trait;
use serde::Serialize;

/// Security events raised by the token pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A client authenticated successfully.
    ClientAuthenticationSuccess {
        /// The authenticated client.
        client_id: String,
    },

    /// Client authentication failed.
    ClientAuthenticationFailure {
        /// The claimed client id, or `"unknown"` when none was parsed.
        client_id: String,
        /// Why authentication failed.
        message: String,
    },

    /// A scope (resource) authenticated successfully.
    ScopeAuthenticationSuccess {
        /// The authenticated scope.
        scope: String,
    },

    /// Scope authentication failed.
    ScopeAuthenticationFailure {
        /// The claimed scope name, or `"unknown"` when none was parsed.
        scope: String,
        /// Why authentication failed.
        message: String,
    },

    /// An authorization code was issued.
    AuthorizationCodeIssued {
        /// The client the code was issued to.
        client_id: String,
    },

    /// An authorization code was redeemed at the token endpoint.
    AuthorizationCodeRedeemed {
        /// The client that redeemed the code.
        client_id: String,
    },

    /// A token was created and signed or stored.
    TokenIssued {
        /// `access_token` or `id_token`.
        token_type: String,
        /// The client the token was issued to.
        client_id: String,
    },

    /// A refresh token was issued.
    RefreshTokenIssued {
        /// The client the token was issued to.
        client_id: String,
    },

    /// A refresh token was used and rotated or extended.
    RefreshTokenRefreshed {
        /// Handle that was presented.
        old_handle: String,
        /// Handle valid after the refresh (same as `old_handle` unless
        /// rotated).
        new_handle: String,
    },
}

/// Fire-and-forget audit/telemetry sink.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Records an event. Must not fail; sinks swallow their own errors.
    async fn raise(&self, event: Event);
}

/// Event sink that emits structured `tracing` records.
#[derive(Debug, Default)]
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn raise(&self, event: Event) {
        match serde_json::to_string(&event) {
            Ok(json) => tracing::info!(target: "veridian::audit", event = %json),
            Err(e) => tracing::warn!(target: "veridian::audit", error = %e, "unserializable event"),
        }
    }
}
