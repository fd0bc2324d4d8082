//! In-memory implementations of the `veridian-auth` storage traits.
//!
//! Intended for tests, examples, and single-node embedding. All stores are
//! `RwLock<HashMap>` based and safe for concurrent use from a Tokio
//! runtime; nothing survives a restart.

mod cache;
mod events;
mod grants;
mod stores;
mod users;

pub use cache::TtlCache;
pub use events::RecordingEventSink;
pub use grants::{
    InMemoryAuthorizationCodeStore, InMemoryRefreshTokenStore, InMemoryTokenHandleStore,
};
pub use stores::{InMemoryClientStore, InMemoryScopeStore};
pub use users::{InMemoryUserService, TestUser};
