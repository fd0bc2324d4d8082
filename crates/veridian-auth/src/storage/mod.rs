//! Store traits for the pipeline's external collaborators.
//!
//! Stores own persistence and their own concurrency control; the core treats
//! each call as an atomic request/response operation and only ever holds
//! in-flight, request-scoped copies.
//!
//! Implementations live in separate crates:
//!
//! - `veridian-store-memory` - in-memory stores for tests and embedding

pub mod cache;
pub mod client;
pub mod grants;
pub mod scope;
pub mod user;

pub use cache::{Cache, CachingClientStore, CachingScopeStore};
pub use client::ClientStore;
pub use grants::{AuthorizationCodeStore, RefreshTokenStore, TokenHandleStore};
pub use scope::ScopeStore;
pub use user::UserService;
