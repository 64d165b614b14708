//! authkeep - client-side session lifecycle for GoTrue-style identity providers.
//!
//! The heart of the crate is [`SessionManager`]: it keeps the current
//! session in a [`SecureStore`], treats it as stale shortly before it
//! expires, coalesces concurrent refreshes into one network exchange, and
//! broadcasts signed-in / signed-out transitions.
//!
//! [`AuthClient`] wires the manager to the provider's sign-up, sign-in and
//! one-time-password flows over HTTP.

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod models;
pub mod store;

pub use api::{ApiError, GoTrueApi};
pub use auth::{
    AuthChangeEvent, AuthEventStream, AuthEvents, RefreshError, SessionConfig, SessionError,
    SessionManager, StoredSession, TokenRefresher,
};
pub use client::AuthClient;
pub use config::ClientConfig;
pub use models::{Session, SessionOrUser, User};
pub use store::{EncryptedFileStore, KeyringStore, MemoryStore, SecureStore, StoreError};

/// Route `tracing` output through the test harness, filtered by `RUST_LOG`.
#[cfg(test)]
pub(crate) fn init_test_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
