//! Session lifecycle: caching, refresh, persistence and change events.
//!
//! This module provides:
//! - `SessionManager`: the single authority on the current session
//! - `StoredSession`: a session plus its persisted expiration instant
//! - `AuthEvents` / `AuthEventStream`: signed-in / signed-out broadcast
//! - `TokenRefresher`: the injected refresh-token exchange
//!
//! A stored session counts as stale 60 seconds before its deadline, and a
//! stale session is refreshed at most once no matter how many callers ask.

pub mod error;
pub mod events;
pub mod manager;
pub mod refresher;
pub mod stored;

pub use error::{RefreshError, SessionError};
pub use events::{AuthChangeEvent, AuthEventStream, AuthEvents};
pub use manager::{SessionConfig, SessionManager, DEFAULT_REFRESH_TIMEOUT_SECS, DEFAULT_STORAGE_KEY};
pub use refresher::{RefreshFuture, TokenRefresher};
pub use stored::{StoredSession, EXPIRY_SKEW_SECS, MAX_TTL_SECS};
