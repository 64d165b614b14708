//! The session manager: single owner of "the current session".
//!
//! State per manager:
//!
//! ```text
//!  NoSession ──update()──→ ValidCached ──time passes──→ Stale
//!      ↑                        ↑                          │
//!      │                        │ success       current_session()
//!  remove()                     │                          ↓
//!  (from any state)             └─────────────────── Refreshing
//!                                   failure → Stale, store untouched
//! ```
//!
//! All mutations (update, remove, starting a refresh, persisting and
//! clearing its result) happen under one async mutex. The refresh itself
//! runs on a spawned task and is shared: every caller that finds it in
//! flight awaits the same outcome instead of starting another exchange.
//! Store calls made from async code go through the blocking thread pool.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{AuthChangeEvent, AuthEventStream, AuthEvents, RefreshError, SessionError, StoredSession, TokenRefresher};
use crate::models::Session;
use crate::store::{SecureStore, StoreError};

/// Store key the session is persisted under
pub const DEFAULT_STORAGE_KEY: &str = "authkeep.session";

/// Upper bound on a single refresh exchange, in seconds
pub const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub storage_key: String,
    /// `None` lets a refresh run for as long as the refresher takes.
    pub refresh_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            refresh_timeout: Some(Duration::from_secs(DEFAULT_REFRESH_TIMEOUT_SECS)),
        }
    }
}

type SharedRefresh = Shared<BoxFuture<'static, Result<Session, SessionError>>>;

#[derive(Default)]
struct RefreshState {
    in_flight: Option<SharedRefresh>,
}

struct Inner {
    store: Arc<dyn SecureStore>,
    refresher: Arc<dyn TokenRefresher>,
    config: SessionConfig,
    events: AuthEvents,
    state: Mutex<RefreshState>,
}

/// Caches, refreshes and persists the current session.
///
/// Clone is cheap; clones share the same state, store and event channel.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    /// Create a manager over `store`, using `refresher` for stale sessions.
    ///
    /// The event stream starts at `SignedIn` if a session is already
    /// persisted, `SignedOut` otherwise.
    pub fn new(
        store: Arc<dyn SecureStore>,
        refresher: impl TokenRefresher,
        config: SessionConfig,
    ) -> Self {
        let inner = Inner {
            store,
            refresher: Arc::new(refresher),
            config,
            events: AuthEvents::new(AuthChangeEvent::SignedOut),
            state: Mutex::new(RefreshState::default()),
        };

        let initial = match inner.load() {
            Ok(Some(_)) => AuthChangeEvent::SignedIn,
            Ok(None) => AuthChangeEvent::SignedOut,
            Err(e) => {
                warn!(error = %e, "Could not read stored session at startup");
                AuthChangeEvent::SignedOut
            }
        };
        inner.events.emit(initial);
        debug!(key = %inner.config.storage_key, %initial, "Session manager ready");

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Return a session that is valid right now, refreshing it if stale.
    ///
    /// At most one refresh runs at a time; callers arriving while it is in
    /// flight get its result, success or error, without triggering another.
    pub async fn current_session(&self) -> Result<Session, SessionError> {
        let refresh = {
            let mut state = self.inner.state.lock().await;
            match state.in_flight.clone() {
                Some(refresh) => {
                    debug!("Joining in-flight session refresh");
                    refresh
                }
                None => {
                    let stored = self.inner.load_blocking().await?.ok_or(SessionError::NotFound)?;
                    if stored.is_valid() {
                        debug!(expires_at = %stored.expiration_date, "Using cached session");
                        return Ok(stored.session);
                    }
                    let refresh = self.start_refresh(stored);
                    state.in_flight = Some(refresh.clone());
                    refresh
                }
            }
        };
        refresh.await
    }

    /// Persist `session` as the current one and announce `SignedIn`.
    pub async fn update(&self, session: Session) -> Result<(), SessionError> {
        {
            let _state = self.inner.state.lock().await;
            self.inner.persist(&session).await?;
        }
        info!(user_id = %session.user.id, "Session updated");
        self.inner.events.emit(AuthChangeEvent::SignedIn);
        Ok(())
    }

    /// Delete the persisted session.
    ///
    /// A refresh already in flight is not cancelled: when it succeeds it
    /// persists its session again.
    pub async fn remove(&self) {
        {
            let _state = self.inner.state.lock().await;
            if let Err(e) = self.inner.with_store(|store, key| store.delete(key)).await {
                warn!(error = %e, "Failed to delete stored session");
            }
        }
        if self.inner.events.emit_if_changed(AuthChangeEvent::SignedOut) {
            info!("Session removed, signed out");
        }
    }

    /// The persisted session without any validity check or refresh.
    ///
    /// Never waits on the manager lock or the network, so it is cheap enough
    /// for "am I logged in" checks. It may miss a write that is in progress.
    pub fn stored_session(&self) -> Option<Session> {
        match self.inner.load() {
            Ok(stored) => stored.map(|s| s.session),
            Err(e) => {
                debug!(error = %e, "Could not read stored session");
                None
            }
        }
    }

    pub fn subscribe(&self) -> AuthEventStream {
        self.inner.events.subscribe()
    }

    pub fn current_event(&self) -> AuthChangeEvent {
        self.inner.events.current()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Spawn the refresh exchange for `stale`. Must be called with the state
    /// lock held so the returned handle is registered before anyone else looks.
    fn start_refresh(&self, stale: StoredSession) -> SharedRefresh {
        info!(expired_at = %stale.expiration_date, "Session stale, refreshing");

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move { inner.run_refresh(stale.session.refresh_token).await });

        let inner = Arc::clone(&self.inner);
        async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => {
                    // The task died before it could clear itself.
                    inner.state.lock().await.in_flight = None;
                    Err(RefreshError::Aborted(e.to_string()).into())
                }
            }
        }
        .boxed()
        .shared()
    }
}

fn decode(bytes: Option<Vec<u8>>) -> Result<Option<StoredSession>, SessionError> {
    let Some(bytes) = bytes else {
        return Ok(None);
    };
    let stored = StoredSession::from_bytes(&bytes).map_err(StoreError::from)?;
    Ok(Some(stored))
}

impl Inner {
    /// Inline read, for callers that are not on an async path.
    fn load(&self) -> Result<Option<StoredSession>, SessionError> {
        decode(self.store.get(&self.config.storage_key)?)
    }

    async fn load_blocking(&self) -> Result<Option<StoredSession>, SessionError> {
        decode(self.with_store(|store, key| store.get(key)).await?)
    }

    async fn persist(&self, session: &Session) -> Result<(), SessionError> {
        let stored = StoredSession::new(session.clone());
        let bytes = stored.to_bytes().map_err(StoreError::from)?;
        self.with_store(move |store, key| store.set(key, &bytes)).await?;
        Ok(())
    }

    /// Run `op` against the store under the session key on the blocking pool.
    async fn with_store<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn SecureStore, &str) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let key = self.config.storage_key.clone();
        tokio::task::spawn_blocking(move || op(store.as_ref(), &key))
            .await
            .unwrap_or_else(|e| Err(std::io::Error::other(format!("store task failed: {}", e)).into()))
    }

    async fn run_refresh(&self, refresh_token: String) -> Result<Session, SessionError> {
        let exchange = self.refresher.refresh(refresh_token);
        let outcome = match self.config.refresh_timeout {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .unwrap_or_else(|_| Err(RefreshError::TimedOut(limit))),
            None => exchange.await,
        };

        let mut state = self.state.lock().await;
        let result = match outcome {
            Ok(session) => match self.persist(&session).await {
                Ok(()) => {
                    info!(user_id = %session.user.id, expires_in = session.expires_in, "Session refreshed");
                    Ok(session)
                }
                Err(e) => {
                    warn!(error = %e, "Refreshed session could not be persisted");
                    Err(e)
                }
            },
            Err(e) => {
                warn!(error = %e, "Session refresh failed");
                if e.is_terminal() && self.events.emit_if_changed(AuthChangeEvent::SignedOut) {
                    info!("Refresh token rejected, signed out");
                }
                Err(e.into())
            }
        };
        state.in_flight = None;
        result
    }
}
