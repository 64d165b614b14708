//! Client facade tying the auth flows to the session manager.
//!
//! Every flow that yields a session hands it to `SessionManager::update`,
//! which persists it and announces `SignedIn`. Sign-up and sign-in clear
//! the previous session first so a stale refresh cannot race the new one.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

use crate::api::GoTrueApi;
use crate::auth::{AuthChangeEvent, AuthEventStream, SessionError, SessionManager};
use crate::config::ClientConfig;
use crate::models::{OtpParams, Session, SessionOrUser, VerifyOtpParams};
use crate::store::{EncryptedFileStore, KeyringStore, SecureStore};

pub struct AuthClient {
    api: GoTrueApi,
    sessions: SessionManager,
}

impl AuthClient {
    /// Client persisting sessions in the OS keychain.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let store = match config.keychain_target {
            Some(ref target) => KeyringStore::with_target(&config.keychain_service, target),
            None => KeyringStore::new(&config.keychain_service),
        };
        Self::with_store(config, Arc::new(store))
    }

    /// Client persisting sessions in a passphrase-sealed directory under the
    /// user's data dir, for hosts without a usable OS keychain.
    pub fn with_encrypted_store(config: &ClientConfig, passphrase: &str) -> Result<Self> {
        Self::with_encrypted_store_at(config, ClientConfig::data_dir()?, passphrase)
    }

    pub fn with_encrypted_store_at(
        config: &ClientConfig,
        dir: impl AsRef<Path>,
        passphrase: &str,
    ) -> Result<Self> {
        let store = EncryptedFileStore::open(dir.as_ref(), passphrase)
            .with_context(|| format!("Failed to open session store in {}", dir.as_ref().display()))?;
        debug!(dir = %store.dir().display(), "Using encrypted file store");
        Self::with_store(config, Arc::new(store))
    }

    /// Client persisting sessions in `store`.
    pub fn with_store(config: &ClientConfig, store: Arc<dyn SecureStore>) -> Result<Self> {
        if config.url.is_empty() {
            bail!("No auth URL configured");
        }

        let api = GoTrueApi::new(&config.url, &config.headers)?;
        let sessions = SessionManager::new(store, api.clone(), config.session_config());
        info!(url = %api.base_url(), state = %sessions.current_event(), "Auth client ready");

        Ok(Self { api, sessions })
    }

    pub async fn sign_up_with_email(&self, email: &str, password: &str) -> Result<SessionOrUser> {
        self.sessions.remove().await;
        let response = self.api.sign_up_email(email, password).await?;
        self.accept(&response).await?;
        Ok(response)
    }

    pub async fn sign_up_with_phone(&self, phone: &str, password: &str) -> Result<SessionOrUser> {
        self.sessions.remove().await;
        let response = self.api.sign_up_phone(phone, password).await?;
        self.accept(&response).await?;
        Ok(response)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        self.sessions.remove().await;
        let session = self.api.sign_in_password(email, password).await?;
        self.sessions
            .update(session.clone())
            .await
            .context("Failed to store session")?;
        info!(user_id = %session.user.id, handle = ?session.user.display_handle(), "Signed in");
        Ok(session)
    }

    pub async fn send_magic_link(&self, params: &OtpParams, redirect_to: Option<&str>) -> Result<()> {
        self.api.send_magic_link(params, redirect_to).await
    }

    pub async fn verify_otp(&self, params: &VerifyOtpParams) -> Result<SessionOrUser> {
        let response = self.api.verify_otp(params).await?;
        self.accept(&response).await?;
        Ok(response)
    }

    /// Revoke the session server-side when possible, then forget it locally.
    /// A failed revocation is logged and does not keep the user signed in.
    pub async fn sign_out(&self) {
        if let Some(session) = self.sessions.stored_session() {
            if let Err(e) = self.api.sign_out(&session.access_token).await {
                warn!(error = %format!("{:#}", e), "Server-side sign-out failed, removing session locally");
            }
        }
        self.sessions.remove().await;
    }

    /// A valid session, refreshed if needed.
    pub async fn session(&self) -> Result<Session, SessionError> {
        self.sessions.current_session().await
    }

    /// The persisted session without validity check or refresh.
    pub fn stored_session(&self) -> Option<Session> {
        self.sessions.stored_session()
    }

    pub fn is_signed_in(&self) -> bool {
        self.sessions.current_event() == AuthChangeEvent::SignedIn
    }

    pub fn auth_events(&self) -> AuthEventStream {
        self.sessions.subscribe()
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn api(&self) -> &GoTrueApi {
        &self.api
    }

    async fn accept(&self, response: &SessionOrUser) -> Result<()> {
        match response.session() {
            Some(session) => {
                self.sessions
                    .update(session.clone())
                    .await
                    .context("Failed to store session")?;
                info!(user_id = %session.user.id, handle = ?session.user.display_handle(), "Signed in");
            }
            None => {
                let user = response.user();
                info!(user_id = %user.id, handle = ?user.display_handle(), "Account pending confirmation");
            }
        }
        Ok(())
    }
}
