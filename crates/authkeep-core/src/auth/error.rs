use std::time::Duration;

use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by the session manager.
///
/// `Clone` because a single refresh outcome is handed to every caller that
/// was waiting on it.
#[derive(Error, Debug, Clone)]
pub enum SessionError {
    /// Nothing is persisted. Not an authentication failure, just absence.
    #[error("No session found")]
    NotFound,

    #[error("Session refresh failed: {0}")]
    RefreshFailed(#[from] RefreshError),

    #[error("Secure storage error: {0}")]
    Store(#[from] StoreError),
}

impl SessionError {
    /// Whether the caller should treat the user as signed out.
    pub fn requires_sign_in(&self) -> bool {
        match self {
            SessionError::NotFound => true,
            SessionError::RefreshFailed(e) => e.is_terminal(),
            SessionError::Store(_) => false,
        }
    }
}

/// Failure of a token refresh exchange.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// The provider refused the refresh token. Only a fresh sign-in helps.
    #[error("Refresh token rejected: {0}")]
    Rejected(String),

    #[error("Refresh request failed: {0}")]
    Transport(String),

    #[error("Refresh timed out after {0:?}")]
    TimedOut(Duration),

    /// The refresh task died before producing a result.
    #[error("Refresh task aborted: {0}")]
    Aborted(String),
}

impl RefreshError {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RefreshError::Rejected(_))
    }
}
