use std::sync::Arc;

use thiserror::Error;

/// Failure of a secure store backend.
///
/// Cloneable so a single failure can be handed to every caller waiting on
/// the same session refresh.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("Keychain error: {0}")]
    Keychain(Arc<keyring::Error>),

    #[error("Storage I/O error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Encryption error: {0}")]
    Crypto(String),

    #[error("Stored value is corrupt: {0}")]
    Corrupt(String),
}

impl From<keyring::Error> for StoreError {
    fn from(err: keyring::Error) -> Self {
        StoreError::Keychain(Arc::new(err))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}
