//! Secure key-value storage backends.
//!
//! The session manager only needs whole-value get/set/delete on a single
//! key, so backends stay small:
//! - `KeyringStore`: OS keychain via the `keyring` crate
//! - `EncryptedFileStore`: ChaCha20-Poly1305 files keyed by a passphrase
//! - `MemoryStore`: process-local map for tests and ephemeral clients

pub mod encrypted;
pub mod error;
pub mod keychain;
pub mod memory;

pub use encrypted::EncryptedFileStore;
pub use error::StoreError;
pub use keychain::KeyringStore;
pub use memory::MemoryStore;

/// Durable, confidential key-value storage.
///
/// Values are replaced whole: `set` must never leave a partially written
/// value visible to a concurrent `get`.
///
/// Methods are synchronous and may block (keychain IPC, file I/O). The
/// session manager calls them from `tokio::task::spawn_blocking` on its
/// async paths; only `SessionManager::new` and `stored_session` call them
/// inline.
pub trait SecureStore: Send + Sync {
    /// Read the value under `key`, `None` if nothing is stored.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Delete the value under `key`. Deleting a missing key succeeds.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}
