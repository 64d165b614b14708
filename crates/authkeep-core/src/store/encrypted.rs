//! File-backed secure store for hosts without a usable OS keychain.
//!
//! Each key is sealed with ChaCha20-Poly1305 into its own file. The cipher
//! key is derived with Argon2 from a caller-supplied passphrase and a random
//! salt kept next to the data. The key name is bound in as associated data,
//! so a sealed file copied under another name fails to open.

use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use argon2::Argon2;
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;
use tracing::debug;

use super::{SecureStore, StoreError};

/// Salt file name inside the store directory
const SALT_FILE: &str = "store.salt";

const SALT_LEN: usize = 16;

const NONCE_LEN: usize = 12;

/// Extension of sealed value files
const SEALED_EXTENSION: &str = "sealed";

pub struct EncryptedFileStore {
    dir: PathBuf,
    cipher: ChaCha20Poly1305,
}

impl EncryptedFileStore {
    /// Open (or initialize) a store rooted at `dir`.
    ///
    /// A wrong passphrase is not detected here; it surfaces as
    /// `StoreError::Crypto` on the first `get` of an existing value.
    pub fn open(dir: impl Into<PathBuf>, passphrase: &str) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let salt = Self::load_or_create_salt(&dir)?;
        let mut key = [0u8; 32];
        Argon2::default()
            .hash_password_into(passphrase.as_bytes(), &salt, &mut key)
            .map_err(|e| StoreError::Crypto(format!("key derivation failed: {}", e)))?;

        Ok(Self {
            dir,
            cipher: ChaCha20Poly1305::new(Key::from_slice(&key)),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn load_or_create_salt(dir: &Path) -> Result<Vec<u8>, StoreError> {
        let path = dir.join(SALT_FILE);
        match fs::read(&path) {
            Ok(salt) if salt.len() == SALT_LEN => Ok(salt),
            Ok(salt) => Err(StoreError::Corrupt(format!(
                "salt file has {} bytes, expected {}",
                salt.len(),
                SALT_LEN
            ))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let mut salt = vec![0u8; SALT_LEN];
                rand::thread_rng().fill_bytes(&mut salt);
                write_atomically(&path, &salt)?;
                debug!(dir = %dir.display(), "Initialized encrypted store salt");
                Ok(salt)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Keys are hex-encoded so any key maps to a distinct, portable file name.
    fn value_path(&self, key: &str) -> PathBuf {
        let name: String = key.bytes().map(|b| format!("{:02x}", b)).collect();
        self.dir.join(format!("{}.{}", name, SEALED_EXTENSION))
    }
}

impl fmt::Debug for EncryptedFileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedFileStore")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

impl SecureStore for EncryptedFileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let sealed = match fs::read(self.value_path(key)) {
            Ok(sealed) => sealed,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if sealed.len() < NONCE_LEN {
            return Err(StoreError::Corrupt(format!("sealed value for {} is truncated", key)));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);

        let plaintext = self
            .cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: key.as_bytes(),
                },
            )
            .map_err(|_| {
                StoreError::Crypto("decryption failed - wrong passphrase or tampered file".to_string())
            })?;
        Ok(Some(plaintext))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: value,
                    aad: key.as_bytes(),
                },
            )
            .map_err(|_| StoreError::Crypto("encryption failed".to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        write_atomically(&self.value_path(key), &sealed)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.value_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write to a sibling temp file, then rename over the target, so readers
/// see either the old value or the new one.
fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let tmp = path.with_extension("tmp");

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(&tmp)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = EncryptedFileStore::open(dir.path(), "correct horse").unwrap();
            store.set("authkeep.session", b"{\"token\":\"abc\"}").unwrap();
        }

        let store = EncryptedFileStore::open(dir.path(), "correct horse").unwrap();
        let value = store.get("authkeep.session").unwrap();
        assert_eq!(value.as_deref(), Some(&b"{\"token\":\"abc\"}"[..]));
    }

    #[test]
    fn test_values_are_not_stored_in_plaintext() {
        let dir = tempfile::tempdir().unwrap();
        let store = EncryptedFileStore::open(dir.path(), "pw").unwrap();
        store.set("k", b"super-secret-refresh-token").unwrap();

        let raw = fs::read(store.value_path("k")).unwrap();
        let needle = b"super-secret-refresh-token";
        assert!(!raw.windows(needle.len()).any(|w| w == needle));
    }

    #[test]
    fn test_wrong_passphrase_fails_to_decrypt() {
        let dir = tempfile::tempdir().unwrap();
        EncryptedFileStore::open(dir.path(), "right")
            .unwrap()
            .set("k", b"value")
            .unwrap();

        let store = EncryptedFileStore::open(dir.path(), "wrong").unwrap();
        assert!(matches!(store.get("k"), Err(StoreError::Crypto(_))));
    }

    #[test]
    fn test_sealed_file_is_bound_to_its_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = EncryptedFileStore::open(dir.path(), "pw").unwrap();
        store.set("a", b"value").unwrap();
        fs::copy(store.value_path("a"), store.value_path("b")).unwrap();

        assert!(matches!(store.get("b"), Err(StoreError::Crypto(_))));
    }

    #[test]
    fn test_missing_and_deleted_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = EncryptedFileStore::open(dir.path(), "pw").unwrap();
        assert!(store.get("k").unwrap().is_none());
        assert!(store.delete("k").is_ok());

        store.set("k", b"v").unwrap();
        store.delete("k").unwrap();
        assert!(store.get("k").unwrap().is_none());
    }
}
