//! Keyed hashing of secret identifiers
//!
//! Secret identifiers are never stored in plaintext. Each one is run through
//! a keyed hash (HMAC-SHA-256 with the backend salt) and the hex digest
//! becomes the last component of the record's storage key.
//!
//! Like content hashing, this is a pure, deterministic operation: the same
//! salt and input always produce the same digest, so it does not go through
//! the effect system.
//!
//! ```ignore
//! use warden_core::hash::{HmacSha256Hasher, SecretIdHasher};
//!
//! let hasher = HmacSha256Hasher::new("backend-salt")?;
//! let key = hasher.hash_secret_id("5c3e...")?;
//! assert_eq!(key.len(), 64);
//! ```

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

use crate::{Result, WardenError};

type HmacSha256 = Hmac<Sha256>;

/// Trait for hashing secret identifiers into storage keys
///
/// Implementations must be deterministic for the lifetime of the stored
/// records; changing the algorithm or the key orphans every record.
pub trait SecretIdHasher: Send + Sync + fmt::Debug {
    /// Hash a secret identifier into a lowercase hex digest
    fn hash_secret_id(&self, secret_id: &str) -> Result<String>;
}

/// HMAC-SHA-256 keyed with the backend salt
#[derive(Clone)]
pub struct HmacSha256Hasher {
    key: Vec<u8>,
}

impl HmacSha256Hasher {
    /// Create a hasher keyed with `salt`. An empty salt is rejected.
    pub fn new(salt: impl AsRef<[u8]>) -> Result<Self> {
        let key = salt.as_ref();
        if key.is_empty() {
            return Err(WardenError::crypto("HMAC key cannot be empty"));
        }
        Ok(Self { key: key.to_vec() })
    }
}

impl fmt::Debug for HmacSha256Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacSha256Hasher")
            .field("key", &"<redacted>")
            .finish()
    }
}

impl SecretIdHasher for HmacSha256Hasher {
    fn hash_secret_id(&self, secret_id: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| WardenError::crypto(format!("Failed to initialize HMAC: {e}")))?;
        mac.update(secret_id.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

impl<T: SecretIdHasher + ?Sized> SecretIdHasher for std::sync::Arc<T> {
    fn hash_secret_id(&self, secret_id: &str) -> Result<String> {
        (**self).hash_secret_id(secret_id)
    }
}
