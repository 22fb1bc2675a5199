//! Storage effect trait
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Implementation**: `warden-effects` (memory, filesystem, timeout wrapper)
//! - **Usage**: App, Group and SecretID records in `warden-appgroup`
//!
//! Keys are `/`-separated string paths. Values are opaque bytes; the caller
//! owns the encoding.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Storage failure. The backend treats every variant as fatal; none of them
/// says anything about the credential being presented.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum StorageError {
    /// `retrieve` or `list_keys` failed
    #[error("Storage read failed: {0}")]
    ReadFailed(String),
    /// `store` failed
    #[error("Storage write failed: {0}")]
    WriteFailed(String),
    /// `remove` failed
    #[error("Storage delete failed: {0}")]
    DeleteFailed(String),
    /// The key cannot be mapped onto the backing store
    #[error("Invalid storage key: {reason}")]
    InvalidKey {
        /// Why the key was refused
        reason: String,
    },
    /// The call did not complete within the configured bound
    #[error("Storage operation timed out after {timeout_ms}ms")]
    Timeout {
        /// Bound that elapsed
        timeout_ms: u64,
    },
}

/// Key/value storage contract.
#[async_trait]
pub trait StorageEffects: Send + Sync {
    /// Store `value` under `key`, replacing any previous value.
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

    /// Fetch the value under `key`. A missing key is `Ok(None)`, never an error.
    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Remove `key`. Returns whether a value was present.
    async fn remove(&self, key: &str) -> Result<bool, StorageError>;

    /// List all keys starting with `prefix` (all keys when `None`), sorted.
    async fn list_keys(&self, prefix: Option<&str>) -> Result<Vec<String>, StorageError>;
}

/// Blanket implementation for Arc<T> where T: StorageEffects
#[async_trait]
impl<T: StorageEffects + ?Sized> StorageEffects for std::sync::Arc<T> {
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        (**self).store(key, value).await
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).retrieve(key).await
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        (**self).remove(key).await
    }

    async fn list_keys(&self, prefix: Option<&str>) -> Result<Vec<String>, StorageError> {
        (**self).list_keys(prefix).await
    }
}
