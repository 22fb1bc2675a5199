use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use warden_core::effects::{StorageEffects, StorageError};

/// Bounds every call of an inner storage handler
///
/// An elapsed call becomes [`StorageError::Timeout`], which the backend
/// surfaces as a fatal storage error rather than a validation failure. A
/// zero timeout disables the bound.
#[derive(Debug, Clone)]
pub struct TimeoutStorageHandler<S> {
    inner: S,
    timeout_ms: u64,
}

impl<S: StorageEffects> TimeoutStorageHandler<S> {
    /// Wrap `inner`, bounding each call by `timeout_ms` milliseconds
    pub fn new(inner: S, timeout_ms: u64) -> Self {
        Self { inner, timeout_ms }
    }

    /// Access the wrapped handler
    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, StorageError>
    where
        F: Future<Output = Result<T, StorageError>> + Send,
    {
        if self.timeout_ms == 0 {
            return fut.await;
        }
        match tokio::time::timeout(Duration::from_millis(self.timeout_ms), fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(op, timeout_ms = self.timeout_ms, "storage call timed out");
                Err(StorageError::Timeout {
                    timeout_ms: self.timeout_ms,
                })
            }
        }
    }
}

#[async_trait]
impl<S: StorageEffects> StorageEffects for TimeoutStorageHandler<S> {
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        self.bounded("store", self.inner.store(key, value)).await
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.bounded("retrieve", self.inner.retrieve(key)).await
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        self.bounded("remove", self.inner.remove(key)).await
    }

    async fn list_keys(&self, prefix: Option<&str>) -> Result<Vec<String>, StorageError> {
        self.bounded("list_keys", self.inner.list_keys(prefix)).await
    }
}
