//! Fault-injecting storage handler

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use warden_core::effects::{StorageEffects, StorageError};
use warden_effects::MemoryStorageHandler;

/// Which storage calls should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Every call succeeds
    #[default]
    None,
    /// `retrieve` and `list_keys` fail
    Reads,
    /// `store` fails
    Writes,
    /// `remove` fails
    Removes,
    /// Every call fails
    All,
    /// Every call hangs and never completes
    Stall,
}

/// In-memory storage whose calls can be made to fail on demand
///
/// Lets tests prove that storage outages surface as system failures and are
/// never mistaken for a bad credential.
#[derive(Debug, Clone, Default)]
pub struct FailingStorageHandler {
    inner: MemoryStorageHandler,
    mode: Arc<Mutex<FailureMode>>,
}

impl FailingStorageHandler {
    /// Create a handler that starts out healthy
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch the failure mode; applies to clones too
    pub fn set_mode(&self, mode: FailureMode) {
        *self.mode.lock().unwrap() = mode;
    }

    /// Current mode; a stalled handler parks the caller here forever
    async fn mode(&self) -> FailureMode {
        let mode = *self.mode.lock().unwrap();
        if mode == FailureMode::Stall {
            std::future::pending::<()>().await;
        }
        mode
    }
}

#[async_trait]
impl StorageEffects for FailingStorageHandler {
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        if matches!(self.mode().await, FailureMode::Writes | FailureMode::All) {
            return Err(StorageError::WriteFailed(format!("injected failure: {key}")));
        }
        self.inner.store(key, value).await
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        if matches!(self.mode().await, FailureMode::Reads | FailureMode::All) {
            return Err(StorageError::ReadFailed(format!("injected failure: {key}")));
        }
        self.inner.retrieve(key).await
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        if matches!(self.mode().await, FailureMode::Removes | FailureMode::All) {
            return Err(StorageError::DeleteFailed(format!("injected failure: {key}")));
        }
        self.inner.remove(key).await
    }

    async fn list_keys(&self, prefix: Option<&str>) -> Result<Vec<String>, StorageError> {
        if matches!(self.mode().await, FailureMode::Reads | FailureMode::All) {
            return Err(StorageError::ReadFailed("injected failure: list".to_string()));
        }
        self.inner.list_keys(prefix).await
    }
}
