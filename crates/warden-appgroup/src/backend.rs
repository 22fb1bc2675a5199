//! Backend context
//!
//! [`AppGroupBackend`] is the explicit context every operation runs against:
//! a storage handle, a clock, the secret hasher, the record locks and the
//! startup configuration. Nothing in this crate keeps process-wide state.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::locks::SecretIdLocks;
use warden_core::effects::{PhysicalTimeEffects, StorageEffects};
use warden_core::{BackendConfig, HmacSha256Hasher, SecretIdHasher, WardenConfig, WardenError};
use warden_effects::TimeoutStorageHandler;

/// AppGroup credential backend
pub struct AppGroupBackend<S, T> {
    pub(crate) storage: S,
    pub(crate) clock: T,
    pub(crate) hasher: Arc<dyn SecretIdHasher>,
    pub(crate) locks: SecretIdLocks,
    pub(crate) config: BackendConfig,
}

impl<S, T> AppGroupBackend<S, T>
where
    S: StorageEffects,
    T: PhysicalTimeEffects,
{
    /// Build a backend, keying the secret hasher with the configured salt
    pub fn new(config: BackendConfig, storage: S, clock: T) -> Result<Self, WardenError> {
        let hasher = HmacSha256Hasher::new(config.secret_id_salt.as_bytes())?;
        Self::with_hasher(config, storage, clock, Arc::new(hasher))
    }

    /// Build a backend with a caller-supplied hasher
    pub fn with_hasher(
        config: BackendConfig,
        storage: S,
        clock: T,
        hasher: Arc<dyn SecretIdHasher>,
    ) -> Result<Self, WardenError> {
        config.validate()?;
        tracing::debug!(?config, "initializing appgroup backend");
        Ok(Self {
            storage,
            clock,
            hasher,
            locks: SecretIdLocks::new(config.lock_stripes),
            config,
        })
    }

    /// Startup configuration
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Storage handle
    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub(crate) async fn now(&self) -> Result<u64, WardenError> {
        Ok(self.clock.now_secs().await?)
    }

    pub(crate) fn hash_secret_id(&self, secret_id: &str) -> Result<String, WardenError> {
        self.hasher.hash_secret_id(secret_id)
    }

    pub(crate) async fn get_json<V: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<V>, WardenError> {
        match self.storage.retrieve(key).await? {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes).map_err(|e| {
                    WardenError::serialization(format!("Failed to decode {key}: {e}"))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    pub(crate) async fn put_json<V: Serialize + Sync>(
        &self,
        key: &str,
        value: &V,
    ) -> Result<(), WardenError> {
        let bytes = serde_json::to_vec(value)?;
        self.storage.store(key, bytes).await?;
        Ok(())
    }
}

impl<S, T> AppGroupBackend<TimeoutStorageHandler<S>, T>
where
    S: StorageEffects,
    T: PhysicalTimeEffects,
{
    /// Build a backend whose storage calls are bounded by
    /// `config.storage_timeout_ms`
    pub fn bounded(config: BackendConfig, storage: S, clock: T) -> Result<Self, WardenError> {
        let storage = TimeoutStorageHandler::new(storage, config.storage_timeout_ms);
        Self::new(config, storage, clock)
    }
}

impl<S, T> std::fmt::Debug for AppGroupBackend<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppGroupBackend")
            .field("config", &self.config)
            .field("hasher", &self.hasher)
            .field("locks", &self.locks)
            .finish_non_exhaustive()
    }
}
