//! SecretID validation
//!
//! A login consumes at most one use of the presented SecretID. The
//! read-check-decrement-write runs while holding the record's lock stripe;
//! composition happens after the stripe is released because it only reads
//! App and Group entries.

use crate::backend::AppGroupBackend;
use crate::error::{AuthError, Result};
use crate::keys;
use crate::selector::Selector;
use crate::types::{AuthResult, SecretIdRecord};
use warden_core::effects::{PhysicalTimeEffects, StorageEffects};
use warden_core::WardenError;

/// Leading characters of a hashed id that are safe to log
pub(crate) fn log_prefix(hashed_id: &str) -> &str {
    hashed_id.get(..8).unwrap_or(hashed_id)
}

impl<S, T> AppGroupBackend<S, T>
where
    S: StorageEffects,
    T: PhysicalTimeEffects,
{
    /// Validate `secret_id` against `selector`, consuming one use.
    ///
    /// Unknown, expired and exhausted SecretIDs are validation failures.
    /// Storage, hashing and clock failures come back as
    /// [`AuthError::System`].
    pub async fn validate_credentials(
        &self,
        selector: &Selector,
        secret_id: &str,
    ) -> Result<AuthResult> {
        if secret_id.is_empty() {
            return Err(AuthError::MissingSecretId);
        }

        let hashed_id = self.hash_secret_id(secret_id)?;
        let record = {
            let _guard = self.locks.lock(&hashed_id).await;
            self.consume_use(selector, &hashed_id).await?
        };

        let policies = self.compose(&record.selector_ref).await?;
        tracing::debug!(
            selector = %selector,
            hashed_id = log_prefix(&hashed_id),
            policies = %policies,
            "secret ID validated"
        );

        Ok(AuthResult {
            selector_id: record.selector_id(),
            policies,
            token_ttl: record.token_ttl,
            token_max_ttl: record.token_max_ttl,
        })
    }

    /// Check and consume one use of a record. Caller holds the stripe.
    async fn consume_use(&self, selector: &Selector, hashed_id: &str) -> Result<SecretIdRecord> {
        let key = keys::secret_id_key(selector, hashed_id);
        let Some(mut record) = self.get_json::<SecretIdRecord>(&key).await? else {
            tracing::warn!(
                selector = %selector,
                hashed_id = log_prefix(hashed_id),
                "secret ID not found"
            );
            return Err(AuthError::invalid_secret_id("secret ID not found"));
        };

        if !record.selector_ref.matches(selector) || record.hashed_id != hashed_id {
            return Err(WardenError::internal(format!(
                "secret ID record at {key} does not belong to {selector}"
            ))
            .into());
        }

        let now = self.now().await?;
        if record.is_expired(now) {
            self.storage.remove(&key).await?;
            tracing::warn!(
                selector = %selector,
                hashed_id = log_prefix(hashed_id),
                expiration_time = record.expiration_time,
                "secret ID expired"
            );
            return Err(AuthError::invalid_secret_id("secret ID expired"));
        }

        if record.is_exhausted() {
            // Records are deleted on their last use; one left behind is
            // removed here.
            self.storage.remove(&key).await?;
            tracing::warn!(
                selector = %selector,
                hashed_id = log_prefix(hashed_id),
                "secret ID exhausted"
            );
            return Err(AuthError::invalid_secret_id("secret ID exhausted"));
        }

        if record.num_uses_total > 0 {
            record.num_uses_remaining -= 1;
            if record.num_uses_remaining == 0 {
                self.storage.remove(&key).await?;
            } else {
                self.put_json(&key, &record).await?;
            }
            tracing::debug!(
                selector = %selector,
                hashed_id = log_prefix(hashed_id),
                remaining = record.num_uses_remaining,
                "consumed secret ID use"
            );
        }

        Ok(record)
    }
}
