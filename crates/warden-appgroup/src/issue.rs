//! SecretID issuance and lifecycle
//!
//! Issuance is the only way a SecretID record comes into existence. The
//! plaintext secret is returned exactly once; only its keyed hash is stored.
//! Records leave storage on their last use, on expiry, through
//! [`AppGroupBackend::revoke_secret_id`] or through
//! [`AppGroupBackend::tidy_secret_ids`].

use uuid::Uuid;

use crate::backend::AppGroupBackend;
use crate::keys;
use crate::selector::Selector;
use crate::types::{SecretIdRecord, SelectorRef, SuperGroupRef, SuperGroupRequest};
use crate::validate::log_prefix;
use warden_core::effects::{PhysicalTimeEffects, StorageEffects};
use warden_core::WardenError;

/// A freshly issued SecretID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedSecretId {
    /// Selector the SecretID must be presented with
    pub selector: Selector,
    /// Plaintext secret identifier
    pub secret_id: String,
}

impl IssuedSecretId {
    /// Single-field login form, `<selector>;<secret_id>`
    pub fn login_string(&self) -> String {
        format!("{};{}", self.selector, self.secret_id)
    }
}

/// Limits copied from an entry or request into a new record
struct Limits {
    num_uses: u32,
    secret_id_ttl: u64,
    token_ttl: u64,
    token_max_ttl: u64,
}

impl<S, T> AppGroupBackend<S, T>
where
    S: StorageEffects,
    T: PhysicalTimeEffects,
{
    /// Issue a SecretID for an existing App
    pub async fn issue_app_secret_id(&self, name: &str) -> Result<IssuedSecretId, WardenError> {
        let app = self
            .read_app(name)
            .await?
            .ok_or_else(|| WardenError::not_found(format!("app {name:?} does not exist")))?;
        let limits = Limits {
            num_uses: app.num_uses,
            secret_id_ttl: app.secret_id_ttl,
            token_ttl: app.token_ttl,
            token_max_ttl: app.token_max_ttl,
        };
        self.issue(
            Selector::App(app.name.clone()),
            SelectorRef::App { name: app.name },
            limits,
        )
        .await
    }

    /// Issue a SecretID for an existing Group
    pub async fn issue_group_secret_id(&self, name: &str) -> Result<IssuedSecretId, WardenError> {
        let group = self
            .read_group(name)
            .await?
            .ok_or_else(|| WardenError::not_found(format!("group {name:?} does not exist")))?;
        let limits = Limits {
            num_uses: group.num_uses,
            secret_id_ttl: group.secret_id_ttl,
            token_ttl: group.token_ttl,
            token_max_ttl: group.token_max_ttl,
        };
        self.issue(
            Selector::Group(group.name.clone()),
            SelectorRef::Group { name: group.name },
            limits,
        )
        .await
    }

    /// Issue a SuperGroup SecretID.
    ///
    /// Every named App and Group must exist now; later deletions are
    /// tolerated at login.
    pub async fn issue_supergroup_secret_id(
        &self,
        request: SuperGroupRequest,
    ) -> Result<IssuedSecretId, WardenError> {
        request.validate()?;
        for name in &request.apps {
            if self.read_app(name).await?.is_none() {
                return Err(WardenError::not_found(format!("app {name:?} does not exist")));
            }
        }
        for name in &request.groups {
            if self.read_group(name).await?.is_none() {
                return Err(WardenError::not_found(format!(
                    "group {name:?} does not exist"
                )));
            }
        }

        let limits = Limits {
            num_uses: request.num_uses,
            secret_id_ttl: request.secret_id_ttl,
            token_ttl: request.token_ttl,
            token_max_ttl: request.token_max_ttl,
        };
        let members = SuperGroupRef {
            apps: request.apps,
            groups: request.groups,
            additional_policies: request.additional_policies,
        };
        self.issue(Selector::SuperGroup, SelectorRef::SuperGroup(members), limits)
            .await
    }

    async fn issue(
        &self,
        selector: Selector,
        selector_ref: SelectorRef,
        limits: Limits,
    ) -> Result<IssuedSecretId, WardenError> {
        let secret_id = Uuid::new_v4().to_string();
        let hashed_id = self.hash_secret_id(&secret_id)?;
        let now = self.now().await?;
        let expiration_time = match limits.secret_id_ttl {
            0 => 0,
            ttl => now.saturating_add(ttl),
        };

        let record = SecretIdRecord {
            hashed_id: hashed_id.clone(),
            selector_ref,
            creation_time: now,
            expiration_time,
            num_uses_total: limits.num_uses,
            num_uses_remaining: limits.num_uses,
            token_ttl: limits.token_ttl,
            token_max_ttl: limits.token_max_ttl,
        };
        self.put_json(&keys::secret_id_key(&selector, &hashed_id), &record)
            .await?;

        tracing::info!(
            selector = %selector,
            hashed_id = log_prefix(&hashed_id),
            num_uses = limits.num_uses,
            expiration_time,
            "issued secret ID"
        );
        Ok(IssuedSecretId {
            selector,
            secret_id,
        })
    }

    /// Delete the record of `secret_id`; returns whether one existed
    pub async fn revoke_secret_id(
        &self,
        selector: &Selector,
        secret_id: &str,
    ) -> Result<bool, WardenError> {
        let hashed_id = self.hash_secret_id(secret_id)?;
        let removed = {
            let _guard = self.locks.lock(&hashed_id).await;
            self.storage
                .remove(&keys::secret_id_key(selector, &hashed_id))
                .await?
        };
        tracing::info!(
            selector = %selector,
            hashed_id = log_prefix(&hashed_id),
            removed,
            "revoked secret ID"
        );
        Ok(removed)
    }

    /// Delete every expired record across all namespaces; returns how many
    /// were removed. Undecodable records are left in place and logged.
    pub async fn tidy_secret_ids(&self) -> Result<usize, WardenError> {
        let now = self.now().await?;
        let record_keys = self
            .storage
            .list_keys(Some(keys::SECRET_ID_PREFIX))
            .await?;

        let mut removed = 0;
        for key in record_keys {
            let _guard = self.locks.lock(keys::hashed_id_of(&key)).await;
            let record = match self.get_json::<SecretIdRecord>(&key).await {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(err) if err.is_storage() => return Err(err),
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "skipping unreadable record");
                    continue;
                }
            };
            if record.is_expired(now) && self.storage.remove(&key).await? {
                removed += 1;
            }
        }

        tracing::info!(removed, "tidied secret IDs");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicySet;
    use crate::types::{AppEntry, GroupEntry};
    use warden_core::BackendConfig;
    use warden_effects::MemoryStorageHandler;
    use warden_testkit::{ManualClock, TEST_SALT};

    async fn backend() -> AppGroupBackend<MemoryStorageHandler, ManualClock> {
        let backend = AppGroupBackend::new(
            BackendConfig::with_salt(TEST_SALT),
            MemoryStorageHandler::new(),
            ManualClock::new(1_000),
        )
        .unwrap();
        let mut app = AppEntry::new("web", PolicySet::parse("read"));
        app.num_uses = 3;
        app.secret_id_ttl = 60;
        app.token_ttl = 30;
        backend.write_app(&app).await.unwrap();
        backend
    }

    #[tokio::test]
    async fn test_issue_stores_hashed_record() {
        let backend = backend().await;
        let issued = backend.issue_app_secret_id("web").await.unwrap();
        assert_eq!(issued.selector, Selector::App("web".into()));
        assert!(issued.login_string().starts_with("app/web;"));

        let hashed_id = backend.hash_secret_id(&issued.secret_id).unwrap();
        let key = keys::secret_id_key(&issued.selector, &hashed_id);
        let record: SecretIdRecord = backend.get_json(&key).await.unwrap().unwrap();
        assert_eq!(record.creation_time, 1_000);
        assert_eq!(record.expiration_time, 1_060);
        assert_eq!(record.num_uses_remaining, 3);
        assert_eq!(record.token_ttl, 30);

        let keys = backend.storage().list_keys(Some("secret_id/")).await.unwrap();
        assert!(keys.iter().all(|k| !k.contains(&issued.secret_id)));
    }

    #[tokio::test]
    async fn test_issue_requires_existing_entries() {
        let backend = backend().await;
        assert!(matches!(
            backend.issue_group_secret_id("ghost").await,
            Err(WardenError::NotFound { .. })
        ));

        let request = SuperGroupRequest {
            apps: ["web".to_string(), "ghost".to_string()].into(),
            ..SuperGroupRequest::default()
        };
        assert!(matches!(
            backend.issue_supergroup_secret_id(request).await,
            Err(WardenError::NotFound { .. })
        ));
        assert!(matches!(
            backend
                .issue_supergroup_secret_id(SuperGroupRequest::default())
                .await,
            Err(WardenError::Invalid { .. })
        ));
    }

    #[tokio::test]
    async fn test_supergroup_record_embeds_members() {
        let backend = backend().await;
        backend
            .write_group(&GroupEntry::new("ops", ["web"], PolicySet::new()))
            .await
            .unwrap();
        let request = SuperGroupRequest {
            groups: ["ops".to_string()].into(),
            additional_policies: PolicySet::parse("audit"),
            ..SuperGroupRequest::default()
        };
        let issued = backend.issue_supergroup_secret_id(request).await.unwrap();
        assert_eq!(issued.selector, Selector::SuperGroup);

        let hashed_id = backend.hash_secret_id(&issued.secret_id).unwrap();
        let record: SecretIdRecord = backend
            .get_json(&keys::secret_id_key(&Selector::SuperGroup, &hashed_id))
            .await
            .unwrap()
            .unwrap();
        let SelectorRef::SuperGroup(members) = record.selector_ref else {
            panic!("expected a supergroup record");
        };
        assert!(members.groups.contains("ops"));
        assert_eq!(members.additional_policies.to_string(), "audit");
    }

    #[tokio::test]
    async fn test_revoke_and_tidy() {
        let backend = backend().await;
        let kept = backend.issue_app_secret_id("web").await.unwrap();
        let revoked = backend.issue_app_secret_id("web").await.unwrap();

        assert!(backend
            .revoke_secret_id(&revoked.selector, &revoked.secret_id)
            .await
            .unwrap());
        assert!(!backend
            .revoke_secret_id(&revoked.selector, &revoked.secret_id)
            .await
            .unwrap());

        assert_eq!(backend.tidy_secret_ids().await.unwrap(), 0);
        backend.clock.advance(61);
        assert_eq!(backend.tidy_secret_ids().await.unwrap(), 1);
        assert!(!backend
            .revoke_secret_id(&kept.selector, &kept.secret_id)
            .await
            .unwrap());
    }
}
