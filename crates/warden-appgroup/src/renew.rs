//! Renewal validation
//!
//! Renewal re-derives the TTL ceiling from live state: the App or Group entry,
//! or for a SuperGroup the SecretID record it was issued under. Policies are
//! not re-derived; the host keeps the set it granted at login.
//!
//! A one-shot SuperGroup record is deleted on its only use, so its grants
//! cannot be renewed. Every failure here is fatal.

use crate::backend::AppGroupBackend;
use crate::keys;
use crate::selector::{Selector, SelectorId};
use crate::types::{Lease, SecretIdRecord, TokenContext, TtlCeiling};
use warden_core::effects::{PhysicalTimeEffects, StorageEffects};
use warden_core::WardenError;

impl<S, T> AppGroupBackend<S, T>
where
    S: StorageEffects,
    T: PhysicalTimeEffects,
{
    /// Current TTL ceiling for grants carrying `selector_id`
    pub async fn validate_selector_id(
        &self,
        selector_id: &SelectorId,
    ) -> Result<TtlCeiling, WardenError> {
        match selector_id {
            SelectorId::App(name) => {
                let app = self.read_app(name).await?.ok_or_else(|| {
                    WardenError::not_found(format!("app {name:?} no longer exists"))
                })?;
                Ok(TtlCeiling {
                    token_ttl: app.token_ttl,
                    token_max_ttl: app.token_max_ttl,
                })
            }
            SelectorId::Group(name) => {
                let group = self.read_group(name).await?.ok_or_else(|| {
                    WardenError::not_found(format!("group {name:?} no longer exists"))
                })?;
                Ok(TtlCeiling {
                    token_ttl: group.token_ttl,
                    token_max_ttl: group.token_max_ttl,
                })
            }
            SelectorId::SuperGroup { hashed_id } => {
                let key = keys::secret_id_key(&Selector::SuperGroup, hashed_id);
                let record = self
                    .get_json::<SecretIdRecord>(&key)
                    .await?
                    .ok_or_else(|| {
                        WardenError::not_found(
                            "supergroup secret ID no longer exists; renewal is not possible",
                        )
                    })?;
                if record.is_expired(self.now().await?) {
                    return Err(WardenError::not_found(
                        "supergroup secret ID has expired; renewal is not possible",
                    ));
                }
                Ok(record.ttl_ceiling())
            }
        }
    }

    /// Renewal callback: validate the stored context and extend `lease`.
    ///
    /// The returned lease keeps its original `issued_at`, so repeated
    /// renewals never push the grant past its maximum TTL.
    pub async fn renew(&self, context: &TokenContext, lease: &Lease) -> Result<Lease, WardenError> {
        let ceiling = self.validate_selector_id(&context.selector_id).await?;
        let now = self.now().await?;
        let ttl = ceiling.extend(lease.issued_at, now, self.config.system_max_ttl)?;
        tracing::debug!(selector_id = %context.selector_id, ttl, "renewed lease");
        Ok(Lease {
            ttl,
            renewable: true,
            issued_at: lease.issued_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicySet;
    use crate::types::{AppEntry, GroupEntry, SuperGroupRequest};
    use warden_core::BackendConfig;
    use warden_effects::MemoryStorageHandler;
    use warden_testkit::{ManualClock, TEST_SALT};

    fn backend() -> AppGroupBackend<MemoryStorageHandler, ManualClock> {
        AppGroupBackend::new(
            BackendConfig::with_salt(TEST_SALT),
            MemoryStorageHandler::new(),
            ManualClock::new(10_000),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_renewal_reads_live_entry() {
        let backend = backend();
        let mut app = AppEntry::new("web", PolicySet::parse("read"));
        app.token_ttl = 60;
        app.token_max_ttl = 600;
        backend.write_app(&app).await.unwrap();

        let id = SelectorId::App("web".into());
        assert_eq!(
            backend.validate_selector_id(&id).await.unwrap(),
            TtlCeiling {
                token_ttl: 60,
                token_max_ttl: 600
            }
        );

        app.token_ttl = 120;
        backend.write_app(&app).await.unwrap();
        assert_eq!(
            backend.validate_selector_id(&id).await.unwrap().token_ttl,
            120
        );
    }

    #[tokio::test]
    async fn test_deleted_entry_is_fatal() {
        let backend = backend();
        backend
            .write_group(&GroupEntry::new("ops", ["web"], PolicySet::new()))
            .await
            .unwrap();
        backend.delete_group("ops").await.unwrap();
        assert!(matches!(
            backend
                .validate_selector_id(&SelectorId::Group("ops".into()))
                .await,
            Err(WardenError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_supergroup_renewal_needs_live_record() {
        let backend = backend();
        backend
            .write_app(&AppEntry::new("web", PolicySet::parse("read")))
            .await
            .unwrap();
        let request = SuperGroupRequest {
            apps: ["web".to_string()].into(),
            num_uses: 2,
            token_ttl: 30,
            ..SuperGroupRequest::default()
        };
        let issued = backend.issue_supergroup_secret_id(request).await.unwrap();

        let result = backend
            .validate_credentials(&issued.selector, &issued.secret_id)
            .await
            .unwrap();
        let ceiling = backend
            .validate_selector_id(&result.selector_id)
            .await
            .unwrap();
        assert_eq!(ceiling.token_ttl, 30);

        backend
            .validate_credentials(&issued.selector, &issued.secret_id)
            .await
            .unwrap();
        assert!(backend
            .validate_selector_id(&result.selector_id)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_renew_keeps_issue_time() {
        let backend = backend();
        let mut app = AppEntry::new("web", PolicySet::parse("read"));
        app.token_ttl = 100;
        app.token_max_ttl = 250;
        backend.write_app(&app).await.unwrap();

        let context = TokenContext::new(SelectorId::App("web".into()));
        let lease = Lease {
            ttl: 100,
            renewable: true,
            issued_at: 10_000,
        };

        backend.clock.advance(200);
        let renewed = backend.renew(&context, &lease).await.unwrap();
        assert_eq!(renewed.ttl, 50);
        assert_eq!(renewed.issued_at, 10_000);

        backend.clock.advance(50);
        assert!(backend.renew(&context, &renewed).await.is_err());
    }
}
