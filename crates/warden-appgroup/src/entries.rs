//! App and Group management
//!
//! Entries are written by operators and read on every login. Names are
//! validated here so nothing downstream ever builds a storage key from an
//! untrusted string.

use crate::backend::AppGroupBackend;
use crate::keys;
use crate::selector::{is_valid_name, Selector};
use crate::types::{AppEntry, GroupEntry};
use warden_core::effects::{PhysicalTimeEffects, StorageEffects};
use warden_core::WardenError;

fn check_name(kind: &str, name: &str) -> Result<(), WardenError> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(WardenError::invalid(format!("invalid {kind} name: {name:?}")))
    }
}

impl<S, T> AppGroupBackend<S, T>
where
    S: StorageEffects,
    T: PhysicalTimeEffects,
{
    /// Create or replace an App
    pub async fn write_app(&self, app: &AppEntry) -> Result<(), WardenError> {
        check_name("app", &app.name)?;
        app.validate()?;
        self.put_json(&keys::app_key(&app.name), app).await?;
        tracing::info!(app = %app.name, policies = %app.policies, "wrote app");
        Ok(())
    }

    /// Fetch an App; `None` when it does not exist
    pub async fn read_app(&self, name: &str) -> Result<Option<AppEntry>, WardenError> {
        if !is_valid_name(name) {
            return Ok(None);
        }
        self.get_json(&keys::app_key(name)).await
    }

    /// Delete an App together with every SecretID issued against it.
    ///
    /// Groups that list the App keep the name; composition skips it.
    pub async fn delete_app(&self, name: &str) -> Result<bool, WardenError> {
        check_name("app", name)?;
        let removed = self.storage.remove(&keys::app_key(name)).await?;
        let purged = self.purge_secret_ids(&Selector::App(name.to_string())).await?;
        tracing::info!(app = %name, removed, purged, "deleted app");
        Ok(removed)
    }

    /// Names of all Apps, sorted
    pub async fn list_apps(&self) -> Result<Vec<String>, WardenError> {
        self.list_names(keys::APP_PREFIX).await
    }

    /// Create or replace a Group.
    ///
    /// Member Apps need not exist yet; composition skips names that do not
    /// resolve.
    pub async fn write_group(&self, group: &GroupEntry) -> Result<(), WardenError> {
        check_name("group", &group.name)?;
        for app in &group.apps {
            check_name("app", app)?;
        }
        group.validate()?;
        self.put_json(&keys::group_key(&group.name), group).await?;
        tracing::info!(
            group = %group.name,
            apps = group.apps.len(),
            additional_policies = %group.additional_policies,
            "wrote group"
        );
        Ok(())
    }

    /// Fetch a Group; `None` when it does not exist
    pub async fn read_group(&self, name: &str) -> Result<Option<GroupEntry>, WardenError> {
        if !is_valid_name(name) {
            return Ok(None);
        }
        self.get_json(&keys::group_key(name)).await
    }

    /// Delete a Group together with every SecretID issued against it
    pub async fn delete_group(&self, name: &str) -> Result<bool, WardenError> {
        check_name("group", name)?;
        let removed = self.storage.remove(&keys::group_key(name)).await?;
        let purged = self
            .purge_secret_ids(&Selector::Group(name.to_string()))
            .await?;
        tracing::info!(group = %name, removed, purged, "deleted group");
        Ok(removed)
    }

    /// Names of all Groups, sorted
    pub async fn list_groups(&self) -> Result<Vec<String>, WardenError> {
        self.list_names(keys::GROUP_PREFIX).await
    }

    async fn list_names(&self, prefix: &str) -> Result<Vec<String>, WardenError> {
        let mut names: Vec<String> = self
            .storage
            .list_keys(Some(prefix))
            .await?
            .into_iter()
            .filter_map(|key| key.strip_prefix(prefix).map(str::to_string))
            .filter(|name| !name.contains('/'))
            .collect();
        names.sort();
        Ok(names)
    }

    async fn purge_secret_ids(&self, selector: &Selector) -> Result<usize, WardenError> {
        let record_keys = self
            .storage
            .list_keys(Some(&keys::secret_id_namespace(selector)))
            .await?;
        let mut purged = 0;
        for key in record_keys {
            let _guard = self.locks.lock(keys::hashed_id_of(&key)).await;
            if self.storage.remove(&key).await? {
                purged += 1;
            }
        }
        Ok(purged)
    }
}
