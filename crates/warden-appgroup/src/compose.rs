//! Policy composition
//!
//! ```text
//! compose(App a)          = policies(a)
//! compose(Group g)        = ∪ policies(a) for a in g.apps  ∪ g.additional_policies
//! compose(SuperGroup s)   = ∪ policies(a) for a in s.apps
//!                         ∪ ∪ compose(g) for g in s.groups
//!                         ∪ s.additional_policies
//! ```
//!
//! Nesting stops at Group → App, so there is nothing to cycle through.
//! Member names that no longer resolve are skipped. The selector's own entry
//! must exist: an App or Group login against a deleted entry is a validation
//! failure.

use crate::backend::AppGroupBackend;
use crate::error::AuthError;
use crate::policy::PolicySet;
use crate::types::{GroupEntry, SelectorRef, SuperGroupRef};
use warden_core::effects::{PhysicalTimeEffects, StorageEffects};
use warden_core::WardenError;

impl<S, T> AppGroupBackend<S, T>
where
    S: StorageEffects,
    T: PhysicalTimeEffects,
{
    /// Compute the policies granted for `target`
    pub async fn compose(&self, target: &SelectorRef) -> Result<PolicySet, AuthError> {
        match target {
            SelectorRef::App { name } => match self.read_app(name).await? {
                Some(app) => Ok(app.policies),
                None => Err(AuthError::invalid_secret_id(format!(
                    "app {name:?} does not exist"
                ))),
            },
            SelectorRef::Group { name } => match self.read_group(name).await? {
                Some(group) => Ok(self.compose_group(&group).await?),
                None => Err(AuthError::invalid_secret_id(format!(
                    "group {name:?} does not exist"
                ))),
            },
            SelectorRef::SuperGroup(members) => Ok(self.compose_supergroup(members).await?),
        }
    }

    /// Union of the member Apps' policies and the Group's extra policies
    pub async fn compose_group(&self, group: &GroupEntry) -> Result<PolicySet, WardenError> {
        let mut policies = group.additional_policies.clone();
        self.union_app_policies(group.apps.iter(), &mut policies)
            .await?;
        tracing::debug!(group = %group.name, policies = %policies, "composed group policies");
        Ok(policies)
    }

    /// Union over the SuperGroup's Apps, composed Groups and extra policies
    pub async fn compose_supergroup(
        &self,
        members: &SuperGroupRef,
    ) -> Result<PolicySet, WardenError> {
        let mut policies = members.additional_policies.clone();
        self.union_app_policies(members.apps.iter(), &mut policies)
            .await?;

        for name in &members.groups {
            match self.read_group(name).await? {
                Some(group) => policies.extend_from(&self.compose_group(&group).await?),
                None => tracing::debug!(group = %name, "skipping unresolved supergroup member"),
            }
        }
        Ok(policies)
    }

    async fn union_app_policies<'a, I>(
        &self,
        names: I,
        policies: &mut PolicySet,
    ) -> Result<(), WardenError>
    where
        I: Iterator<Item = &'a String> + Send,
    {
        for name in names {
            match self.read_app(name).await? {
                Some(app) => policies.extend_from(&app.policies),
                None => tracing::debug!(app = %name, "skipping unresolved member app"),
            }
        }
        Ok(())
    }
}
