//! # Warden AppGroup - Layer 3: Credential Backend
//!
//! **Purpose**: Authenticate machine clients with usage-limited SecretIDs and
//! turn a successful login into a grant carrying the union of the policies
//! of an App, a Group of Apps, or an ad-hoc SuperGroup.
//!
//! ```text
//! login   → LoginRequest → validate_credentials (consumes a use) → compose → Auth
//! renewal → TokenContext → validate_selector_id → TtlCeiling::extend → Lease
//! ```
//!
//! Everything runs against an explicit [`AppGroupBackend`] context built
//! from a [`warden_core::BackendConfig`], a [`StorageEffects`] handler and a
//! [`PhysicalTimeEffects`] clock.
//!
//! [`StorageEffects`]: warden_core::effects::StorageEffects
//! [`PhysicalTimeEffects`]: warden_core::effects::PhysicalTimeEffects
//!
//! # Example
//!
//! ```no_run
//! use warden_appgroup::{AppEntry, AppGroupBackend, GroupEntry, LoginRequest, PolicySet};
//! use warden_core::BackendConfig;
//! use warden_effects::{MemoryStorageHandler, RealTimeHandler};
//!
//! # async fn run() -> warden_core::Result<()> {
//! let backend = AppGroupBackend::new(
//!     BackendConfig::with_salt("change-me"),
//!     MemoryStorageHandler::new(),
//!     RealTimeHandler::new(),
//! )?;
//! backend.write_app(&AppEntry::new("app1", PolicySet::parse("a,b"))).await?;
//! backend
//!     .write_group(&GroupEntry::new("group1", ["app1"], PolicySet::parse("e")))
//!     .await?;
//!
//! let issued = backend.issue_group_secret_id("group1").await?;
//! let request = LoginRequest::from_fields(None, Some(&issued.login_string()))
//!     .map_err(|e| warden_core::WardenError::invalid(e.to_string()))?;
//! let response = backend.login(&request).await?;
//! assert!(response.auth().is_some());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod backend;
pub mod compose;
pub mod entries;
pub mod error;
pub mod issue;
pub mod login;
pub mod policy;
pub mod renew;
pub mod selector;
pub mod types;
pub mod validate;

mod keys;
mod locks;

pub use backend::AppGroupBackend;
pub use error::AuthError;
pub use issue::IssuedSecretId;
pub use login::{Auth, LoginRequest, LoginResponse, LOGIN_HELP_DESCRIPTION, LOGIN_HELP_SYNOPSIS};
pub use policy::PolicySet;
pub use selector::{Selector, SelectorId, SUPERGROUP_SELECTOR};
pub use types::{
    AppEntry, AuthResult, GroupEntry, Lease, SecretIdRecord, SelectorRef, SuperGroupRef,
    SuperGroupRequest, TokenContext, TtlCeiling, TOKEN_CONTEXT_VERSION,
};
