//! Data model of the AppGroup backend
//!
//! App and Group entries are long-lived configuration. SecretID records are
//! short-lived credentials, one per issued secret identifier, stored under
//! the namespace of the selector they were issued against.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::policy::PolicySet;
use crate::selector::{Selector, SelectorId};
use warden_core::WardenError;

/// Current [`TokenContext`] layout version
pub const TOKEN_CONTEXT_VERSION: u32 = 1;

/// Check a TTL pair the way every entry and request does
fn validate_ttls(token_ttl: u64, token_max_ttl: u64) -> Result<(), WardenError> {
    if token_max_ttl > 0 && token_ttl > token_max_ttl {
        return Err(WardenError::invalid(format!(
            "token_ttl ({token_ttl}) cannot exceed token_max_ttl ({token_max_ttl})"
        )));
    }
    Ok(())
}

/// An individual App
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppEntry {
    /// Unique name
    pub name: String,
    /// Policies granted to the App
    pub policies: PolicySet,
    /// Uses per issued SecretID; 0 means unlimited
    #[serde(default)]
    pub num_uses: u32,
    /// Lifetime of issued SecretIDs in seconds; 0 means no expiry
    #[serde(default, alias = "userid_ttl")]
    pub secret_id_ttl: u64,
    /// Lease TTL of issued grants in seconds
    #[serde(default)]
    pub token_ttl: u64,
    /// Hard lease ceiling in seconds; 0 falls back to the system maximum
    #[serde(default)]
    pub token_max_ttl: u64,
}

impl AppEntry {
    /// App with the given policies and no limits
    pub fn new(name: impl Into<String>, policies: PolicySet) -> Self {
        Self {
            name: name.into(),
            policies,
            ..Self::default()
        }
    }

    /// Validate the TTL pair
    pub fn validate(&self) -> Result<(), WardenError> {
        validate_ttls(self.token_ttl, self.token_max_ttl)
    }
}

/// A named Group of Apps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEntry {
    /// Unique name
    pub name: String,
    /// Names of member Apps
    pub apps: BTreeSet<String>,
    /// Policies granted on top of the member Apps' policies
    #[serde(default)]
    pub additional_policies: PolicySet,
    /// Uses per issued SecretID; 0 means unlimited
    #[serde(default)]
    pub num_uses: u32,
    /// Lifetime of issued SecretIDs in seconds; 0 means no expiry
    #[serde(default, alias = "userid_ttl")]
    pub secret_id_ttl: u64,
    /// Lease TTL of issued grants in seconds
    #[serde(default)]
    pub token_ttl: u64,
    /// Hard lease ceiling in seconds; 0 falls back to the system maximum
    #[serde(default)]
    pub token_max_ttl: u64,
}

impl GroupEntry {
    /// Group over `apps` with extra policies and no limits
    pub fn new<I, S>(name: impl Into<String>, apps: I, additional_policies: PolicySet) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            apps: apps.into_iter().map(Into::into).collect(),
            additional_policies,
            ..Self::default()
        }
    }

    /// Validate the TTL pair
    pub fn validate(&self) -> Result<(), WardenError> {
        validate_ttls(self.token_ttl, self.token_max_ttl)
    }
}

/// Issuance request for an ad-hoc SuperGroup SecretID
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperGroupRequest {
    /// Apps whose policies are included
    #[serde(default)]
    pub apps: BTreeSet<String>,
    /// Groups whose composed policies are included
    #[serde(default)]
    pub groups: BTreeSet<String>,
    /// Policies granted on top of the members'
    #[serde(default)]
    pub additional_policies: PolicySet,
    /// Uses of the issued SecretID; 0 means unlimited
    #[serde(default)]
    pub num_uses: u32,
    /// Lifetime of the issued SecretID in seconds; 0 means no expiry
    #[serde(default, alias = "userid_ttl")]
    pub secret_id_ttl: u64,
    /// Lease TTL of issued grants in seconds
    #[serde(default)]
    pub token_ttl: u64,
    /// Hard lease ceiling in seconds
    #[serde(default)]
    pub token_max_ttl: u64,
}

impl SuperGroupRequest {
    /// Validate membership and the TTL pair
    pub fn validate(&self) -> Result<(), WardenError> {
        if self.apps.is_empty() && self.groups.is_empty() {
            return Err(WardenError::invalid(
                "a supergroup needs at least one app or group",
            ));
        }
        validate_ttls(self.token_ttl, self.token_max_ttl)
    }
}

/// Constituents of a SuperGroup, frozen into its SecretID record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperGroupRef {
    /// Member Apps
    pub apps: BTreeSet<String>,
    /// Member Groups
    pub groups: BTreeSet<String>,
    /// Extra policies
    pub additional_policies: PolicySet,
}

/// What a SecretID record was issued against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectorRef {
    /// A single App
    App {
        /// App name
        name: String,
    },
    /// A named Group
    Group {
        /// Group name
        name: String,
    },
    /// An ad-hoc SuperGroup
    #[serde(rename = "supergroup")]
    SuperGroup(SuperGroupRef),
}

impl SelectorRef {
    /// Whether a record carrying this reference may be stored under `selector`
    pub fn matches(&self, selector: &Selector) -> bool {
        match (self, selector) {
            (Self::App { name }, Selector::App(other)) => name == other,
            (Self::Group { name }, Selector::Group(other)) => name == other,
            (Self::SuperGroup(_), Selector::SuperGroup) => true,
            _ => false,
        }
    }
}

/// One issued secret identifier, stored in hashed form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretIdRecord {
    /// Keyed hash of the secret identifier
    pub hashed_id: String,
    /// Category and constituents the SecretID was issued against
    pub selector_ref: SelectorRef,
    /// Unix seconds at issuance
    pub creation_time: u64,
    /// Unix seconds after which the record is invalid; 0 means never
    pub expiration_time: u64,
    /// Uses granted at issuance; 0 means unlimited
    pub num_uses_total: u32,
    /// Uses left; meaningful only when `num_uses_total > 0`
    pub num_uses_remaining: u32,
    /// Lease TTL of grants from this SecretID
    pub token_ttl: u64,
    /// Hard lease ceiling of grants from this SecretID
    pub token_max_ttl: u64,
}

impl SecretIdRecord {
    /// Whether the record has passed a non-zero expiration time
    pub fn is_expired(&self, now: u64) -> bool {
        self.expiration_time != 0 && now > self.expiration_time
    }

    /// Whether the record is use-limited and has no uses left
    pub fn is_exhausted(&self) -> bool {
        self.num_uses_total > 0 && self.num_uses_remaining == 0
    }

    /// Renewal anchor for grants from this record
    pub fn selector_id(&self) -> SelectorId {
        match &self.selector_ref {
            SelectorRef::App { name } => SelectorId::App(name.clone()),
            SelectorRef::Group { name } => SelectorId::Group(name.clone()),
            SelectorRef::SuperGroup(_) => SelectorId::SuperGroup {
                hashed_id: self.hashed_id.clone(),
            },
        }
    }

    /// The TTL ceiling this record grants
    pub fn ttl_ceiling(&self) -> TtlCeiling {
        TtlCeiling {
            token_ttl: self.token_ttl,
            token_max_ttl: self.token_max_ttl,
        }
    }
}

/// Outcome of a successful credential validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResult {
    /// Renewal anchor
    pub selector_id: SelectorId,
    /// Aggregated, deduplicated policies
    pub policies: PolicySet,
    /// Lease TTL in seconds
    pub token_ttl: u64,
    /// Hard lease ceiling in seconds
    pub token_max_ttl: u64,
}

impl AuthResult {
    /// The TTL ceiling of the grant
    pub fn ttl_ceiling(&self) -> TtlCeiling {
        TtlCeiling {
            token_ttl: self.token_ttl,
            token_max_ttl: self.token_max_ttl,
        }
    }
}

/// TTL settings the host's lease extension must honor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlCeiling {
    /// Lease TTL granted per extension
    pub token_ttl: u64,
    /// Hard ceiling measured from issuance; 0 defers to the system maximum
    pub token_max_ttl: u64,
}

impl TtlCeiling {
    /// Extend a lease issued at `issued_at`.
    ///
    /// The new TTL is `token_ttl` (or the effective maximum when `token_ttl`
    /// is 0), clamped so the lease never outlives `issued_at + max`. The
    /// effective maximum is `token_max_ttl` capped by `system_max_ttl`.
    pub fn extend(
        &self,
        issued_at: u64,
        now: u64,
        system_max_ttl: u64,
    ) -> Result<u64, WardenError> {
        let max_ttl = match self.token_max_ttl {
            0 => system_max_ttl,
            max => max.min(system_max_ttl),
        };
        let ttl = match self.token_ttl {
            0 => max_ttl,
            ttl => ttl,
        };

        let deadline = issued_at.saturating_add(max_ttl);
        if now >= deadline {
            return Err(WardenError::invalid(format!(
                "lease issued at {issued_at} has reached its maximum TTL of {max_ttl}s"
            )));
        }
        Ok(ttl.min(deadline - now))
    }
}

/// Lease attached to a grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    /// Seconds the grant stays valid from `issued_at` (or the last renewal)
    pub ttl: u64,
    /// Whether the host may renew the grant
    pub renewable: bool,
    /// Unix seconds the grant was first issued
    pub issued_at: u64,
}

/// Typed, versioned context the host stores with a grant for renewal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenContext {
    /// Layout version, currently [`TOKEN_CONTEXT_VERSION`]
    pub version: u32,
    /// Renewal anchor
    pub selector_id: SelectorId,
}

impl TokenContext {
    /// Context for a freshly issued grant
    pub fn new(selector_id: SelectorId) -> Self {
        Self {
            version: TOKEN_CONTEXT_VERSION,
            selector_id,
        }
    }

    /// Decode a context the host stored as JSON.
    ///
    /// Every failure is fatal: a grant without a readable identity anchor
    /// cannot be renewed.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, WardenError> {
        match value.get("selector_id") {
            None | Some(serde_json::Value::Null) => {
                return Err(WardenError::internal(
                    "failed to fetch selector_id during renewal",
                ))
            }
            Some(serde_json::Value::String(s)) if s.is_empty() => {
                return Err(WardenError::internal(
                    "failed to fetch selector_id during renewal",
                ))
            }
            Some(_) => {}
        }
        let context: Self = serde_json::from_value(value.clone())?;
        if context.version != TOKEN_CONTEXT_VERSION {
            return Err(WardenError::internal(format!(
                "unsupported token context version {}",
                context.version
            )));
        }
        Ok(context)
    }

    /// Encode for storage by the host
    pub fn to_json(&self) -> Result<serde_json::Value, WardenError> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(expiration_time: u64, total: u32, remaining: u32) -> SecretIdRecord {
        SecretIdRecord {
            hashed_id: "ab".into(),
            selector_ref: SelectorRef::App { name: "web".into() },
            creation_time: 100,
            expiration_time,
            num_uses_total: total,
            num_uses_remaining: remaining,
            token_ttl: 60,
            token_max_ttl: 120,
        }
    }

    #[test]
    fn test_expiry_and_exhaustion() {
        assert!(!record(0, 0, 0).is_expired(u64::MAX));
        assert!(!record(200, 0, 0).is_expired(200));
        assert!(record(200, 0, 0).is_expired(201));
        assert!(!record(0, 0, 0).is_exhausted());
        assert!(record(0, 3, 0).is_exhausted());
        assert!(!record(0, 3, 1).is_exhausted());
    }

    #[test]
    fn test_selector_ref_tagging() {
        let json =
            serde_json::to_value(SelectorRef::SuperGroup(SuperGroupRef::default())).unwrap();
        assert_eq!(json["kind"], "supergroup");
        let app: SelectorRef = serde_json::from_str(r#"{"kind":"app","name":"web"}"#).unwrap();
        assert!(app.matches(&Selector::App("web".into())));
        assert!(!app.matches(&Selector::Group("web".into())));
    }

    #[test]
    fn test_ttl_validation() {
        let mut app = AppEntry::new("web", PolicySet::parse("a"));
        app.token_ttl = 600;
        app.token_max_ttl = 300;
        assert!(app.validate().is_err());
        app.token_max_ttl = 0;
        assert!(app.validate().is_ok());
    }

    #[test]
    fn test_legacy_userid_ttl_alias() {
        let group: GroupEntry =
            serde_json::from_str(r#"{"name":"g","apps":["a"],"userid_ttl":30}"#).unwrap();
        assert_eq!(group.secret_id_ttl, 30);
    }

    #[test]
    fn test_extend_clamps_to_deadline() {
        let ceiling = TtlCeiling {
            token_ttl: 100,
            token_max_ttl: 250,
        };
        assert_eq!(ceiling.extend(1_000, 1_000, 10_000).unwrap(), 100);
        assert_eq!(ceiling.extend(1_000, 1_200, 10_000).unwrap(), 50);
        assert!(ceiling.extend(1_000, 1_250, 10_000).is_err());
    }

    #[test]
    fn test_extend_falls_back_to_system_max() {
        let ceiling = TtlCeiling {
            token_ttl: 0,
            token_max_ttl: 0,
        };
        assert_eq!(ceiling.extend(0, 10, 100).unwrap(), 90);
        let capped = TtlCeiling {
            token_ttl: 50,
            token_max_ttl: 1_000,
        };
        assert_eq!(capped.extend(0, 80, 100).unwrap(), 20);
    }

    #[test]
    fn test_token_context_round_trip_and_version() {
        let context = TokenContext::new(SelectorId::Group("g1".into()));
        let json = context.to_json().unwrap();
        assert_eq!(json["selector_id"], "group/g1");
        assert_eq!(TokenContext::from_json(&json).unwrap(), context);

        let future = serde_json::json!({"version": 2, "selector_id": "group/g1"});
        assert!(TokenContext::from_json(&future).is_err());
    }

    #[test]
    fn test_token_context_missing_selector_is_fatal() {
        for value in [
            serde_json::json!({"version": 1}),
            serde_json::json!({"version": 1, "selector_id": ""}),
            serde_json::json!({"version": 1, "selector_id": null}),
        ] {
            let err = TokenContext::from_json(&value).unwrap_err();
            assert_eq!(
                err,
                WardenError::internal("failed to fetch selector_id during renewal")
            );
        }
    }
}
