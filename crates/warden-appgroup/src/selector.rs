//! Selector resolution
//!
//! A selector names the category a SecretID was issued against:
//!
//! | Wire form      | Variant                  |
//! |----------------|--------------------------|
//! | `app/<name>`   | [`Selector::App`]        |
//! | `group/<name>` | [`Selector::Group`]      |
//! | `supergroup`   | [`Selector::SuperGroup`] |
//!
//! After a successful login the backend hands the host a [`SelectorId`], the
//! renewal anchor. It differs from a login selector only for SuperGroups,
//! which are pinned to the hashed SecretID they were issued under.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AuthError;
use warden_core::WardenError;

/// Literal selector of SuperGroup SecretIDs
pub const SUPERGROUP_SELECTOR: &str = "supergroup";

const APP_PREFIX: &str = "app/";
const GROUP_PREFIX: &str = "group/";
const SUPERGROUP_PREFIX: &str = "supergroup/";

/// Whether `name` is a valid App or Group name.
///
/// Names are word characters, `-` and `.`, and must start and end with a
/// word character. This keeps names from smuggling `/` into storage keys.
pub fn is_valid_name(name: &str) -> bool {
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    let (Some(first), Some(last)) = (name.chars().next(), name.chars().last()) else {
        return false;
    };
    is_word(first)
        && is_word(last)
        && name
            .chars()
            .all(|c| is_word(c) || c == '-' || c == '.')
}

/// Category a SecretID was issued against
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Selector {
    /// A single App
    App(String),
    /// A named Group of Apps
    Group(String),
    /// An ad-hoc combination carried by the SecretID record itself
    SuperGroup,
}

impl Selector {
    /// Parse a login selector
    pub fn parse(raw: &str) -> Result<Self, AuthError> {
        let malformed = || AuthError::MalformedSelector {
            value: raw.to_string(),
        };

        if raw == SUPERGROUP_SELECTOR {
            return Ok(Self::SuperGroup);
        }
        if let Some(name) = raw.strip_prefix(APP_PREFIX) {
            return is_valid_name(name)
                .then(|| Self::App(name.to_string()))
                .ok_or_else(malformed);
        }
        if let Some(name) = raw.strip_prefix(GROUP_PREFIX) {
            return is_valid_name(name)
                .then(|| Self::Group(name.to_string()))
                .ok_or_else(malformed);
        }
        Err(malformed())
    }

    /// Short category label used in logs and storage paths
    pub fn kind(&self) -> &'static str {
        match self {
            Self::App(_) => "app",
            Self::Group(_) => "group",
            Self::SuperGroup => SUPERGROUP_SELECTOR,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::App(name) => write!(f, "{APP_PREFIX}{name}"),
            Self::Group(name) => write!(f, "{GROUP_PREFIX}{name}"),
            Self::SuperGroup => f.write_str(SUPERGROUP_SELECTOR),
        }
    }
}

impl FromStr for Selector {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Resolved selector identifier carried across renewals
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SelectorId {
    /// Renewal re-reads the App entry
    App(String),
    /// Renewal re-reads the Group entry
    Group(String),
    /// Renewal re-reads the SuperGroup SecretID record, if it still exists
    SuperGroup {
        /// Hashed SecretID the grant was issued under
        hashed_id: String,
    },
}

impl SelectorId {
    /// Parse a renewal anchor. Failures are fatal: the host stored this value
    /// itself, so a bad one is an internal invariant violation.
    pub fn parse(raw: &str) -> Result<Self, WardenError> {
        let invalid = || WardenError::internal(format!("invalid selector identifier: {raw:?}"));

        if let Some(name) = raw.strip_prefix(APP_PREFIX) {
            return is_valid_name(name)
                .then(|| Self::App(name.to_string()))
                .ok_or_else(invalid);
        }
        if let Some(name) = raw.strip_prefix(GROUP_PREFIX) {
            return is_valid_name(name)
                .then(|| Self::Group(name.to_string()))
                .ok_or_else(invalid);
        }
        if let Some(hashed_id) = raw.strip_prefix(SUPERGROUP_PREFIX) {
            if !hashed_id.is_empty() && hashed_id.chars().all(|c| c.is_ascii_hexdigit()) {
                return Ok(Self::SuperGroup {
                    hashed_id: hashed_id.to_string(),
                });
            }
        }
        Err(invalid())
    }
}

impl fmt::Display for SelectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::App(name) => write!(f, "{APP_PREFIX}{name}"),
            Self::Group(name) => write!(f, "{GROUP_PREFIX}{name}"),
            Self::SuperGroup { hashed_id } => write!(f, "{SUPERGROUP_PREFIX}{hashed_id}"),
        }
    }
}

impl TryFrom<String> for SelectorId {
    type Error = WardenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SelectorId> for String {
    fn from(id: SelectorId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_categories() {
        assert_eq!(
            Selector::parse("app/web").unwrap(),
            Selector::App("web".into())
        );
        assert_eq!(
            Selector::parse("group/ops-team").unwrap(),
            Selector::Group("ops-team".into())
        );
        assert_eq!(Selector::parse("supergroup").unwrap(), Selector::SuperGroup);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for raw in [
            "",
            "app/",
            "group/",
            "app",
            "supergroup/x",
            "user/bob",
            "app/a/b",
            "app/../x",
            "App/web",
            "app/-web",
        ] {
            assert!(
                matches!(
                    Selector::parse(raw),
                    Err(AuthError::MalformedSelector { .. })
                ),
                "{raw:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_display_matches_wire_form() {
        for raw in ["app/web", "group/g1", "supergroup"] {
            assert_eq!(Selector::parse(raw).unwrap().to_string(), raw);
        }
    }

    #[test]
    fn test_name_validation() {
        assert!(is_valid_name("a"));
        assert!(is_valid_name("app_1.prod-east"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("trailing-"));
        assert!(!is_valid_name("has space"));
        assert!(!is_valid_name("slash/inside"));
    }

    #[test]
    fn test_selector_id_parse() {
        assert_eq!(
            SelectorId::parse("supergroup/ab12").unwrap(),
            SelectorId::SuperGroup {
                hashed_id: "ab12".into()
            }
        );
        assert!(SelectorId::parse("supergroup").is_err());
        assert!(SelectorId::parse("supergroup/not-hex").is_err());
        assert!(SelectorId::parse("").is_err());
    }

    #[test]
    fn test_selector_id_serializes_as_string() {
        let id = SelectorId::Group("g1".into());
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""group/g1""#);
        let back: SelectorId = serde_json::from_str(r#""app/web""#).unwrap();
        assert_eq!(back, SelectorId::App("web".into()));
        assert!(serde_json::from_str::<SelectorId>(r#""bogus""#).is_err());
    }
}
