//! Policy sets
//!
//! A policy is an opaque string the host maps to a unit of access. Every set
//! handed out by this crate is sanitized on the way in: names are trimmed and
//! lowercased, empty names are dropped, and `root` is never admitted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Name of the policy that is never granted through this backend
pub const ROOT_POLICY: &str = "root";

/// Deduplicated, lexicographically ordered set of policy names
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct PolicySet(BTreeSet<String>);

impl PolicySet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comma-separated list such as `"a, b,B,root"`
    pub fn parse(list: &str) -> Self {
        list.split(',').collect()
    }

    /// Insert one policy after sanitizing it. Returns whether the set grew.
    pub fn insert(&mut self, policy: &str) -> bool {
        let policy = policy.trim().to_lowercase();
        if policy.is_empty() || policy == ROOT_POLICY {
            return false;
        }
        self.0.insert(policy)
    }

    /// Add every policy of `other`
    pub fn extend_from(&mut self, other: &PolicySet) {
        self.0.extend(other.0.iter().cloned());
    }

    /// Union of two sets
    pub fn union(mut self, other: &PolicySet) -> Self {
        self.extend_from(other);
        self
    }

    /// Whether `policy` is in the set
    pub fn contains(&self, policy: &str) -> bool {
        self.0.contains(policy)
    }

    /// Number of policies
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in lexicographic order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Sorted list of policy names
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for PolicySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for policy in iter {
            set.insert(policy.as_ref());
        }
        set
    }
}

impl From<Vec<String>> for PolicySet {
    fn from(policies: Vec<String>) -> Self {
        policies.into_iter().collect()
    }
}

impl From<PolicySet> for Vec<String> {
    fn from(set: PolicySet) -> Self {
        set.0.into_iter().collect()
    }
}

impl fmt::Display for PolicySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        write!(f, "{}", joined.join(","))
    }
}
