// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Allowlist for cluster-scoped objects
//!
//! When lookups are restricted to a namespace, cluster-scoped objects are
//! denied unless an entry names them. Any field of an entry may be `"*"`.

use serde::{Deserialize, Serialize};

pub const WILDCARD: &str = "*";

/// One allowlist entry (or the object being checked against it)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterScopedObject {
    #[serde(default)]
    pub group: String,
    pub kind: String,
    pub name: String,
}

impl ClusterScopedObject {
    pub fn new(group: &str, kind: &str, name: &str) -> Self {
        Self {
            group: group.to_string(),
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }

    fn field_matches(pattern: &str, value: &str) -> bool {
        pattern == WILDCARD || pattern == value
    }

    /// Does this entry cover the given object
    pub fn covers(&self, group: &str, kind: &str, name: &str) -> bool {
        Self::field_matches(&self.group, group)
            && Self::field_matches(&self.kind, kind)
            && Self::field_matches(&self.name, name)
    }
}

impl std::str::FromStr for ClusterScopedObject {
    type Err = String;

    /// Parse `group/kind/name`; the core group is written as an empty segment (`/Namespace/*`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        match parts.as_slice() {
            [group, kind, name] if !kind.is_empty() && !name.is_empty() => {
                Ok(Self::new(group, kind, name))
            }
            _ => Err(format!(
                "invalid allowlist entry '{}', expected GROUP/KIND/NAME",
                s
            )),
        }
    }
}

/// Default-deny check: true only if some entry covers (group, kind, name)
pub fn is_allowed(allowlist: &[ClusterScopedObject], group: &str, kind: &str, name: &str) -> bool {
    allowlist.iter().any(|entry| entry.covers(group, kind, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RBAC: &str = "rbac.authorization.k8s.io";

    #[test]
    fn test_empty_allowlist_denies() {
        assert!(!is_allowed(&[], RBAC, "ClusterRole", "admin"));
        assert!(!is_allowed(&[], "", "Namespace", ""));
    }

    #[test]
    fn test_full_wildcard_allows_everything() {
        let list = vec![ClusterScopedObject::new("*", "*", "*")];
        assert!(is_allowed(&list, RBAC, "ClusterRole", "admin"));
        assert!(is_allowed(&list, "", "Node", "worker-1"));
        assert!(is_allowed(&list, "", "Namespace", ""));
    }

    #[test]
    fn test_literal_entry_denies_other_names() {
        let list = vec![ClusterScopedObject::new("rbac", "ClusterRole", "admin")];
        assert!(is_allowed(&list, "rbac", "ClusterRole", "admin"));
        assert!(!is_allowed(&list, "rbac", "ClusterRole", "other"));
        assert!(!is_allowed(&list, "other", "ClusterRole", "admin"));
    }

    #[test]
    fn test_partial_wildcards() {
        let list = vec![
            ClusterScopedObject::new("", "Namespace", "*"),
            ClusterScopedObject::new("*", "ClusterRole", "view"),
        ];
        assert!(is_allowed(&list, "", "Namespace", "kube-system"));
        assert!(is_allowed(&list, RBAC, "ClusterRole", "view"));
        assert!(!is_allowed(&list, RBAC, "ClusterRole", "edit"));
        assert!(!is_allowed(&list, "", "Node", "worker-1"));
    }

    #[test]
    fn test_parse_entry() {
        let entry: ClusterScopedObject = "/Namespace/*".parse().unwrap();
        assert_eq!(entry, ClusterScopedObject::new("", "Namespace", "*"));

        let entry: ClusterScopedObject = "*/*/*".parse().unwrap();
        assert_eq!(entry, ClusterScopedObject::new("*", "*", "*"));

        assert!("ClusterRole/admin".parse::<ClusterScopedObject>().is_err());
        assert!("a/b/c/d".parse::<ClusterScopedObject>().is_err());
    }

    #[test]
    fn test_deserialize_entry_without_group() {
        let entry: ClusterScopedObject =
            serde_json::from_str(r#"{"kind": "Namespace", "name": "*"}"#).unwrap();
        assert_eq!(entry.group, "");
    }
}
