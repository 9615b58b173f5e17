// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Error type shared by every stage of a lookup

use thiserror::Error;

/// Result alias for lookup operations
pub type LookupResult<T> = std::result::Result<T, LookupError>;

/// Everything a lookup can fail with
///
/// Only [`LookupError::NotFound`] is recoverable: the facade turns it into an
/// empty result. Everything else aborts the lookup.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("the apiVersion and kind are required")]
    MissingArguments,

    #[error("invalid apiVersion '{api_version}': {reason}")]
    InvalidApiVersion { api_version: String, reason: String },

    #[error("invalid label selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("the namespace argument is restricted to {restriction} (requested '{namespace}')")]
    RestrictedNamespace {
        namespace: String,
        restriction: String,
    },

    #[error("the resource type {kind} in group '{group}' version '{version}' is not available")]
    MissingResourceType {
        group: String,
        version: String,
        kind: String,
    },

    #[error("lookup of cluster-scoped resource '{kind}/{name}' is not allowed")]
    ClusterScopedLookupRestricted { kind: String, name: String },

    #[error("{kind} '{name}' not found{}", namespace_suffix(.namespace))]
    NotFound {
        kind: String,
        namespace: String,
        name: String,
    },

    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn namespace_suffix(namespace: &str) -> String {
    if namespace.is_empty() {
        String::new()
    } else {
        format!(" in namespace '{}'", namespace)
    }
}

impl LookupError {
    pub fn not_found(kind: &str, namespace: &str, name: &str) -> Self {
        LookupError::NotFound {
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    /// True for a missing object, including a raw 404 from the API server
    pub fn is_not_found(&self) -> bool {
        match self {
            LookupError::NotFound { .. } => true,
            LookupError::Api(kube::Error::Api(resp)) => resp.code == 404,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_with_namespace() {
        let err = LookupError::not_found("ConfigMap", "teamA", "ghost");
        assert_eq!(
            err.to_string(),
            "ConfigMap 'ghost' not found in namespace 'teamA'"
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn test_not_found_message_cluster_scoped() {
        let err = LookupError::not_found("ClusterRole", "", "admin");
        assert_eq!(err.to_string(), "ClusterRole 'admin' not found");
    }

    #[test]
    fn test_api_404_is_not_found() {
        let err = LookupError::Api(kube::Error::Api(kube::error::ErrorResponse {
            status: "Failure".to_string(),
            message: "configmaps \"ghost\" not found".to_string(),
            reason: "NotFound".to_string(),
            code: 404,
        }));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_other_errors_are_not_not_found() {
        let err = LookupError::ClusterScopedLookupRestricted {
            kind: "ClusterRole".to_string(),
            name: "admin".to_string(),
        };
        assert!(!err.is_not_found());
        assert_eq!(
            err.to_string(),
            "lookup of cluster-scoped resource 'ClusterRole/admin' is not allowed"
        );
    }
}
