// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Resource type discovery for Kubernetes clusters.
//!
//! Maps a group/version/kind to the REST resource that serves it. Every kind,
//! built-in or CRD, is resolved through the discovery API on demand, so only
//! what the cluster actually serves is ever queried.

use kube::Client;
use kube::core::GroupVersionKind;
use kube::discovery::{self, ApiCapabilities, ApiResource, Scope};
use tracing::debug;

use crate::lookup::{LookupError, LookupResult};

/// Shape of a resource type on the API server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTypeDescriptor {
    /// API group (empty string for core v1)
    pub group: String,
    pub version: String,
    pub kind: String,
    /// REST resource name (e.g., "configmaps")
    pub plural: String,
    pub namespaced: bool,
}

impl ResourceTypeDescriptor {
    pub fn new(group: &str, version: &str, kind: &str, plural: &str, namespaced: bool) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
            plural: plural.to_string(),
            namespaced,
        }
    }

    pub fn from_discovery(ar: &ApiResource, caps: &ApiCapabilities) -> Self {
        Self {
            group: ar.group.clone(),
            version: ar.version.clone(),
            kind: ar.kind.clone(),
            plural: ar.plural.clone(),
            namespaced: caps.scope == Scope::Namespaced,
        }
    }

    /// Get the full API group/version string
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// The kube dynamic API resource for this type
    pub fn api_resource(&self) -> ApiResource {
        ApiResource {
            group: self.group.clone(),
            version: self.version.clone(),
            api_version: self.api_version(),
            kind: self.kind.clone(),
            plural: self.plural.clone(),
        }
    }
}

/// (group, version, kind) key used by descriptor maps
pub type GvkKey = (String, String, String);

pub fn gvk_key(gvk: &GroupVersionKind) -> GvkKey {
    (gvk.group.clone(), gvk.version.clone(), gvk.kind.clone())
}

/// Ask the cluster's discovery API for a single kind
///
/// A group/version the server does not serve comes back as a 404, a kind
/// missing from a served group as a discovery error; both mean the type does
/// not exist.
pub async fn discover_kind(
    client: &Client,
    gvk: &GroupVersionKind,
) -> LookupResult<ResourceTypeDescriptor> {
    debug!(
        group = %gvk.group,
        version = %gvk.version,
        kind = %gvk.kind,
        "Discovering resource type"
    );

    match discovery::pinned_kind(client, gvk).await {
        Ok((ar, caps)) => Ok(ResourceTypeDescriptor::from_discovery(&ar, &caps)),
        Err(kube::Error::Discovery(e)) => {
            debug!(kind = %gvk.kind, error = %e, "Kind not served");
            Err(missing_type(gvk))
        }
        Err(kube::Error::Api(resp)) if resp.code == 404 => Err(missing_type(gvk)),
        Err(e) => Err(LookupError::Api(e)),
    }
}

pub fn missing_type(gvk: &GroupVersionKind) -> LookupError {
    LookupError::MissingResourceType {
        group: gvk.group.clone(),
        version: gvk.version.clone(),
        kind: gvk.kind.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gvk_key() {
        let gvk = GroupVersionKind::gvk("apps", "v1", "Deployment");
        assert_eq!(
            gvk_key(&gvk),
            ("apps".to_string(), "v1".to_string(), "Deployment".to_string())
        );
    }

    #[test]
    fn test_core_api_version() {
        let descriptor = ResourceTypeDescriptor::new("", "v1", "ConfigMap", "configmaps", true);
        assert_eq!(descriptor.api_version(), "v1");
        assert_eq!(descriptor.api_resource().api_version, "v1");
    }

    #[test]
    fn test_missing_type_error() {
        let err = missing_type(&GroupVersionKind::gvk("example.com", "v1", "Widget"));
        assert!(matches!(
            err,
            LookupError::MissingResourceType { ref group, ref kind, .. }
                if group == "example.com" && kind == "Widget"
        ));
    }

    #[test]
    fn test_api_resource_conversion() {
        let descriptor =
            ResourceTypeDescriptor::new("cert-manager.io", "v1", "Certificate", "certificates", true);
        let ar = descriptor.api_resource();
        assert_eq!(ar.api_version, "cert-manager.io/v1");
        assert_eq!(ar.plural, "certificates");

        let caps = ApiCapabilities {
            scope: Scope::Namespaced,
            subresources: vec![],
            operations: vec![],
        };
        assert_eq!(ResourceTypeDescriptor::from_discovery(&ar, &caps), descriptor);
    }
}
