// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Resource type resolution
//!
//! Without a live registry, resource types are resolved through a descriptor
//! cache that lives as long as one evaluation. Every kind, core ones included,
//! is asked of the cluster's discovery API on first use, so a kind the cluster
//! does not serve fails as a missing type instead of reaching the REST API.

use async_trait::async_trait;
use kube::core::GroupVersionKind;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::error::LookupResult;
use crate::kubernetes::ResourceTypeDescriptor;
use crate::kubernetes::discovery::{GvkKey, gvk_key};

/// Maps a group/version/kind to its resource type
#[async_trait]
pub trait ResourceTypeResolver: Send + Sync {
    /// Fails with `MissingResourceType` when the cluster does not serve the kind
    async fn resolve(&self, gvk: &GroupVersionKind) -> LookupResult<ResourceTypeDescriptor>;
}

/// Source of resource types not known ahead of time
#[async_trait]
pub trait ApiDiscovery: Send + Sync {
    async fn discover(&self, gvk: &GroupVersionKind) -> LookupResult<ResourceTypeDescriptor>;
}

/// Memoising resolver backed by [`ApiDiscovery`]
pub struct DescriptorCache {
    discovery: Arc<dyn ApiDiscovery>,
    entries: RwLock<HashMap<GvkKey, ResourceTypeDescriptor>>,
}

impl DescriptorCache {
    /// Empty cache; every kind goes through discovery once
    pub fn new(discovery: Arc<dyn ApiDiscovery>) -> Self {
        Self {
            discovery,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ResourceTypeResolver for DescriptorCache {
    async fn resolve(&self, gvk: &GroupVersionKind) -> LookupResult<ResourceTypeDescriptor> {
        let key = gvk_key(gvk);
        if let Some(descriptor) = self.entries.read().await.get(&key) {
            return Ok(descriptor.clone());
        }

        // Failures are not memoised; the next lookup asks again
        let descriptor = self.discovery.discover(gvk).await?;
        debug!(
            kind = %gvk.kind,
            plural = %descriptor.plural,
            namespaced = descriptor.namespaced,
            "Cached resource type"
        );

        let mut entries = self.entries.write().await;
        Ok(entries.entry(key).or_insert(descriptor).clone())
    }
}
