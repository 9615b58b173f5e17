// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Tiered fetch engine
//!
//! Every lookup goes through exactly one of two strategies, picked when the
//! evaluation context is built:
//!
//! - **Reactive**: the live registry serves the object and subscribes the
//!   watcher to future changes. The registry keeps its own data fresh, so
//!   nothing is cached here.
//! - **CacheFirst**: check the ephemeral cache; on a miss, call the cluster
//!   API and backfill the cache, including "confirmed absent" for a Get that
//!   returned not found.
//!
//! Before either strategy runs, a cluster-scoped type under a namespace
//! restriction must be on the allowlist.

use async_trait::async_trait;
use kube::core::GroupVersionKind;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, trace};

use super::allowlist;
use super::cache::{EphemeralCache, ObjectIdentity};
use super::error::{LookupError, LookupResult};
use super::resolver::{DescriptorCache, ResourceTypeResolver};
use super::result::TemplateResult;
use super::selector::LabelSelector;
use crate::kubernetes::ResourceTypeDescriptor;

/// Direct read access to the cluster API
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Fetch one object; a missing object is `LookupError::NotFound`
    async fn get(
        &self,
        descriptor: &ResourceTypeDescriptor,
        namespace: &str,
        name: &str,
    ) -> LookupResult<Value>;

    /// List objects matching a canonical label selector (empty selects all)
    async fn list(
        &self,
        descriptor: &ResourceTypeDescriptor,
        namespace: &str,
        selector: &str,
    ) -> LookupResult<Vec<Value>>;
}

/// The object a reactive lookup is performed on behalf of
///
/// The live registry re-notifies this object when anything it read changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct WatcherRef {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

/// Subscription registry that serves reads and tracks who read what
#[async_trait]
pub trait LiveRegistry: Send + Sync {
    async fn resolve(&self, gvk: &GroupVersionKind) -> LookupResult<ResourceTypeDescriptor>;

    /// `Ok(None)` when the object does not exist
    async fn get(
        &self,
        watcher: &WatcherRef,
        gvk: &GroupVersionKind,
        namespace: &str,
        name: &str,
    ) -> LookupResult<Option<Value>>;

    async fn list(
        &self,
        watcher: &WatcherRef,
        gvk: &GroupVersionKind,
        namespace: &str,
        selector: &LabelSelector,
    ) -> LookupResult<Vec<Value>>;
}

/// Documents produced by a successful lookup
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutput {
    Object(Value),
    List(Vec<Value>),
}

impl LookupOutput {
    /// Number of documents found
    pub fn len(&self) -> usize {
        match self {
            LookupOutput::Object(_) => 1,
            LookupOutput::List(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render for a template: objects as-is, lists as `{"items": [...]}`
    pub fn into_value(self) -> Value {
        match self {
            LookupOutput::Object(value) => value,
            LookupOutput::List(items) => json!({ "items": items }),
        }
    }
}

/// One resolved lookup, ready to fetch
#[derive(Debug, Clone)]
pub struct FetchTarget<'a> {
    pub gvk: &'a GroupVersionKind,
    pub descriptor: &'a ResourceTypeDescriptor,
    /// Effective namespace after the namespace guard
    pub namespace: &'a str,
    /// Empty for a List
    pub name: &'a str,
    pub selector: &'a LabelSelector,
}

impl FetchTarget<'_> {
    fn is_list(&self) -> bool {
        self.name.is_empty()
    }

    fn identity(&self) -> ObjectIdentity {
        ObjectIdentity {
            group: self.gvk.group.clone(),
            version: self.gvk.version.clone(),
            kind: self.gvk.kind.clone(),
            namespace: self.namespace.to_string(),
            name: self.name.to_string(),
            selector: self.selector.to_string(),
        }
    }
}

/// Restrictions applied before anything is fetched
#[derive(Debug, Clone, Copy)]
pub struct AccessPolicy<'a> {
    /// Namespace lookups are confined to; empty for none
    pub lookup_namespace: &'a str,
    pub cluster_scoped_allow_list: &'a [allowlist::ClusterScopedObject],
}

impl AccessPolicy<'_> {
    /// Fail closed on a cluster-scoped type that is not allowlisted
    pub fn check(&self, target: &FetchTarget<'_>) -> LookupResult<()> {
        if target.descriptor.namespaced || self.lookup_namespace.is_empty() {
            return Ok(());
        }

        if allowlist::is_allowed(
            self.cluster_scoped_allow_list,
            &target.descriptor.group,
            &target.gvk.kind,
            target.name,
        ) {
            return Ok(());
        }

        debug!(
            kind = %target.gvk.kind,
            name = %target.name,
            restriction = %self.lookup_namespace,
            "Cluster-scoped lookup denied"
        );
        Err(LookupError::ClusterScopedLookupRestricted {
            kind: target.gvk.kind.clone(),
            name: target.name.to_string(),
        })
    }
}

/// How documents are obtained for one evaluation
pub enum FetchStrategy {
    Reactive {
        registry: Arc<dyn LiveRegistry>,
        watcher: WatcherRef,
    },
    CacheFirst {
        cluster: Arc<dyn ClusterApi>,
        types: DescriptorCache,
        cache: EphemeralCache,
    },
}

impl FetchStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            FetchStrategy::Reactive { .. } => "reactive",
            FetchStrategy::CacheFirst { .. } => "cache-first",
        }
    }

    /// Resolve a kind through the backend that belongs to this strategy
    pub async fn resolve_type(
        &self,
        gvk: &GroupVersionKind,
    ) -> LookupResult<ResourceTypeDescriptor> {
        match self {
            FetchStrategy::Reactive { registry, .. } => registry.resolve(gvk).await,
            FetchStrategy::CacheFirst { types, .. } => types.resolve(gvk).await,
        }
    }

    /// Run the access check, fetch, and flag sensitive reads
    ///
    /// `Ok(None)` is a Get answered by a cached "confirmed absent" entry. A
    /// missing object fetched for the first time is `Err(NotFound)`.
    pub async fn fetch(
        &self,
        policy: &AccessPolicy<'_>,
        target: &FetchTarget<'_>,
        result: &TemplateResult,
    ) -> LookupResult<Option<LookupOutput>> {
        policy.check(target)?;

        let output = match self {
            FetchStrategy::Reactive { registry, watcher } => {
                Some(Self::fetch_reactive(registry.as_ref(), watcher, target).await?)
            }
            FetchStrategy::CacheFirst { cluster, cache, .. } => {
                Self::fetch_cache_first(cluster.as_ref(), cache, target).await?
            }
        };

        if let Some(ref output) = output {
            result.record_read(&target.gvk.kind, output.len());
        }

        Ok(output)
    }

    async fn fetch_reactive(
        registry: &dyn LiveRegistry,
        watcher: &WatcherRef,
        target: &FetchTarget<'_>,
    ) -> LookupResult<LookupOutput> {
        if target.is_list() {
            let items = registry
                .list(watcher, target.gvk, target.namespace, target.selector)
                .await?;
            return Ok(LookupOutput::List(items));
        }

        match registry
            .get(watcher, target.gvk, target.namespace, target.name)
            .await?
        {
            Some(object) => Ok(LookupOutput::Object(object)),
            None => Err(LookupError::not_found(
                &target.gvk.kind,
                target.namespace,
                target.name,
            )),
        }
    }

    async fn fetch_cache_first(
        cluster: &dyn ClusterApi,
        cache: &EphemeralCache,
        target: &FetchTarget<'_>,
    ) -> LookupResult<Option<LookupOutput>> {
        let id = target.identity();

        if let Some(cached) = cache.lookup(&id).await {
            trace!(kind = %id.kind, name = %id.name, "Served from ephemeral cache");
            if target.is_list() {
                return Ok(Some(LookupOutput::List(cached)));
            }
            return Ok(cached.into_iter().next().map(LookupOutput::Object));
        }

        if target.is_list() {
            let items = cluster
                .list(target.descriptor, target.namespace, &id.selector)
                .await?;
            cache.store(id, items.clone()).await;
            return Ok(Some(LookupOutput::List(items)));
        }

        match cluster
            .get(target.descriptor, target.namespace, target.name)
            .await
        {
            Ok(object) => {
                cache.store(id, vec![object.clone()]).await;
                Ok(Some(LookupOutput::Object(object)))
            }
            Err(e) if e.is_not_found() => {
                cache.store(id, Vec::new()).await;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}
