// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Public entry point for template lookups
//!
//! A [`LookupEngine`] holds the long-lived backends. Each template evaluation
//! gets its own [`EvaluationContext`] with fresh caches and a fresh
//! [`TemplateResult`], so nothing leaks between renders.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::allowlist::ClusterScopedObject;
use super::cache::EphemeralCache;
use super::engine::{
    AccessPolicy, ClusterApi, FetchStrategy, FetchTarget, LiveRegistry, LookupOutput, WatcherRef,
};
use super::error::LookupResult;
use super::namespace::resolve_namespace;
use super::request::LookupRequest;
use super::resolver::{ApiDiscovery, DescriptorCache};
use super::result::TemplateResult;
use super::selector;

/// Per-evaluation lookup settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveOptions {
    /// Restrict lookups to this namespace; empty for no restriction
    #[serde(default)]
    pub lookup_namespace: String,
    /// Cluster-scoped objects readable while `lookup_namespace` is set
    #[serde(default)]
    pub cluster_scoped_allow_list: Vec<ClusterScopedObject>,
    /// Object to subscribe to changes on behalf of; enables the reactive path
    #[serde(skip)]
    pub watcher: Option<WatcherRef>,
}

impl ResolveOptions {
    pub fn restricted_to(namespace: &str) -> Self {
        Self {
            lookup_namespace: namespace.to_string(),
            ..Default::default()
        }
    }

    pub fn allow(mut self, entry: ClusterScopedObject) -> Self {
        self.cluster_scoped_allow_list.push(entry);
        self
    }

    pub fn with_watcher(mut self, watcher: WatcherRef) -> Self {
        self.watcher = Some(watcher);
        self
    }
}

/// Backends shared by all evaluations
#[derive(Clone)]
pub struct LookupEngine {
    cluster: Arc<dyn ClusterApi>,
    discovery: Arc<dyn ApiDiscovery>,
    live_registry: Option<Arc<dyn LiveRegistry>>,
}

impl LookupEngine {
    pub fn new(cluster: Arc<dyn ClusterApi>, discovery: Arc<dyn ApiDiscovery>) -> Self {
        Self {
            cluster,
            discovery,
            live_registry: None,
        }
    }

    /// Same client for fetching and discovery
    pub fn from_client<C>(client: Arc<C>) -> Self
    where
        C: ClusterApi + ApiDiscovery + 'static,
    {
        Self::new(client.clone(), client)
    }

    pub fn with_live_registry(mut self, registry: Arc<dyn LiveRegistry>) -> Self {
        self.live_registry = Some(registry);
        self
    }

    /// Start a template evaluation
    ///
    /// Lookups are reactive when a live registry is configured and the
    /// options name a watcher; otherwise they go through the ephemeral cache.
    pub fn evaluation(&self, options: ResolveOptions) -> EvaluationContext {
        let strategy = match (&self.live_registry, &options.watcher) {
            (Some(registry), Some(watcher)) => FetchStrategy::Reactive {
                registry: registry.clone(),
                watcher: watcher.clone(),
            },
            _ => FetchStrategy::CacheFirst {
                cluster: self.cluster.clone(),
                types: DescriptorCache::new(self.discovery.clone()),
                cache: EphemeralCache::new(),
            },
        };

        debug!(
            strategy = strategy.name(),
            lookup_namespace = %options.lookup_namespace,
            "Starting evaluation"
        );

        EvaluationContext {
            options,
            strategy,
            result: Arc::new(TemplateResult::new()),
        }
    }
}

/// Lookup state for one template evaluation
pub struct EvaluationContext {
    options: ResolveOptions,
    strategy: FetchStrategy,
    result: Arc<TemplateResult>,
}

impl EvaluationContext {
    pub fn new(options: ResolveOptions, strategy: FetchStrategy) -> Self {
        Self {
            options,
            strategy,
            result: Arc::new(TemplateResult::new()),
        }
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    pub fn strategy(&self) -> &FetchStrategy {
        &self.strategy
    }

    /// Shared accumulator, e.g. to read the sensitive flag after rendering
    pub fn template_result(&self) -> Arc<TemplateResult> {
        self.result.clone()
    }

    /// The template `lookup` function
    ///
    /// An empty `name` lists objects, optionally filtered by `selector`.
    /// A missing object is `Ok(None)`; every other failure, including a
    /// not-found answer to a List, is an error.
    pub async fn lookup(
        &self,
        api_version: &str,
        kind: &str,
        namespace: &str,
        name: &str,
        selector: Option<&str>,
    ) -> LookupResult<Option<LookupOutput>> {
        let request = LookupRequest {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
            selector: selector.map(str::to_string),
        };
        self.lookup_request(&request).await
    }

    pub async fn lookup_request(
        &self,
        request: &LookupRequest,
    ) -> LookupResult<Option<LookupOutput>> {
        debug!(
            api_version = %request.api_version,
            kind = %request.kind,
            namespace = %request.namespace,
            name = %request.name,
            "lookup"
        );

        // Only a Get can be empty; a List answers with a collection or an error
        let output = match self.get_or_list(request).await {
            Err(e) if e.is_not_found() && !request.is_list() => {
                debug!(kind = %request.kind, name = %request.name, "lookup found nothing");
                return Ok(None);
            }
            other => other?,
        };

        debug!(
            kind = %request.kind,
            found = output.as_ref().map(LookupOutput::len).unwrap_or(0),
            "lookup result"
        );
        Ok(output)
    }

    /// Everything up to and including the fetch; NotFound is still an error here
    async fn get_or_list(&self, request: &LookupRequest) -> LookupResult<Option<LookupOutput>> {
        request.check_arguments()?;
        let namespace = resolve_namespace(&request.namespace, &self.options.lookup_namespace)?;
        let gvk = request.group_version_kind()?;
        let selector = selector::parse_optional(request.selector.as_deref())?;
        let descriptor = self.strategy.resolve_type(&gvk).await?;

        let policy = AccessPolicy {
            lookup_namespace: &self.options.lookup_namespace,
            cluster_scoped_allow_list: &self.options.cluster_scoped_allow_list,
        };
        let target = FetchTarget {
            gvk: &gvk,
            descriptor: &descriptor,
            namespace: &namespace,
            name: &request.name,
            selector: &selector,
        };

        self.strategy.fetch(&policy, &target, &self.result).await
    }
}
