use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use kube::api::{DynamicObject, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::core::GroupVersionKind;
use kube::{Api, Client, Config};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};

use super::discovery::{self, ResourceTypeDescriptor};
use crate::lookup::{ApiDiscovery, ClusterApi, LookupError, LookupResult};

/// Timeout for connecting to K8s API
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for reading K8s API responses
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Page size for paginated list requests
/// Smaller pages reduce memory pressure and allow faster initial response
const PAGE_SIZE: u32 = 500;

/// Read-only handle on one cluster
///
/// Serves both the on-demand fetches of the lookup engine and the discovery
/// of every resource type a lookup names.
#[derive(Clone)]
pub struct K8sClient {
    client: Client,
    context: String,
}

impl K8sClient {
    /// Connect using a kubeconfig context, or infer the configuration
    /// (current kubeconfig context, then in-cluster service account) when none is given
    pub async fn new(context: Option<&str>) -> Result<Self> {
        let (mut config, context_name) = match context {
            Some(context) => {
                let kubeconfig = Kubeconfig::read()?;

                // Verify context exists
                if !kubeconfig.contexts.iter().any(|c| c.name == context) {
                    return Err(anyhow!("Context '{}' not found in kubeconfig", context));
                }

                let config = Config::from_custom_kubeconfig(
                    kubeconfig,
                    &KubeConfigOptions {
                        context: Some(context.to_string()),
                        ..Default::default()
                    },
                )
                .await
                .with_context(|| format!("Failed to load kubeconfig for context '{}'", context))?;
                (config, context.to_string())
            }
            None => {
                let config = Config::infer()
                    .await
                    .context("Failed to infer Kubernetes configuration")?;
                (config, "default".to_string())
            }
        };

        // Set timeouts for reliability
        config.connect_timeout = Some(CONNECT_TIMEOUT);
        config.read_timeout = Some(READ_TIMEOUT);

        let client = Client::try_from(config)
            .with_context(|| format!("Failed to create client for context '{}'", context_name))?;

        debug!(context = %context_name, "Created Kubernetes client");

        Ok(Self::from_client(client, &context_name))
    }

    pub fn from_client(client: Client, context: &str) -> Self {
        Self {
            client,
            context: context.to_string(),
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    /// Create API handle based on resource scope
    ///
    /// Only namespaced types with a namespace get a namespaced endpoint; a
    /// namespaced type without one is read across all namespaces.
    fn api(&self, descriptor: &ResourceTypeDescriptor, namespace: &str) -> Api<DynamicObject> {
        let ar = descriptor.api_resource();
        let (api, scope) = if descriptor.namespaced && !namespace.is_empty() {
            (
                Api::namespaced_with(self.client.clone(), namespace, &ar),
                "namespaced",
            )
        } else if descriptor.namespaced {
            (Api::all_with(self.client.clone(), &ar), "all-namespaces")
        } else {
            (Api::all_with(self.client.clone(), &ar), "cluster-scoped")
        };

        debug!(
            context = %self.context,
            kind = %descriptor.kind,
            namespace = %namespace,
            scope = %scope,
            "API scope"
        );

        api
    }

    /// List all pages using continue tokens
    async fn list_all(
        &self,
        api: &Api<DynamicObject>,
        base_params: &ListParams,
        kind: &str,
    ) -> LookupResult<Vec<DynamicObject>> {
        let mut all_items: Vec<DynamicObject> = Vec::new();
        let mut continue_token: Option<String> = None;
        let mut page_count = 0u32;

        loop {
            let mut params = base_params.clone().limit(PAGE_SIZE);
            if let Some(ref token) = continue_token {
                params = params.continue_token(token);
            }

            let list = api.list(&params).await?;
            let items_count = list.items.len();
            all_items.extend(list.items);
            page_count += 1;

            match list.metadata.continue_ {
                Some(token) if !token.is_empty() => {
                    debug!(
                        kind = %kind,
                        context = %self.context,
                        page = page_count,
                        items_this_page = items_count,
                        total_so_far = all_items.len(),
                        "Fetched page, continuing"
                    );
                    continue_token = Some(token);
                }
                _ => break,
            }
        }

        if page_count > 1 {
            debug!(
                kind = %kind,
                context = %self.context,
                pages = page_count,
                total_items = all_items.len(),
                "Pagination complete"
            );
        }

        Ok(all_items)
    }
}

/// Serialize an object, filling in apiVersion and kind
/// (the list API doesn't include these per-item)
fn to_document(object: DynamicObject, descriptor: &ResourceTypeDescriptor) -> LookupResult<Value> {
    let mut value = serde_json::to_value(object)
        .with_context(|| format!("Failed to serialize {} object", descriptor.kind))?;
    if let Value::Object(ref mut map) = value {
        map.insert(
            "apiVersion".to_string(),
            Value::String(descriptor.api_version()),
        );
        map.insert("kind".to_string(), Value::String(descriptor.kind.clone()));
    }
    Ok(value)
}

#[async_trait]
impl ClusterApi for K8sClient {
    async fn get(
        &self,
        descriptor: &ResourceTypeDescriptor,
        namespace: &str,
        name: &str,
    ) -> LookupResult<Value> {
        trace!(kind = %descriptor.kind, namespace = %namespace, name = %name, "GET");

        let api = self.api(descriptor, namespace);
        match api.get_opt(name).await? {
            Some(object) => to_document(object, descriptor),
            None => Err(LookupError::not_found(&descriptor.kind, namespace, name)),
        }
    }

    async fn list(
        &self,
        descriptor: &ResourceTypeDescriptor,
        namespace: &str,
        selector: &str,
    ) -> LookupResult<Vec<Value>> {
        trace!(kind = %descriptor.kind, namespace = %namespace, selector = %selector, "LIST");

        let api = self.api(descriptor, namespace);
        let mut params = ListParams::default();
        if !selector.is_empty() {
            params = params.labels(selector);
        }

        self.list_all(&api, &params, &descriptor.kind)
            .await?
            .into_iter()
            .map(|object| to_document(object, descriptor))
            .collect()
    }
}

#[async_trait]
impl ApiDiscovery for K8sClient {
    async fn discover(&self, gvk: &GroupVersionKind) -> LookupResult<ResourceTypeDescriptor> {
        discovery::discover_kind(&self.client, gvk).await
    }
}
