//! In-memory cluster and registry used by the lookup tests

use async_trait::async_trait;
use kube::core::GroupVersionKind;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};

use super::engine::{ClusterApi, LiveRegistry, WatcherRef};
use super::error::{LookupError, LookupResult};
use super::resolver::ApiDiscovery;
use super::selector::{LabelSelector, parse_label_selector};
use crate::kubernetes::ResourceTypeDescriptor;
use crate::kubernetes::discovery::missing_type;

pub fn object(api_version: &str, kind: &str, namespace: &str, name: &str) -> Value {
    labelled(api_version, kind, namespace, name, &[])
}

pub fn labelled(
    api_version: &str,
    kind: &str,
    namespace: &str,
    name: &str,
    labels: &[(&str, &str)],
) -> Value {
    let labels: BTreeMap<&str, &str> = labels.iter().copied().collect();
    let mut metadata = json!({ "name": name, "labels": labels });
    if !namespace.is_empty() {
        metadata["namespace"] = json!(namespace);
    }
    json!({ "apiVersion": api_version, "kind": kind, "metadata": metadata })
}

/// Built-in kinds a stock cluster serves, taken from k8s-openapi
pub fn core_types() -> Vec<ResourceTypeDescriptor> {
    use k8s_openapi::api::{
        apps::v1::{DaemonSet, Deployment, StatefulSet},
        core::v1::{ConfigMap, Namespace, Node, Pod, Secret, Service},
        rbac::v1::{ClusterRole, Role},
    };
    use kube::Resource;

    let mut types = Vec::new();

    macro_rules! add_resource {
        ($type:ty, namespaced) => {
            add_resource!(@inner $type, true)
        };
        ($type:ty, cluster) => {
            add_resource!(@inner $type, false)
        };
        (@inner $type:ty, $namespaced:expr) => {
            types.push(ResourceTypeDescriptor::new(
                &<$type>::group(&()),
                &<$type>::version(&()),
                &<$type>::kind(&()),
                &<$type>::plural(&()),
                $namespaced,
            ))
        };
    }

    add_resource!(Pod, namespaced);
    add_resource!(Service, namespaced);
    add_resource!(ConfigMap, namespaced);
    add_resource!(Secret, namespaced);
    add_resource!(Namespace, cluster);
    add_resource!(Node, cluster);
    add_resource!(Deployment, namespaced);
    add_resource!(StatefulSet, namespaced);
    add_resource!(DaemonSet, namespaced);
    add_resource!(Role, namespaced);
    add_resource!(ClusterRole, cluster);

    types
}

fn find_type<'a>(
    types: &'a [ResourceTypeDescriptor],
    gvk: &GroupVersionKind,
) -> Option<&'a ResourceTypeDescriptor> {
    types
        .iter()
        .find(|d| d.group == gvk.group && d.version == gvk.version && d.kind == gvk.kind)
}

fn labels_of(object: &Value) -> BTreeMap<String, String> {
    object["metadata"]["labels"]
        .as_object()
        .map(|labels| {
            labels
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

fn in_scope(object: &Value, kind: &str, namespaced: bool, namespace: &str) -> bool {
    object["kind"] == kind
        && (!namespaced || namespace.is_empty() || object["metadata"]["namespace"] == namespace)
}

pub fn api_error(code: u16) -> LookupError {
    let (message, reason) = match code {
        404 => ("the server could not find the requested resource", "NotFound"),
        _ => ("etcdserver: request timed out", "InternalError"),
    };
    LookupError::Api(kube::Error::Api(kube::error::ErrorResponse {
        status: "Failure".to_string(),
        message: message.to_string(),
        reason: reason.to_string(),
        code,
    }))
}

/// Countdown of injected failures, each answered with `code`
#[derive(Default)]
struct Failures {
    remaining: AtomicUsize,
    code: AtomicU16,
}

impl Failures {
    fn arm(&self, count: usize, code: u16) {
        self.code.store(code, Ordering::SeqCst);
        self.remaining.store(count, Ordering::SeqCst);
    }

    fn take(&self) -> Option<LookupError> {
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .ok()
            .map(|_| api_error(self.code.load(Ordering::SeqCst)))
    }
}

/// Cluster API fake that counts every call
#[derive(Default)]
pub struct FakeCluster {
    objects: Mutex<Vec<Value>>,
    types: Mutex<Vec<ResourceTypeDescriptor>>,
    failures: Failures,
    /// Answer every REST call with a 404, as a server without the group would
    serves_nothing: bool,
    pub gets: AtomicUsize,
    pub lists: AtomicUsize,
    pub discoveries: AtomicUsize,
}

impl FakeCluster {
    /// A cluster serving the core kinds with these objects
    pub fn with_objects(objects: Vec<Value>) -> Self {
        Self {
            objects: Mutex::new(objects),
            types: Mutex::new(core_types()),
            ..Default::default()
        }
    }

    /// A cluster that serves no API groups at all
    pub fn serving_nothing() -> Self {
        Self {
            serves_nothing: true,
            ..Default::default()
        }
    }

    pub fn add(&self, object: Value) {
        self.objects.lock().unwrap().push(object);
    }

    pub fn add_type(&self, descriptor: ResourceTypeDescriptor) {
        self.types.lock().unwrap().push(descriptor);
    }

    /// Make the next `count` get/list calls fail with a server error
    pub fn fail_next(&self, count: usize) {
        self.failures.arm(count, 500);
    }

    /// Make the next `count` get/list calls fail with the given status code
    pub fn fail_next_with(&self, count: usize, code: u16) {
        self.failures.arm(count, code);
    }

    pub fn fetches(&self) -> usize {
        self.gets.load(Ordering::SeqCst) + self.lists.load(Ordering::SeqCst)
    }

    fn injected_failure(&self) -> Option<LookupError> {
        if self.serves_nothing {
            return Some(api_error(404));
        }
        self.failures.take()
    }
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn get(
        &self,
        descriptor: &ResourceTypeDescriptor,
        namespace: &str,
        name: &str,
    ) -> LookupResult<Value> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.injected_failure() {
            return Err(err);
        }

        self.objects
            .lock()
            .unwrap()
            .iter()
            .find(|o| {
                in_scope(o, &descriptor.kind, descriptor.namespaced, namespace)
                    && o["metadata"]["name"] == name
            })
            .cloned()
            .ok_or_else(|| LookupError::not_found(&descriptor.kind, namespace, name))
    }

    async fn list(
        &self,
        descriptor: &ResourceTypeDescriptor,
        namespace: &str,
        selector: &str,
    ) -> LookupResult<Vec<Value>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.injected_failure() {
            return Err(err);
        }

        let selector = parse_label_selector(selector)?;
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|o| in_scope(o, &descriptor.kind, descriptor.namespaced, namespace))
            .filter(|o| selector.matches(&labels_of(o)))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ApiDiscovery for FakeCluster {
    async fn discover(&self, gvk: &GroupVersionKind) -> LookupResult<ResourceTypeDescriptor> {
        self.discoveries.fetch_add(1, Ordering::SeqCst);
        find_type(&self.types.lock().unwrap(), gvk)
            .cloned()
            .ok_or_else(|| missing_type(gvk))
    }
}

/// Live registry fake; records which watchers read what
#[derive(Default)]
pub struct FakeRegistry {
    objects: Mutex<Vec<Value>>,
    failures: Failures,
    pub watchers: Mutex<Vec<WatcherRef>>,
    pub gets: AtomicUsize,
    pub lists: AtomicUsize,
}

impl FakeRegistry {
    pub fn with_objects(objects: Vec<Value>) -> Self {
        Self {
            objects: Mutex::new(objects),
            ..Default::default()
        }
    }

    /// Make the next `count` get/list calls fail with a server error
    pub fn fail_next(&self, count: usize) {
        self.failures.arm(count, 500);
    }
}

#[async_trait]
impl LiveRegistry for FakeRegistry {
    async fn resolve(&self, gvk: &GroupVersionKind) -> LookupResult<ResourceTypeDescriptor> {
        find_type(&core_types(), gvk)
            .cloned()
            .ok_or_else(|| missing_type(gvk))
    }

    async fn get(
        &self,
        watcher: &WatcherRef,
        gvk: &GroupVersionKind,
        namespace: &str,
        name: &str,
    ) -> LookupResult<Option<Value>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.watchers.lock().unwrap().push(watcher.clone());
        if let Some(err) = self.failures.take() {
            return Err(err);
        }
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .find(|o| in_scope(o, &gvk.kind, true, namespace) && o["metadata"]["name"] == name)
            .cloned())
    }

    async fn list(
        &self,
        watcher: &WatcherRef,
        gvk: &GroupVersionKind,
        namespace: &str,
        selector: &LabelSelector,
    ) -> LookupResult<Vec<Value>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.watchers.lock().unwrap().push(watcher.clone());
        if let Some(err) = self.failures.take() {
            return Err(err);
        }
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|o| in_scope(o, &gvk.kind, true, namespace))
            .filter(|o| selector.matches(&labels_of(o)))
            .cloned()
            .collect())
    }
}
