//! Read-only lookups of cluster objects from templates

pub mod allowlist;
mod cache;
mod engine;
mod error;
mod facade;
mod namespace;
mod request;
mod resolver;
mod result;
pub mod selector;

#[cfg(test)]
mod testing;

pub use allowlist::{ClusterScopedObject, is_allowed};
pub use cache::{EphemeralCache, ObjectIdentity};
pub use engine::{
    AccessPolicy, ClusterApi, FetchStrategy, FetchTarget, LiveRegistry, LookupOutput, WatcherRef,
};
pub use error::{LookupError, LookupResult};
pub use facade::{EvaluationContext, LookupEngine, ResolveOptions};
pub use namespace::resolve_namespace;
pub use request::{LookupRequest, parse_api_version};
pub use resolver::{ApiDiscovery, DescriptorCache, ResourceTypeResolver};
pub use result::{SENSITIVE_KIND, TemplateResult};
pub use selector::{LabelSelector, parse_label_selector};
