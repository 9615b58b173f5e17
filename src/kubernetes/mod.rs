mod client;
pub mod discovery;

pub use client::K8sClient;
pub use discovery::ResourceTypeDescriptor;
