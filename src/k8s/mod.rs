/// Kubernetes cluster operations
pub mod client;
pub mod secret;

pub use client::{ClusterCli, KubernetesClient};
pub use secret::RegistrySecret;
