/// Kubernetes operations client
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use super::secret::RegistrySecret;
use crate::utils::command::{is_tool_installed, CommandBuilder};

/// Cluster operations the workflow needs
///
/// `kubeconfig` is the session kubeconfig selected during the run; `None`
/// leaves kubectl on its own defaults (KUBECONFIG from the environment or
/// ~/.kube/config).
#[async_trait]
pub trait ClusterCli: Send + Sync {
    /// Check if the CLI is installed
    async fn is_installed(&self) -> bool;

    /// Whether a cluster answers with the given kubeconfig
    async fn is_reachable(&self, kubeconfig: Option<&Path>) -> bool;

    /// Make `namespace` the default for the current context
    async fn set_namespace(&self, kubeconfig: Option<&Path>, namespace: &str) -> Result<()>;

    async fn secret_exists(
        &self,
        kubeconfig: Option<&Path>,
        namespace: &str,
        name: &str,
    ) -> Result<bool>;

    async fn delete_secret(
        &self,
        kubeconfig: Option<&Path>,
        namespace: &str,
        name: &str,
    ) -> Result<()>;

    async fn create_registry_secret(
        &self,
        kubeconfig: Option<&Path>,
        secret: &RegistrySecret,
    ) -> Result<()>;
}

/// Kubernetes client for kubectl operations
pub struct KubernetesClient;

/// `kubectl create secret` with the dockerconfigjson payload on stdin
fn create_secret_command(
    kubeconfig: Option<&Path>,
    secret: &RegistrySecret,
) -> Result<CommandBuilder> {
    Ok(CommandBuilder::new("kubectl")
        .args(secret.create_args())
        .stdin_input(secret.docker_config_json()?)
        .kubeconfig(kubeconfig)
        .context("Failed to create registry secret"))
}

#[async_trait]
impl ClusterCli for KubernetesClient {
    async fn is_installed(&self) -> bool {
        is_tool_installed("kubectl", &["version", "--client"]).await
    }

    async fn is_reachable(&self, kubeconfig: Option<&Path>) -> bool {
        CommandBuilder::new("kubectl")
            .args(["cluster-info", "--request-timeout=10s"])
            .kubeconfig(kubeconfig)
            .succeeds()
            .await
    }

    async fn set_namespace(&self, kubeconfig: Option<&Path>, namespace: &str) -> Result<()> {
        CommandBuilder::new("kubectl")
            .args(["config", "set-context", "--current"])
            .arg(format!("--namespace={}", namespace))
            .kubeconfig(kubeconfig)
            .context("Failed to set namespace context")
            .run_silent()
            .await
    }

    async fn secret_exists(
        &self,
        kubeconfig: Option<&Path>,
        namespace: &str,
        name: &str,
    ) -> Result<bool> {
        let stdout = CommandBuilder::new("kubectl")
            .args(["get", "secret", name, "--namespace", namespace])
            .args(["--ignore-not-found", "-o", "name"])
            .kubeconfig(kubeconfig)
            .context("Failed to look up secret")
            .run()
            .await?;

        Ok(!stdout.trim().is_empty())
    }

    async fn delete_secret(
        &self,
        kubeconfig: Option<&Path>,
        namespace: &str,
        name: &str,
    ) -> Result<()> {
        let output = CommandBuilder::new("kubectl")
            .args(["delete", "secret", name, "--namespace", namespace])
            .kubeconfig(kubeconfig)
            .context("Failed to delete secret")
            .output()
            .await?;

        if !output.success {
            // Don't fail if the secret is already gone
            if output.stderr.contains("NotFound") || output.stderr.contains("not found") {
                info!("Secret {} not found (already removed)", name);
                return Ok(());
            }
            anyhow::bail!("Failed to delete secret {}: {}", name, output.stderr.trim());
        }

        Ok(())
    }

    async fn create_registry_secret(
        &self,
        kubeconfig: Option<&Path>,
        secret: &RegistrySecret,
    ) -> Result<()> {
        create_secret_command(kubeconfig, secret)?
            .run_silent()
            .await
    }
}
