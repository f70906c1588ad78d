/// Helper authentication tool client
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::installer::download_binary;
use super::platform::host_platform;
use crate::config::{ClusterEnvironment, PushConfig};
use crate::utils::command::CommandBuilder;

/// Operations of the tool that exchanges an identity-provider session for cluster access
#[async_trait]
pub trait AuthHelper: Send + Sync {
    /// Whether the binary is present at its fixed location
    async fn is_installed(&self) -> bool;

    /// Where the binary would be downloaded from on this host
    fn download_url(&self) -> Result<String>;

    /// Download and install the fixed version for this host
    async fn install(&self) -> Result<()>;

    /// `kube setup <env>`: kubeconfig contents for the environment
    async fn setup(&self, environment: ClusterEnvironment) -> Result<String>;

    /// `kube login`: interactive login using the kubeconfig at `kubeconfig`
    async fn login(&self, kubeconfig: &Path) -> Result<()>;
}

/// The kube-auth binary. Without a resolvable location the helper is treated
/// as unavailable rather than failing the run.
pub struct KubeAuthHelper {
    path: Option<PathBuf>,
    config: PushConfig,
}

impl KubeAuthHelper {
    pub fn new(config: &PushConfig) -> Self {
        let path = match config.helper_path() {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("⚠ Helper tool location unavailable: {:#}", e);
                None
            }
        };
        Self::at(config, path)
    }

    pub(crate) fn at(config: &PushConfig, path: Option<PathBuf>) -> Self {
        Self {
            path,
            config: config.clone(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn location(&self) -> Result<&Path> {
        self.path()
            .ok_or_else(|| anyhow::anyhow!("Helper tool location is unknown (HOME is not set)"))
    }
}

#[async_trait]
impl AuthHelper for KubeAuthHelper {
    async fn is_installed(&self) -> bool {
        let Some(path) = self.path() else {
            return false;
        };
        tokio::fs::metadata(path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    fn download_url(&self) -> Result<String> {
        let (os, arch) = host_platform();
        self.config.helper_download_url(&os, &arch)
    }

    async fn install(&self) -> Result<()> {
        let path = self.location()?;
        let url = self.download_url()?;
        download_binary(&url, path)
            .await
            .with_context(|| format!("Failed to install helper at {}", path.display()))
    }

    async fn setup(&self, environment: ClusterEnvironment) -> Result<String> {
        let stdout = CommandBuilder::new(self.location()?)
            .args(["kube", "setup", environment.as_str()])
            .context("Failed to run helper setup")
            .run()
            .await?;

        if stdout.trim().is_empty() {
            anyhow::bail!("Helper setup produced no configuration for {}", environment);
        }
        Ok(stdout)
    }

    async fn login(&self, kubeconfig: &Path) -> Result<()> {
        let output = CommandBuilder::new(self.location()?)
            .args(["kube", "login"])
            .kubeconfig(Some(kubeconfig))
            .interactive()
            .context("Failed to run helper login")
            .output()
            .await?;

        if !output.success {
            anyhow::bail!("Helper login failed: {}", output.stderr);
        }
        Ok(())
    }
}
