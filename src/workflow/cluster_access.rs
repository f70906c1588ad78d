/// Cluster access verification and helper-driven kubeconfig setup
use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::state::{RunState, Stage};
use super::Workflow;
use crate::config::ClusterEnvironment;
use crate::error::PushError;

/// Contents a kubeconfig file had before it was overwritten
pub(crate) struct KubeconfigBackup {
    path: PathBuf,
    previous: Option<Vec<u8>>,
}

impl KubeconfigBackup {
    pub(crate) async fn capture(path: &Path) -> Result<Self> {
        let previous = match tokio::fs::read(path).await {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            previous,
        })
    }

    /// Put the file back the way it was, removing it if it did not exist
    pub(crate) async fn restore(&self) -> Result<()> {
        match &self.previous {
            Some(bytes) => tokio::fs::write(&self.path, bytes)
                .await
                .with_context(|| format!("Failed to restore {}", self.path.display())),
            None => match tokio::fs::remove_file(&self.path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e)
                    .with_context(|| format!("Failed to remove {}", self.path.display())),
            },
        }
    }
}

impl Workflow<'_> {
    /// Make sure the cluster CLI reaches a cluster, or get the operator's
    /// consent to carry on without one
    pub(super) async fn ensure_cluster_access(&self, state: &mut RunState) -> Result<()> {
        info!("Checking cluster access...");

        if self
            .tools
            .cluster
            .is_reachable(state.kubeconfig.as_deref())
            .await
        {
            info!("✓ Cluster is reachable");
            state.cluster_ready = true;
            state.advance(Stage::ClusterReady);
            return Ok(());
        }

        warn!("⚠ No cluster is reachable with the current kubeconfig");

        if state.tools.helper {
            match self.configure_cluster_access(state).await {
                Ok(environment) => {
                    info!("✓ Cluster access configured for {}", environment);
                    state.cluster_ready = true;
                    state.advance(Stage::ClusterReady);
                    return Ok(());
                }
                Err(e) => warn!("⚠ Cluster configuration failed: {:#}", e),
            }
        } else {
            warn!("⚠ Helper tool unavailable, cannot configure cluster access");
        }

        let proceed = self
            .tools
            .prompter
            .confirm(
                "Continue without cluster configuration? The pull secret will not be created.",
                false,
            )
            .await?;
        if !proceed {
            return Err(PushError::ClusterAccessDeclined.into());
        }

        warn!("⚠ Continuing without cluster access");
        state.advance(Stage::ClusterSkipped);
        Ok(())
    }

    /// Generate a kubeconfig for the chosen environment and log in with it.
    /// On failure the previous kubeconfig reference and file contents are restored.
    async fn configure_cluster_access(&self, state: &mut RunState) -> Result<ClusterEnvironment> {
        let environment = self.tools.prompter.select_environment().await?;
        let path = self.config.kubeconfig_path(environment)?;

        let backup = KubeconfigBackup::capture(&path).await?;
        let previous = state.kubeconfig.clone();

        match self.switch_kubeconfig(state, environment, &path).await {
            Ok(()) => Ok(environment),
            Err(e) => {
                state.kubeconfig = previous;
                if let Err(restore_err) = backup.restore().await {
                    warn!("⚠ {:#}", restore_err);
                } else {
                    info!("Restored previous kubeconfig state");
                }
                Err(e)
            }
        }
    }

    async fn switch_kubeconfig(
        &self,
        state: &mut RunState,
        environment: ClusterEnvironment,
        path: &Path,
    ) -> Result<()> {
        info!("Generating kubeconfig for {}...", environment);
        let kubeconfig = self.tools.helper.setup(environment).await?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(path, kubeconfig)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        state.kubeconfig = Some(path.to_path_buf());
        info!("Kubeconfig written to {}", path.display());

        self.tools.helper.login(path).await?;
        self.tools
            .cluster
            .set_namespace(Some(path), &self.config.cluster.namespace)
            .await?;

        if !self.tools.cluster.is_reachable(Some(path)).await {
            anyhow::bail!("Cluster is still unreachable with {}", path.display());
        }
        Ok(())
    }
}
