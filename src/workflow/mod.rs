//! Image push and pull secret provisioning workflow
//!
//! Runs every step in order, stopping at the first fatal failure. Optional
//! capabilities (helper tool, cluster access) degrade the run instead of
//! ending it; without cluster access the pull secret step is skipped.

mod cluster_access;
#[cfg(test)]
mod fakes;
pub mod state;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::aws::{CallerIdentity, CloudCli};
use crate::config::{PushConfig, PushTarget, REGISTRY_USERNAME, SECRET_VALIDITY_HOURS};
use crate::docker::ContainerEngine;
use crate::error::PushError;
use crate::helper::AuthHelper;
use crate::k8s::{ClusterCli, RegistrySecret};
use crate::prompt::Prompter;
use state::{RunState, Stage, ToolAvailability};

/// External tools the workflow drives
pub struct Toolchain<'a> {
    pub engine: &'a dyn ContainerEngine,
    pub cloud: &'a dyn CloudCli,
    pub cluster: &'a dyn ClusterCli,
    pub helper: &'a dyn AuthHelper,
    pub prompter: &'a dyn Prompter,
}

/// What happened to the pull secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretOutcome {
    Provisioned {
        name: String,
        namespace: String,
        expires_at: DateTime<Utc>,
    },
    /// No cluster access; `manual_command` finishes the job by hand
    Skipped { manual_command: String },
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub destination: String,
    pub secret: SecretOutcome,
    pub tools: ToolAvailability,
}

impl RunReport {
    /// Final summary for the operator
    pub fn log_summary(&self) {
        debug!(
            "Tools available: docker={} aws={} kubectl={} helper={}",
            self.tools.container_engine,
            self.tools.cloud_cli,
            self.tools.cluster_cli,
            self.tools.helper
        );
        info!("");
        info!("✓ Image pushed: {}", self.destination);
        match &self.secret {
            SecretOutcome::Provisioned {
                name,
                namespace,
                expires_at,
            } => {
                info!("✓ Pull secret {} provisioned in namespace {}", name, namespace);
                info!(
                    "  The secret is valid for {} hours (until {}); re-run to refresh it",
                    SECRET_VALIDITY_HOURS,
                    expires_at.format("%Y-%m-%d %H:%M:%S UTC")
                );
            }
            SecretOutcome::Skipped { manual_command } => {
                warn!("⚠ Run incomplete: the pull secret was not provisioned");
                warn!("  Once cluster access works, create it with:");
                warn!("    {}", manual_command);
            }
        }
    }
}

/// Sequential provisioning workflow
pub struct Workflow<'a> {
    config: &'a PushConfig,
    tools: Toolchain<'a>,
}

impl<'a> Workflow<'a> {
    pub fn new(config: &'a PushConfig, tools: Toolchain<'a>) -> Self {
        Self { config, tools }
    }

    /// Run every step for `target`
    pub async fn run(&self, target: &PushTarget) -> Result<RunReport> {
        let mut state = RunState::new();

        self.check_dependencies(&mut state).await?;
        self.bootstrap_helper(&mut state).await?;
        self.ensure_cluster_access(&mut state).await?;
        self.verify_credentials(&mut state).await?;
        self.authenticate_registry(&mut state).await?;
        self.ensure_repository(&mut state).await?;
        self.ensure_image(&mut state, &target.image).await?;
        let destination = self.tag_and_push(&mut state, target).await?;
        let secret = self.provision_secret(&mut state).await?;
        state.advance(Stage::Done);
        debug!("Run finished at stage {:?}", state.stage());

        Ok(RunReport {
            destination,
            secret,
            tools: state.tools,
        })
    }

    /// Container engine (and daemon), cloud CLI and cluster CLI must all be present
    async fn check_dependencies(&self, state: &mut RunState) -> Result<()> {
        info!("Checking dependencies...");

        if !self.tools.engine.is_installed().await {
            return Err(PushError::MissingDependency {
                tool: "docker",
                install_url: "https://docs.docker.com/get-docker/",
            }
            .into());
        }
        if !self.tools.engine.daemon_reachable().await {
            return Err(PushError::DaemonUnreachable { tool: "docker" }.into());
        }
        state.tools.container_engine = true;

        if !self.tools.cloud.is_installed().await {
            return Err(PushError::MissingDependency {
                tool: "aws",
                install_url: "https://aws.amazon.com/cli/",
            }
            .into());
        }
        state.tools.cloud_cli = true;

        if !self.tools.cluster.is_installed().await {
            return Err(PushError::MissingDependency {
                tool: "kubectl",
                install_url: "https://kubernetes.io/docs/tasks/tools/",
            }
            .into());
        }
        state.tools.cluster_cli = true;

        info!("✓ docker, aws and kubectl are available");
        state.advance(Stage::DependenciesChecked);
        Ok(())
    }

    /// Offer to download the helper tool when it is missing; never fatal
    /// except for prompt failures
    async fn bootstrap_helper(&self, state: &mut RunState) -> Result<()> {
        if self.tools.helper.is_installed().await {
            info!("✓ Helper tool is installed");
            state.tools.helper = true;
            state.advance(Stage::HelperReady);
            return Ok(());
        }

        warn!("⚠ Helper tool is not installed");

        let url = match self.tools.helper.download_url() {
            Ok(url) => url,
            Err(e) => {
                warn!("⚠ Cannot determine helper download URL: {:#}", e);
                state.advance(Stage::HelperAbsent);
                return Ok(());
            }
        };

        let download = self
            .tools
            .prompter
            .confirm(&format!("Download the helper tool from {}?", url), true)
            .await?;

        if download {
            match self.tools.helper.install().await {
                Ok(()) => {
                    info!("✓ Helper tool installed");
                    state.tools.helper = true;
                    state.advance(Stage::HelperReady);
                    return Ok(());
                }
                Err(e) => warn!("⚠ Helper download failed: {:#}", e),
            }
        }

        warn!("⚠ Continuing without the helper tool");
        state.advance(Stage::HelperAbsent);
        Ok(())
    }

    /// Valid cloud credentials, configured interactively when needed
    async fn verify_credentials(&self, state: &mut RunState) -> Result<()> {
        info!("Checking cloud credentials...");

        let reconfigure = match self.tools.cloud.caller_identity().await {
            Ok(identity) => {
                self.log_identity(&identity);
                self.tools
                    .prompter
                    .confirm("Reconfigure cloud credentials?", false)
                    .await?
            }
            Err(e) => {
                warn!("⚠ Cloud credentials are not valid: {:#}", e);
                true
            }
        };

        if reconfigure {
            if let Err(e) = self.tools.cloud.configure().await {
                warn!("⚠ {:#}", e);
            }
            let identity = self.tools.cloud.caller_identity().await.map_err(|e| {
                warn!("⚠ {:#}", e);
                PushError::InvalidCredentials
            })?;
            self.log_identity(&identity);
        }

        state.advance(Stage::CredentialsVerified);
        Ok(())
    }

    fn log_identity(&self, identity: &CallerIdentity) {
        info!("✓ Cloud credentials valid: {}", identity.arn);
        if identity.account != self.config.registry.account_id {
            warn!(
                "⚠ Credentials belong to account {}, registry is in account {}",
                identity.account, self.config.registry.account_id
            );
        }
    }

    async fn authenticate_registry(&self, state: &mut RunState) -> Result<()> {
        let endpoint = self.config.registry_endpoint();
        info!("Logging in to {}...", endpoint);

        let password = self
            .tools
            .cloud
            .registry_password(&self.config.registry.region)
            .await?;
        self.tools
            .engine
            .login(&endpoint, REGISTRY_USERNAME, &password)
            .await
            .context("Registry login failed")?;

        info!("✓ Logged in to {}", endpoint);
        state.advance(Stage::RegistryAuthenticated);
        Ok(())
    }

    /// Create the repository only when it does not exist yet
    async fn ensure_repository(&self, state: &mut RunState) -> Result<()> {
        let registry = &self.config.registry;

        if self
            .tools
            .cloud
            .repository_exists(&registry.repository, &registry.region)
            .await?
        {
            info!("✓ Repository {} already exists", registry.repository);
        } else {
            info!("Creating repository {}...", registry.repository);
            self.tools
                .cloud
                .create_repository(&registry.repository, &registry.region)
                .await?;
            info!("✓ Repository {} created", registry.repository);
        }

        state.advance(Stage::RepositoryReady);
        Ok(())
    }

    async fn ensure_image(&self, state: &mut RunState, image: &str) -> Result<()> {
        if self.tools.engine.image_exists(image).await {
            info!("✓ Image {} found locally", image);
        } else {
            warn!("⚠ Image {} not found locally, pulling", image);
            self.tools.engine.pull(image).await?;
            info!("✓ Image {} pulled", image);
        }

        state.advance(Stage::ImageReady);
        Ok(())
    }

    async fn tag_and_push(&self, state: &mut RunState, target: &PushTarget) -> Result<String> {
        let destination = self.config.destination_reference(&target.tag);

        info!("Tagging {} as {}", target.image, destination);
        self.tools.engine.tag(&target.image, &destination).await?;
        state.advance(Stage::ImageTagged);

        info!("Pushing {}...", destination);
        self.tools.engine.push(&destination).await?;
        info!("✓ Pushed {}", destination);
        state.advance(Stage::ImagePushed);

        Ok(destination)
    }

    fn registry_secret(&self, password: String) -> RegistrySecret {
        RegistrySecret {
            name: self.config.cluster.secret_name.clone(),
            namespace: self.config.cluster.namespace.clone(),
            server: self.config.registry_endpoint(),
            username: REGISTRY_USERNAME.to_string(),
            password,
        }
    }

    /// Re-create the pull secret from a fresh registry password
    async fn provision_secret(&self, state: &mut RunState) -> Result<SecretOutcome> {
        if !state.cluster_ready {
            warn!("⚠ Skipping pull secret: no cluster access");
            state.advance(Stage::SecretSkipped);
            return Ok(SecretOutcome::Skipped {
                manual_command: self
                    .registry_secret(String::new())
                    .manual_command(&self.config.registry.region),
            });
        }

        let password = self
            .tools
            .cloud
            .registry_password(&self.config.registry.region)
            .await?;
        let secret = self.registry_secret(password);
        let kubeconfig = state.kubeconfig.as_deref();

        info!(
            "Provisioning pull secret {} in namespace {}...",
            secret.name, secret.namespace
        );

        match self
            .tools
            .cluster
            .secret_exists(kubeconfig, &secret.namespace, &secret.name)
            .await
        {
            Ok(true) => {
                match self
                    .tools
                    .cluster
                    .delete_secret(kubeconfig, &secret.namespace, &secret.name)
                    .await
                {
                    Ok(()) => info!("Deleted existing secret {}", secret.name),
                    Err(e) => warn!("⚠ Could not delete existing secret: {:#}", e),
                }
            }
            Ok(false) => {}
            Err(e) => warn!("⚠ Could not check for an existing secret: {:#}", e),
        }

        self.tools
            .cluster
            .create_registry_secret(kubeconfig, &secret)
            .await?;

        let expires_at = Utc::now() + Duration::hours(SECRET_VALIDITY_HOURS);
        info!("✓ Secret {} created", secret.name);
        state.advance(Stage::SecretProvisioned);

        Ok(SecretOutcome::Provisioned {
            name: secret.name,
            namespace: secret.namespace,
            expires_at,
        })
    }
}
