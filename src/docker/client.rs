/// Container engine client
use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::utils::command::{is_tool_installed, CommandBuilder};

/// Image operations against the local container engine
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    async fn is_installed(&self) -> bool;

    /// Whether the engine daemon answers
    async fn daemon_reachable(&self) -> bool;

    /// Whether `reference` is present in local image storage
    async fn image_exists(&self, reference: &str) -> bool;

    async fn pull(&self, reference: &str) -> Result<()>;

    async fn tag(&self, source: &str, destination: &str) -> Result<()>;

    async fn push(&self, reference: &str) -> Result<()>;

    /// Authenticate against `registry`; the password goes over stdin
    async fn login(&self, registry: &str, username: &str, password: &str) -> Result<()>;
}

/// Container engine driven through the docker CLI
pub struct DockerClient {
    program: String,
}

impl DockerClient {
    pub fn new() -> Self {
        Self::with_program("docker")
    }

    /// Drive a docker-compatible CLI other than `docker` (e.g. podman)
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for DockerClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContainerEngine for DockerClient {
    async fn is_installed(&self) -> bool {
        is_tool_installed(&self.program, &["--version"]).await
    }

    async fn daemon_reachable(&self) -> bool {
        CommandBuilder::new(&self.program)
            .arg("info")
            .succeeds()
            .await
    }

    async fn image_exists(&self, reference: &str) -> bool {
        CommandBuilder::new(&self.program)
            .args(["image", "inspect", reference])
            .succeeds()
            .await
    }

    async fn pull(&self, reference: &str) -> Result<()> {
        info!("Pulling image {}...", reference);

        let output = CommandBuilder::new(&self.program)
            .args(["pull", reference])
            .interactive()
            .context("Failed to execute docker pull")
            .output()
            .await?;

        if !output.success {
            anyhow::bail!("Failed to pull {}: {}", reference, output.stderr);
        }
        Ok(())
    }

    async fn tag(&self, source: &str, destination: &str) -> Result<()> {
        CommandBuilder::new(&self.program)
            .args(["tag", source, destination])
            .context("Failed to execute docker tag")
            .run_silent()
            .await
    }

    async fn push(&self, reference: &str) -> Result<()> {
        let output = CommandBuilder::new(&self.program)
            .args(["push", reference])
            .interactive()
            .context("Failed to execute docker push")
            .output()
            .await?;

        if !output.success {
            anyhow::bail!("Failed to push {}: {}", reference, output.stderr);
        }
        Ok(())
    }

    async fn login(&self, registry: &str, username: &str, password: &str) -> Result<()> {
        CommandBuilder::new(&self.program)
            .args(["login", "--username", username, "--password-stdin", registry])
            .stdin_input(password)
            .context("Failed to execute docker login")
            .run_silent()
            .await
    }
}
