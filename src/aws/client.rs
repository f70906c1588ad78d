/// Cloud CLI client for identity and registry operations
use anyhow::{Context, Result};
use async_trait::async_trait;

use super::models::{CallerIdentity, REPOSITORY_NOT_FOUND};
use crate::utils::command::{is_tool_installed, CommandBuilder};

/// Cloud operations the workflow needs
#[async_trait]
pub trait CloudCli: Send + Sync {
    async fn is_installed(&self) -> bool;

    /// Identity behind the current credentials; errors when they are invalid
    async fn caller_identity(&self) -> Result<CallerIdentity>;

    /// Run the interactive credential configuration flow
    async fn configure(&self) -> Result<()>;

    /// Short-lived registry login password
    async fn registry_password(&self, region: &str) -> Result<String>;

    async fn repository_exists(&self, repository: &str, region: &str) -> Result<bool>;

    async fn create_repository(&self, repository: &str, region: &str) -> Result<()>;
}

/// Cloud CLI driven through the aws binary
pub struct AwsCli;

#[async_trait]
impl CloudCli for AwsCli {
    async fn is_installed(&self) -> bool {
        is_tool_installed("aws", &["--version"]).await
    }

    async fn caller_identity(&self) -> Result<CallerIdentity> {
        let stdout = CommandBuilder::new("aws")
            .args(["sts", "get-caller-identity", "--output", "json"])
            .context("Failed to check cloud identity")
            .run()
            .await?;

        serde_json::from_str(&stdout).context("Failed to parse caller identity")
    }

    async fn configure(&self) -> Result<()> {
        let output = CommandBuilder::new("aws")
            .arg("configure")
            .interactive()
            .context("Failed to run aws configure")
            .output()
            .await?;

        if !output.success {
            anyhow::bail!("Credential configuration failed: {}", output.stderr);
        }
        Ok(())
    }

    async fn registry_password(&self, region: &str) -> Result<String> {
        let stdout = CommandBuilder::new("aws")
            .args(["ecr", "get-login-password", "--region", region])
            .context("Failed to fetch registry password")
            .run()
            .await?;

        let password = stdout.trim().to_string();
        if password.is_empty() {
            anyhow::bail!("Registry returned an empty login password");
        }
        Ok(password)
    }

    async fn repository_exists(&self, repository: &str, region: &str) -> Result<bool> {
        let output = CommandBuilder::new("aws")
            .args(["ecr", "describe-repositories", "--repository-names", repository])
            .args(["--region", region, "--output", "json"])
            .context("Failed to describe repository")
            .output()
            .await?;

        if output.success {
            return Ok(true);
        }
        if output.stderr.contains(REPOSITORY_NOT_FOUND) {
            return Ok(false);
        }
        anyhow::bail!(
            "Failed to describe repository {}: {}",
            repository,
            output.stderr.trim()
        )
    }

    async fn create_repository(&self, repository: &str, region: &str) -> Result<()> {
        CommandBuilder::new("aws")
            .args(["ecr", "create-repository", "--repository-name", repository])
            .args(["--region", region, "--output", "json"])
            .context("Failed to create repository")
            .run_silent()
            .await
    }
}
