/// Configuration management for ecr-push
use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::PushError;

/// Username the registry expects alongside an issued login password
pub const REGISTRY_USERNAME: &str = "AWS";

/// Tag used when none is given on the command line
pub const DEFAULT_TAG: &str = "latest";

/// Lifetime of a registry login password, and so of the pull secret
pub const SECRET_VALIDITY_HOURS: i64 = 12;

/// Main run configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    /// Destination registry
    pub registry: RegistryConfig,

    /// Cluster namespace and pull secret
    pub cluster: ClusterSettings,

    /// Helper authentication tool
    pub helper: HelperConfig,
}

/// Destination registry coordinates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Cloud account that owns the registry
    pub account_id: String,

    /// Registry region (e.g., "us-east-1")
    pub region: String,

    /// Repository name inside the registry (e.g., "ts-tools/n8n")
    pub repository: String,
}

/// Cluster-side settings for the pull secret
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSettings {
    /// Namespace the pull secret is created in
    pub namespace: String,

    /// Name of the docker-registry secret
    pub secret_name: String,

    /// Directory for generated per-environment kubeconfigs (defaults to $HOME/.kube)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubeconfig_dir: Option<PathBuf>,
}

/// Helper authentication tool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HelperConfig {
    /// Binary location (defaults to $HOME/.local/bin/kube-auth)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Version downloaded when the binary is missing
    pub version: String,

    /// Download URL template; `{{version}}`, `{{os}}` and `{{arch}}` are substituted
    pub download_url: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            account_id: "795250896452".to_string(),
            region: "us-east-1".to_string(),
            repository: "ts-tools/n8n".to_string(),
        }
    }
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            namespace: "ts-tools".to_string(),
            secret_name: "ecr-registry-secret".to_string(),
            kubeconfig_dir: None,
        }
    }
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            path: None,
            version: "0.9.2".to_string(),
            download_url: "https://github.com/kube-auth/kube-auth/releases/download/v{{version}}/kube-auth_{{os}}_{{arch}}".to_string(),
        }
    }
}

/// Cluster environments the helper tool can configure access for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ClusterEnvironment {
    Staging,
    Production,
}

impl ClusterEnvironment {
    /// Menu order used when prompting the operator
    pub const ALL: [ClusterEnvironment; 2] =
        [ClusterEnvironment::Staging, ClusterEnvironment::Production];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterEnvironment::Staging => "staging",
            ClusterEnvironment::Production => "production",
        }
    }
}

impl fmt::Display for ClusterEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image to push and the tag it gets in the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushTarget {
    pub image: String,
    pub tag: String,
}

impl PushTarget {
    /// Build from positional arguments; the image is required, the tag defaults to `latest`
    pub fn new(image: Option<String>, tag: Option<String>) -> Result<Self, PushError> {
        let image = image
            .filter(|i| !i.trim().is_empty())
            .ok_or(PushError::MissingImage)?;
        let tag = tag
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TAG.to_string());
        Ok(Self { image, tag })
    }
}

impl PushConfig {
    /// Load configuration from a YAML file; an empty file yields the defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: PushConfig = if content.trim().is_empty() {
            PushConfig::default()
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), PushError> {
        let required = [
            ("registry.account_id", &self.registry.account_id),
            ("registry.region", &self.registry.region),
            ("registry.repository", &self.registry.repository),
            ("cluster.namespace", &self.cluster.namespace),
            ("cluster.secret_name", &self.cluster.secret_name),
            ("helper.version", &self.helper.version),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(PushError::InvalidConfig(format!("{} cannot be empty", name)));
            }
        }

        self.helper_download_url("linux", "amd64")
            .map_err(|e| PushError::InvalidConfig(format!("helper.download_url: {:#}", e)))?;

        Ok(())
    }

    /// Registry host the container engine logs in to
    pub fn registry_endpoint(&self) -> String {
        format!(
            "{}.dkr.ecr.{}.amazonaws.com",
            self.registry.account_id, self.registry.region
        )
    }

    /// Fully-qualified reference the image is pushed as
    pub fn destination_reference(&self, tag: &str) -> String {
        format!(
            "{}/{}:{}",
            self.registry_endpoint(),
            self.registry.repository,
            tag
        )
    }

    /// Directory holding per-environment kubeconfigs
    pub fn kubeconfig_dir(&self) -> Result<PathBuf> {
        match &self.cluster.kubeconfig_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(home_dir()?.join(".kube")),
        }
    }

    /// Kubeconfig generated for an environment
    pub fn kubeconfig_path(&self, environment: ClusterEnvironment) -> Result<PathBuf> {
        Ok(self
            .kubeconfig_dir()?
            .join(format!("config-{}", environment.as_str())))
    }

    /// Where the helper binary lives
    pub fn helper_path(&self) -> Result<PathBuf> {
        match &self.helper.path {
            Some(path) => Ok(path.clone()),
            None => Ok(home_dir()?.join(".local").join("bin").join("kube-auth")),
        }
    }

    /// Render the helper download URL for a platform
    pub fn helper_download_url(&self, os: &str, arch: &str) -> Result<String> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);

        let rendered = handlebars
            .render_template(
                &self.helper.download_url,
                &serde_json::json!({
                    "version": self.helper.version,
                    "os": os,
                    "arch": arch,
                }),
            )
            .context("Failed to render download URL template")?;

        url::Url::parse(&rendered)
            .with_context(|| format!("Not a valid URL: {}", rendered))?;

        Ok(rendered)
    }
}

fn home_dir() -> Result<PathBuf> {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("HOME is not set"))
}
