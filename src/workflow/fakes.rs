/// Recording fakes for the external tool traits
use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

use super::Toolchain;
use crate::aws::{CallerIdentity, CloudCli};
use crate::config::ClusterEnvironment;
use crate::docker::ContainerEngine;
use crate::helper::AuthHelper;
use crate::k8s::{ClusterCli, RegistrySecret};
use crate::prompt::Prompter;

/// Behaviour of the simulated tools; the default is a healthy environment
#[derive(Debug, Clone)]
pub struct FakeWorld {
    pub engine_installed: bool,
    pub daemon_up: bool,
    pub aws_installed: bool,
    pub kubectl_installed: bool,
    pub helper_installed: bool,
    pub install_fails: bool,
    /// Reachability with kubectl's default kubeconfig
    pub cluster_reachable: bool,
    /// Reachability with a generated kubeconfig after helper login
    pub reachable_after_login: bool,
    pub login_fails: bool,
    pub identity_valid: bool,
    pub identity_valid_after_configure: bool,
    pub registry_login_fails: bool,
    pub repository_exists: bool,
    /// describe-repositories fails with something other than RepositoryNotFound
    pub describe_fails: bool,
    pub image_local: bool,
    pub pull_fails: bool,
    pub push_fails: bool,
    pub secret_exists: bool,
    pub delete_secret_fails: bool,
    pub create_secret_fails: bool,
    /// Replies to yes/no prompts in order; once exhausted each prompt gets its default
    pub answers: Vec<bool>,
    pub environment: Option<ClusterEnvironment>,
}

impl Default for FakeWorld {
    fn default() -> Self {
        Self {
            engine_installed: true,
            daemon_up: true,
            aws_installed: true,
            kubectl_installed: true,
            helper_installed: true,
            install_fails: false,
            cluster_reachable: true,
            reachable_after_login: true,
            login_fails: false,
            identity_valid: true,
            identity_valid_after_configure: true,
            registry_login_fails: false,
            repository_exists: false,
            describe_fails: false,
            image_local: true,
            pull_fails: false,
            push_fails: false,
            secret_exists: false,
            delete_secret_fails: false,
            create_secret_fails: false,
            answers: Vec::new(),
            environment: None,
        }
    }
}

#[derive(Debug, Default)]
struct Session {
    configured: bool,
    logged_in: bool,
}

/// Implements every tool trait over one `FakeWorld`, recording calls that
/// change something
pub struct FakeTools {
    world: FakeWorld,
    answers: Mutex<VecDeque<bool>>,
    session: Mutex<Session>,
    events: Mutex<Vec<String>>,
}

const MUTATIONS: [&str; 7] = [
    "docker login",
    "docker pull",
    "docker tag",
    "docker push",
    "aws create-repository",
    "kubectl delete",
    "kubectl create",
];

impl FakeTools {
    pub fn new(world: FakeWorld) -> Self {
        Self {
            answers: Mutex::new(world.answers.iter().copied().collect()),
            world,
            session: Mutex::new(Session::default()),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn toolchain(&self) -> Toolchain<'_> {
        Toolchain {
            engine: self,
            cloud: self,
            cluster: self,
            helper: self,
            prompter: self,
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Recorded calls that touch the registry, local images or the cluster
    pub fn mutations(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| MUTATIONS.iter().any(|m| e.starts_with(m)))
            .collect()
    }

    fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }
}

#[async_trait]
impl ContainerEngine for FakeTools {
    async fn is_installed(&self) -> bool {
        self.world.engine_installed
    }

    async fn daemon_reachable(&self) -> bool {
        self.world.daemon_up
    }

    async fn image_exists(&self, _reference: &str) -> bool {
        self.world.image_local
    }

    async fn pull(&self, reference: &str) -> Result<()> {
        self.record(format!("docker pull {}", reference));
        if self.world.pull_fails {
            anyhow::bail!("pull access denied for {}", reference);
        }
        Ok(())
    }

    async fn tag(&self, source: &str, destination: &str) -> Result<()> {
        self.record(format!("docker tag {} {}", source, destination));
        Ok(())
    }

    async fn push(&self, reference: &str) -> Result<()> {
        self.record(format!("docker push {}", reference));
        if self.world.push_fails {
            anyhow::bail!("denied: not authorized to push to {}", reference);
        }
        Ok(())
    }

    async fn login(&self, registry: &str, username: &str, _password: &str) -> Result<()> {
        self.record(format!("docker login {} {}", registry, username));
        if self.world.registry_login_fails {
            anyhow::bail!("Error response from daemon: login attempt to {} failed", registry);
        }
        Ok(())
    }
}

#[async_trait]
impl CloudCli for FakeTools {
    async fn is_installed(&self) -> bool {
        self.world.aws_installed
    }

    async fn caller_identity(&self) -> Result<CallerIdentity> {
        let valid = if self.session.lock().unwrap().configured {
            self.world.identity_valid_after_configure
        } else {
            self.world.identity_valid
        };
        if !valid {
            anyhow::bail!("Unable to locate credentials");
        }
        Ok(CallerIdentity {
            user_id: "AIDAEXAMPLE".to_string(),
            account: "795250896452".to_string(),
            arn: "arn:aws:iam::795250896452:user/deployer".to_string(),
        })
    }

    async fn configure(&self) -> Result<()> {
        self.record("aws configure");
        self.session.lock().unwrap().configured = true;
        Ok(())
    }

    async fn registry_password(&self, _region: &str) -> Result<String> {
        Ok("registry-password".to_string())
    }

    async fn repository_exists(&self, repository: &str, _region: &str) -> Result<bool> {
        if self.world.describe_fails {
            anyhow::bail!("AccessDeniedException: not authorized to describe {}", repository);
        }
        Ok(self.world.repository_exists)
    }

    async fn create_repository(&self, repository: &str, _region: &str) -> Result<()> {
        self.record(format!("aws create-repository {}", repository));
        Ok(())
    }
}

fn kubeconfig_label(kubeconfig: Option<&Path>) -> String {
    match kubeconfig {
        Some(path) => path.display().to_string(),
        None => "default".to_string(),
    }
}

#[async_trait]
impl ClusterCli for FakeTools {
    async fn is_installed(&self) -> bool {
        self.world.kubectl_installed
    }

    async fn is_reachable(&self, kubeconfig: Option<&Path>) -> bool {
        match kubeconfig {
            None => self.world.cluster_reachable,
            Some(_) => self.session.lock().unwrap().logged_in && self.world.reachable_after_login,
        }
    }

    async fn set_namespace(&self, _kubeconfig: Option<&Path>, namespace: &str) -> Result<()> {
        self.record(format!("kubectl set-namespace {}", namespace));
        Ok(())
    }

    async fn secret_exists(
        &self,
        _kubeconfig: Option<&Path>,
        _namespace: &str,
        _name: &str,
    ) -> Result<bool> {
        Ok(self.world.secret_exists)
    }

    async fn delete_secret(
        &self,
        _kubeconfig: Option<&Path>,
        _namespace: &str,
        name: &str,
    ) -> Result<()> {
        self.record(format!("kubectl delete secret {}", name));
        if self.world.delete_secret_fails {
            anyhow::bail!("forbidden: cannot delete secret {}", name);
        }
        Ok(())
    }

    async fn create_registry_secret(
        &self,
        kubeconfig: Option<&Path>,
        secret: &RegistrySecret,
    ) -> Result<()> {
        self.record(format!(
            "kubectl create secret {} kubeconfig={}",
            secret.name,
            kubeconfig_label(kubeconfig)
        ));
        if self.world.create_secret_fails {
            anyhow::bail!("admission webhook denied secret {}", secret.name);
        }
        Ok(())
    }
}

#[async_trait]
impl AuthHelper for FakeTools {
    async fn is_installed(&self) -> bool {
        self.world.helper_installed
    }

    fn download_url(&self) -> Result<String> {
        Ok("https://example.com/kube-auth_linux_amd64".to_string())
    }

    async fn install(&self) -> Result<()> {
        self.record("helper install");
        if self.world.install_fails {
            anyhow::bail!("Download failed with status 404 Not Found");
        }
        Ok(())
    }

    async fn setup(&self, environment: ClusterEnvironment) -> Result<String> {
        self.record(format!("helper setup {}", environment));
        Ok(format!("kubeconfig for {}", environment))
    }

    async fn login(&self, _kubeconfig: &Path) -> Result<()> {
        self.record("helper login");
        if self.world.login_fails {
            anyhow::bail!("Helper login failed: identity provider rejected the session");
        }
        self.session.lock().unwrap().logged_in = true;
        Ok(())
    }
}

#[async_trait]
impl Prompter for FakeTools {
    async fn confirm(&self, _question: &str, default: bool) -> Result<bool> {
        Ok(self.answers.lock().unwrap().pop_front().unwrap_or(default))
    }

    async fn select_environment(&self) -> Result<ClusterEnvironment> {
        self.world
            .environment
            .ok_or_else(|| anyhow::anyhow!("No cluster environment selected"))
    }
}
