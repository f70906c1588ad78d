/// Docker-registry pull secret model
use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;
use std::fmt;

/// Secret type kubelet reads registry credentials from
pub const DOCKER_CONFIG_JSON_TYPE: &str = "kubernetes.io/dockerconfigjson";

/// Credential object provisioned in the cluster so nodes can pull from the registry
#[derive(Clone, PartialEq, Eq)]
pub struct RegistrySecret {
    pub name: String,
    pub namespace: String,
    pub server: String,
    pub username: String,
    pub password: String,
}

impl RegistrySecret {
    /// `kubectl create secret generic` arguments. The credentials are read
    /// from stdin so the password never appears in the process list.
    pub fn create_args(&self) -> Vec<String> {
        vec![
            "create".to_string(),
            "secret".to_string(),
            "generic".to_string(),
            self.name.clone(),
            format!("--type={}", DOCKER_CONFIG_JSON_TYPE),
            "--from-file=.dockerconfigjson=/dev/stdin".to_string(),
            "--namespace".to_string(),
            self.namespace.clone(),
        ]
    }

    /// `.dockerconfigjson` payload, the same document `kubectl create secret
    /// docker-registry` would generate
    pub fn docker_config_json(&self) -> Result<String> {
        let auth = STANDARD.encode(format!("{}:{}", self.username, self.password));
        let config = json!({
            "auths": {
                self.server.as_str(): {
                    "username": self.username,
                    "password": self.password,
                    "auth": auth,
                }
            }
        });
        serde_json::to_string(&config).context("Failed to encode registry credentials")
    }

    /// Command an operator can run by hand, with the password left as a substitution
    pub fn manual_command(&self, region: &str) -> String {
        format!(
            "kubectl create secret docker-registry {} --docker-server={} --docker-username={} \
             --namespace {} --docker-password=\"$(aws ecr get-login-password --region {})\"",
            self.name, self.server, self.username, self.namespace, region
        )
    }
}

impl fmt::Debug for RegistrySecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrySecret")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("server", &self.server)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
