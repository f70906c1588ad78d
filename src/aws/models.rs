/// Data returned by the cloud CLI
use serde::Deserialize;

/// Output of `aws sts get-caller-identity`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CallerIdentity {
    pub user_id: String,
    pub account: String,
    pub arn: String,
}

/// Error code the registry returns when a repository does not exist
pub const REPOSITORY_NOT_FOUND: &str = "RepositoryNotFoundException";
