/// Fatal conditions that end a run with exit code 1
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PushError {
    /// A required command-line tool is not on PATH
    #[error("{tool} is not installed or not in PATH. Please install from {install_url}")]
    MissingDependency {
        tool: &'static str,
        install_url: &'static str,
    },

    #[error("{tool} is installed but its daemon is not reachable. Is it running?")]
    DaemonUnreachable { tool: &'static str },

    #[error("cloud credentials are still invalid after configuration")]
    InvalidCredentials,

    /// Operator chose not to continue without cluster access
    #[error("aborted: cluster access is not configured")]
    ClusterAccessDeclined,

    #[error("missing required argument <IMAGE> (e.g. myrepo/app:dev)")]
    MissingImage,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
