/// Per-run state threaded through the workflow steps
use std::path::PathBuf;
use tracing::debug;

/// Where a run is; stages only move forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    DependenciesChecked,
    HelperReady,
    HelperAbsent,
    ClusterReady,
    ClusterSkipped,
    CredentialsVerified,
    RegistryAuthenticated,
    RepositoryReady,
    ImageReady,
    ImageTagged,
    ImagePushed,
    SecretProvisioned,
    SecretSkipped,
    Done,
}

impl Stage {
    /// Position in the pipeline; alternatives share a position
    fn position(self) -> u8 {
        match self {
            Stage::Init => 0,
            Stage::DependenciesChecked => 1,
            Stage::HelperReady | Stage::HelperAbsent => 2,
            Stage::ClusterReady | Stage::ClusterSkipped => 3,
            Stage::CredentialsVerified => 4,
            Stage::RegistryAuthenticated => 5,
            Stage::RepositoryReady => 6,
            Stage::ImageReady => 7,
            Stage::ImageTagged => 8,
            Stage::ImagePushed => 9,
            Stage::SecretProvisioned | Stage::SecretSkipped => 10,
            Stage::Done => 11,
        }
    }

    /// Whether `next` directly follows this stage
    pub fn precedes(self, next: Stage) -> bool {
        next.position() == self.position() + 1
    }
}

/// Which external tools are usable in this run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolAvailability {
    pub container_engine: bool,
    pub cloud_cli: bool,
    pub cluster_cli: bool,
    pub helper: bool,
}

#[derive(Debug)]
pub struct RunState {
    stage: Stage,
    pub tools: ToolAvailability,
    /// Session kubeconfig; `None` means kubectl's own default
    pub kubeconfig: Option<PathBuf>,
    pub cluster_ready: bool,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            stage: Stage::Init,
            tools: ToolAvailability::default(),
            kubeconfig: None,
            cluster_ready: false,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Move to the next stage
    pub fn advance(&mut self, next: Stage) {
        debug_assert!(
            self.stage.precedes(next),
            "invalid stage transition {:?} -> {:?}",
            self.stage,
            next
        );
        debug!("Stage {:?} -> {:?}", self.stage, next);
        self.stage = next;
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}
