/// ecr-push - push a container image to ECR and provision a matching pull secret
///
/// Wraps docker, the aws CLI, kubectl and the kube-auth helper in one
/// sequential run: check tools, set up cluster access and credentials, push
/// the image, then re-create the docker-registry secret in the target namespace.
mod aws;
mod config;
mod docker;
mod error;
mod helper;
mod k8s;
mod prompt;
mod utils;
mod workflow;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::aws::AwsCli;
use crate::config::{ClusterEnvironment, PushConfig, PushTarget};
use crate::docker::DockerClient;
use crate::helper::KubeAuthHelper;
use crate::k8s::KubernetesClient;
use crate::prompt::TerminalPrompter;
use crate::workflow::{Toolchain, Workflow};

#[derive(Parser)]
#[command(name = "ecr-push", version)]
#[command(about = "Push a container image to ECR and provision a matching pull secret", long_about = None)]
struct Cli {
    /// Source image reference (e.g. myrepo/app:dev)
    image: Option<String>,

    /// Destination tag [default: latest]
    tag: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Registry account id
    #[arg(long)]
    account_id: Option<String>,

    /// Registry region
    #[arg(long)]
    region: Option<String>,

    /// Destination repository name
    #[arg(long)]
    repository: Option<String>,

    /// Namespace for the pull secret
    #[arg(long)]
    namespace: Option<String>,

    /// Name of the pull secret
    #[arg(long)]
    secret_name: Option<String>,

    /// Cluster environment to configure when no cluster is reachable
    #[arg(long, value_enum)]
    environment: Option<ClusterEnvironment>,

    /// Answer every prompt with its default
    #[arg(long)]
    non_interactive: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    // Usage errors exit 1 like every other failure; --help and --version exit 0
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    // Initialize tracing
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("ecr_push={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(e) = push(&cli).await {
        error!("✗ {:#}", e);
        std::process::exit(1);
    }
}

/// Push the image and provision the pull secret
async fn push(cli: &Cli) -> Result<()> {
    // Checked before any external tool runs
    let target = PushTarget::new(cli.image.clone(), cli.tag.clone())?;
    let config = load_config(cli)?;

    info!("Source image: {}", target.image);
    info!("Destination:  {}", config.destination_reference(&target.tag));
    info!(
        "Pull secret:  {}/{}",
        config.cluster.namespace, config.cluster.secret_name
    );

    let engine = DockerClient::new();
    let cloud = AwsCli;
    let cluster = KubernetesClient;
    let helper = KubeAuthHelper::new(&config);
    if let Some(path) = helper.path() {
        debug!("Helper tool location: {}", path.display());
    }
    let prompter = TerminalPrompter::new(cli.non_interactive, cli.environment);

    let workflow = Workflow::new(
        &config,
        Toolchain {
            engine: &engine,
            cloud: &cloud,
            cluster: &cluster,
            helper: &helper,
            prompter: &prompter,
        },
    );

    let report = workflow.run(&target).await?;
    report.log_summary();

    Ok(())
}

/// Defaults, then the configuration file, then command-line overrides
fn load_config(cli: &Cli) -> Result<PushConfig> {
    let mut config = match &cli.config {
        Some(path) => PushConfig::from_file(path).context("Failed to load configuration")?,
        None => PushConfig::default(),
    };

    if let Some(account_id) = &cli.account_id {
        config.registry.account_id = account_id.clone();
    }
    if let Some(region) = &cli.region {
        config.registry.region = region.clone();
    }
    if let Some(repository) = &cli.repository {
        config.registry.repository = repository.clone();
    }
    if let Some(namespace) = &cli.namespace {
        config.cluster.namespace = namespace.clone();
    }
    if let Some(secret_name) = &cli.secret_name {
        config.cluster.secret_name = secret_name.clone();
    }

    config.validate()?;
    Ok(config)
}
