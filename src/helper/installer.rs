/// Download of the helper authentication binary
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

/// Fetch `url` and install it as an executable at `destination`
pub async fn download_binary(url: &str, destination: &Path) -> Result<()> {
    info!("Downloading {}...", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(120))
        .build()
        .context("Failed to create HTTP client")?;

    let response = client
        .get(url)
        .send()
        .await
        .context("Failed to send download request")?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("Download failed with status {}", status);
    }

    let bytes = response
        .bytes()
        .await
        .context("Failed to read download body")?;
    debug!("Downloaded {} bytes", bytes.len());

    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    // Write beside the target, then rename, so a partial download never looks installed
    let partial = destination.with_extension("partial");
    tokio::fs::write(&partial, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", partial.display()))?;
    make_executable(&partial).await?;
    tokio::fs::rename(&partial, destination)
        .await
        .with_context(|| format!("Failed to install {}", destination.display()))?;

    Ok(())
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .with_context(|| format!("Failed to mark {} executable", path.display()))
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
