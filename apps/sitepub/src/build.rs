//! Runs the site build before publishing.

use anyhow::{Context, Result, bail};
use tokio::process::Command;
use tracing::info;

/// Runs the build command to completion.
///
/// Returns `Ok` only for a zero exit status: that is the signal that the
/// output directory is complete and may be published.
pub async fn run_build(command: &[String]) -> Result<()> {
    let (program, args) = command.split_first().context("empty build command")?;

    info!(command = %command.join(" "), "running build");
    let status = Command::new(program)
        .args(args)
        .status()
        .await
        .with_context(|| format!("cannot start build command `{program}`"))?;

    if !status.success() {
        bail!("build failed ({status})");
    }

    info!("build finished");
    Ok(())
}
