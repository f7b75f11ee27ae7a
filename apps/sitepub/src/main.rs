//! sitepub entry point.

mod build;
mod cli;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use sitepub_artifacts::BuildContext;
use sitepub_config::{ProcessEnv, load_options};
use sitepub_publish::{Publisher, TracingReporter};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    if !cli.build.is_empty() {
        build::run_build(&cli.build).await?;
    }

    let explicit = load_options(&cli.config)
        .with_context(|| format!("cannot load {}", cli.config.display()))?;
    if explicit.is_some() {
        info!(path = %cli.config.display(), "using options file");
    }

    let ctx = BuildContext::new(cli.base, cli.out_dir);
    let publisher = Publisher::new(TracingReporter);

    let code = match publisher.run(explicit, &ProcessEnv, ctx).await {
        None => {
            info!("publishing disabled");
            ExitCode::SUCCESS
        }
        Some(outcome) if outcome.is_success() => ExitCode::SUCCESS,
        Some(_) => ExitCode::FAILURE,
    };
    Ok(code)
}
