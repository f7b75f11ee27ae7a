//! Command-line interface definitions.

use std::path::PathBuf;

use clap::Parser;
use sitepub_config::DEFAULT_CONFIG_FILE;

/// Build a site, then publish its output.
///
/// Example: `sitepub --out-dir dist --base https://cdn.example.com/app/ -- npm run build`
#[derive(Parser, Debug, Clone)]
#[command(name = "sitepub", version, about, long_about = None)]
pub struct Cli {
    /// Build output directory
    #[arg(short, long, default_value = "dist", value_hint = clap::ValueHint::DirPath)]
    pub out_dir: PathBuf,

    /// Public base of the site (URL or path)
    #[arg(short, long, default_value = "/")]
    pub base: String,

    /// Options file; when present it replaces the environment entirely
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Build command to run first; publishing only follows a successful build
    #[arg(last = true)]
    pub build: Vec<String>,
}
