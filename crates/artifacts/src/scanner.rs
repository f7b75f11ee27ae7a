//! Build output scanning.
//!
//! Recursively walks the output directory and produces the sorted list of
//! files to publish, plus the HTML-only subset.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ArtifactError;
use crate::paths::relative_path;

/// Files produced by one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifactSet {
    /// Absolute output directory every relative path hangs off.
    pub output_root: PathBuf,
    /// Every regular file, sorted, `/`-separated.
    pub all_files: Vec<String>,
    /// Files ending in `.html`, in the same order as `all_files`.
    pub html_files: Vec<String>,
}

impl BuildArtifactSet {
    /// Local path of a relative entry.
    pub fn local_path(&self, relative: &str) -> PathBuf {
        self.output_root.join(relative)
    }

    pub fn is_empty(&self) -> bool {
        self.all_files.is_empty()
    }
}

/// Scans `output_root` and returns its files.
///
/// Dot-files are included. Symlinks to files are listed; symlinked
/// directories are skipped so a link cycle cannot stall the scan.
pub fn enumerate(output_root: &Path) -> Result<BuildArtifactSet, ArtifactError> {
    let metadata = match std::fs::metadata(output_root) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ArtifactError::NotFound(output_root.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    if !metadata.is_dir() {
        return Err(ArtifactError::NotADirectory(output_root.to_path_buf()));
    }

    let mut all_files = Vec::new();
    walk_dir(output_root, output_root, &mut all_files)?;
    all_files.sort();

    let html_files = all_files
        .iter()
        .filter(|f| f.ends_with(".html"))
        .cloned()
        .collect();

    debug!(
        root = %output_root.display(),
        files = all_files.len(),
        "scan complete"
    );

    Ok(BuildArtifactSet {
        output_root: output_root.to_path_buf(),
        all_files,
        html_files,
    })
}

fn walk_dir(root: &Path, current: &Path, files: &mut Vec<String>) -> Result<(), ArtifactError> {
    let entries = std::fs::read_dir(current)?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            walk_dir(root, &path, files)?;
        } else if file_type.is_file() {
            files.push(relative_path(root, &path)?);
        } else if file_type.is_symlink() {
            // Follow links to files only; a dangling link is skipped too.
            match std::fs::metadata(&path) {
                Ok(target) if target.is_file() => files.push(relative_path(root, &path)?),
                _ => debug!(path = %path.display(), "skipping symlink"),
            }
        }
    }

    Ok(())
}
