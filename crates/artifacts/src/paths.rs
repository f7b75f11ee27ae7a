//! Remote path derivation.
//!
//! Every function here is pure. Relative paths always use `/` separators;
//! a remote location is a remote directory joined with a relative path.

use std::path::Path;

use url::Url;

use crate::error::ArtifactError;

/// Path of `file` relative to `output_root`, with `/` separators.
pub fn relative_path(output_root: &Path, file: &Path) -> Result<String, ArtifactError> {
    let rel = file
        .strip_prefix(output_root)
        .map_err(|_| ArtifactError::OutsideRoot {
            file: file.to_path_buf(),
            root: output_root.to_path_buf(),
        })?;

    Ok(rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}

/// Directory part of the site's base path, without trailing slash.
///
/// `https://cdn.example.com/app/` gives `/app`. A base that is not an
/// absolute URL (`/app/`, `./`) is taken as a path as-is.
pub fn base_dir(base_path: &str) -> String {
    let path = match Url::parse(base_path) {
        Ok(url) => url.path().to_string(),
        Err(_) => base_path.to_string(),
    };
    path.trim_end_matches('/').to_string()
}

/// Origin of the base URL (`https://cdn.example.com`), if it is one.
pub fn base_origin(base_path: &str) -> Option<String> {
    let url = Url::parse(base_path).ok()?;
    match url.origin() {
        origin @ url::Origin::Tuple(..) => Some(origin.ascii_serialization()),
        url::Origin::Opaque(_) => None,
    }
}

/// Appends a `/`-separated relative path to a remote directory.
pub fn join_remote(dir: &str, relative: &str) -> String {
    format!(
        "{}/{}",
        dir.trim_end_matches('/'),
        relative.trim_start_matches('/')
    )
}

/// Public URL a file is served from once it is in the bucket.
pub fn public_url(base_path: &str, relative: &str) -> String {
    join_remote(base_path, relative)
}
