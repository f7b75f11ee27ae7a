//! Explicit publish options stored as TOML.
//!
//! ```toml
//! enabled = true
//!
//! [remote_server]
//! protocol = "sftp"
//! host = "example.com"
//! port = 22
//! user = "deploy"
//! password = "..."
//! remote_root = "/var/www/site"
//!
//! [object_storage]
//! access_key_id = "..."
//! access_key_secret = "..."
//! bucket = "assets"
//! region = "oss-cn-hangzhou"
//! ```

use std::path::Path;

use crate::error::ConfigError;
use crate::types::PublishConfig;

/// File name looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "publish.toml";

/// Loads explicit options from `path`.
///
/// Returns `Ok(None)` when the file does not exist, so callers fall back
/// to the environment.
pub fn load_options(path: &Path) -> Result<Option<PublishConfig>, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no options file");
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)?;
    let config: PublishConfig = toml::from_str(&content)?;
    tracing::debug!(path = %path.display(), "options file loaded");
    Ok(Some(config))
}
