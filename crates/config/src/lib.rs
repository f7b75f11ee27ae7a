//! Publish configuration for sitepub.
//!
//! A [`PublishConfig`] comes from one of two sources: explicit options
//! (usually a `publish.toml` next to the build) or a fixed set of
//! environment keys. Explicit options always win; the two are never merged.
//!
//! Resolution never fails. Validation is a separate step performed by the
//! orchestrator before any network activity.

pub mod env;
pub mod error;
pub mod file;
pub mod types;

pub use env::{EnvSource, ProcessEnv, keys, resolve};
pub use error::ConfigError;
pub use file::{DEFAULT_CONFIG_FILE, load_options};
pub use types::{
    DEFAULT_CONNECT_TIMEOUT, ObjectStorageConfig, Protocol, PublishConfig, RemoteServerConfig,
};
